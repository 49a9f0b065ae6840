//! Content model: pages, footnotes, diagnostics and the built site index.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Frontmatter metadata from page sources
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub slug: Option<String>,

    /// Layout name; `page` and `article` are built in.
    #[serde(default)]
    pub layout: Option<String>,

    /// Extra bibliography files for this page (relative to the config file)
    #[serde(default)]
    pub bibliography: Vec<String>,
}

/// A footnote recorded by the `footnote` shortcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    /// Sequential id within one build, starting at 1
    pub id: u32,
    /// Rich text content as written in the source
    pub content: String,
    /// Plain-text rendering of `content` for `title` tooltips
    pub tooltip: String,
}

/// Whether a page came from Markdown or was authored as HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Markdown,
    Html,
}

/// A rendered page of the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub draft: bool,
    pub kind: SourceKind,

    /// Layout requested in frontmatter, if any
    pub layout: Option<String>,

    /// Source path relative to the input directory, `/`-separated
    pub source_path: String,

    /// Output path relative to the output directory, `/`-separated
    pub output_path: String,

    /// Body HTML (shortcodes expanded, citation tooltips applied)
    pub content_html: String,

    /// Footnotes defined on this page, in id order
    pub footnotes: Vec<Footnote>,

    /// Citation keys in first-use order
    pub citations: Vec<String>,

    /// Member of the `articles` collection
    pub is_article: bool,
}

impl Page {
    /// URL of the page under the given base URL ("/" or "/blog/").
    pub fn url_with_base(&self, base_url: &str) -> String {
        format!("{}{}", base_url, self.output_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
    Error,
}

/// A non-fatal problem found while building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
            page: None,
            source_path: None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            ..Self::warning(code, message)
        }
    }

    pub fn with_page(mut self, page: Option<&str>) -> Self {
        self.page = page.map(str::to_string);
        self
    }

    pub fn with_source(mut self, source_path: impl Into<String>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }
}

/// Everything one build produced, before anything is written to disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteIndex {
    pub pages: Vec<Page>,
    pub diagnostics: Vec<Diagnostic>,
    /// All footnotes of the build, in id order
    pub footnotes: Vec<Footnote>,
}

impl SiteIndex {
    pub fn find_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    /// Published pages of the `articles` collection, newest first.
    pub fn articles(&self) -> Vec<&Page> {
        let mut articles: Vec<&Page> = self
            .pages
            .iter()
            .filter(|p| p.is_article && !p.draft)
            .collect();
        // Undated articles sort last; ties keep source order
        articles.sort_by(|a, b| b.date.cmp(&a.date));
        articles
    }

    pub fn has_page_at(&self, output_path: &str) -> bool {
        self.pages.iter().any(|p| p.output_path == output_path)
    }

    /// The `articles` collection as serialized to `articles.json`.
    pub fn article_summaries(&self, base_url: &str) -> Vec<ArticleSummary> {
        self.articles()
            .into_iter()
            .map(|page| ArticleSummary {
                title: page.title.clone(),
                url: page.url_with_base(base_url),
                date: page.date,
                description: page.description.clone(),
                tags: page.tags.clone(),
            })
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }
}

/// One entry of `articles.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(slug: &str, date: Option<&str>, is_article: bool) -> Page {
        Page {
            slug: slug.to_string(),
            title: slug.to_string(),
            description: None,
            date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            tags: vec![],
            draft: false,
            kind: SourceKind::Markdown,
            layout: None,
            source_path: format!("{slug}.md"),
            output_path: format!("{slug}.html"),
            content_html: String::new(),
            footnotes: vec![],
            citations: vec![],
            is_article,
        }
    }

    #[test]
    fn articles_sorted_newest_first() {
        let index = SiteIndex {
            pages: vec![
                page("old", Some("2020-01-01"), true),
                page("about", None, false),
                page("undated", None, true),
                page("new", Some("2024-06-30"), true),
            ],
            ..SiteIndex::default()
        };
        let slugs: Vec<_> = index.articles().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "old", "undated"]);
    }

    #[test]
    fn drafts_are_not_articles() {
        let mut draft = page("wip", Some("2024-01-01"), true);
        draft.draft = true;
        let index = SiteIndex {
            pages: vec![draft],
            ..SiteIndex::default()
        };
        assert!(index.articles().is_empty());
    }

    #[test]
    fn summaries_use_base_url() {
        let index = SiteIndex {
            pages: vec![page("new", Some("2024-06-30"), true), page("about", None, false)],
            ..SiteIndex::default()
        };
        let summaries = index.article_summaries("/blog/");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].url, "/blog/new.html");
        let json = serde_json::to_value(&summaries).unwrap();
        assert_eq!(json[0]["date"], "2024-06-30");
        assert!(json[0].get("description").is_none());
    }

    #[test]
    fn url_uses_base() {
        assert_eq!(page("a", None, false).url_with_base("/blog/"), "/blog/a.html");
    }
}
