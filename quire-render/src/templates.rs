//! Askama layout definitions.

use askama::Template;
use chrono::{Datelike, NaiveDate};
use quire_core::{ArticleSummary, Config, MathBackend, Page, SiteIndex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to render {template} template: {source}")]
    Template {
        template: &'static str,
        #[source]
        source: askama::Error,
    },
}

/// Site-wide values every layout shows
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    pub author: String,
    /// Normalized base URL, used as the asset and link prefix
    pub base_url: String,
    pub year: i32,
    /// Load MathJax so delimited TeX is typeset in the browser
    pub mathjax: bool,
}

impl SiteMeta {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.site.title.clone(),
            description: config.site.description.clone(),
            author: config.site.author.clone(),
            base_url: config.normalized_base_url(),
            year: chrono::Utc::now().year(),
            mathjax: config.math.backend == MathBackend::MathJax,
        }
    }
}

/// Which layout wraps a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Page,
    Article,
}

impl Layout {
    /// The frontmatter layout when it names one, otherwise `article` for
    /// the articles collection and `page` for everything else.
    pub fn for_page(page: &Page) -> Self {
        match page.layout.as_deref() {
            Some("article") => Layout::Article,
            Some(_) => Layout::Page,
            None if page.is_article => Layout::Article,
            None => Layout::Page,
        }
    }
}

/// An entry of the articles list on the index page
#[derive(Debug, Clone)]
pub struct ArticleEntry {
    pub url: String,
    pub title: String,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl From<ArticleSummary> for ArticleEntry {
    fn from(summary: ArticleSummary) -> Self {
        Self {
            url: summary.url,
            title: summary.title,
            date: summary.date.map(|d| display_date(&d)),
            description: summary.description,
        }
    }
}

/// Plain page layout
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub title: String,
    pub description: String,
    pub content: String,
    pub site: SiteMeta,
}

/// Distill-style article layout with a title block and byline
#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleTemplate {
    pub title: String,
    pub description: String,
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub content: String,
    pub site: SiteMeta,
}

/// Site index with the articles collection
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub description: String,
    /// Content of the site's own `index` page, shown above the list
    pub intro: Option<String>,
    pub articles: Vec<ArticleEntry>,
    pub site: SiteMeta,
}

/// Wrap a built page in its layout.
pub fn render_page(page: &Page, site: &SiteMeta) -> Result<String, RenderError> {
    let description = page
        .description
        .clone()
        .unwrap_or_else(|| site.description.clone());

    match Layout::for_page(page) {
        Layout::Page => PageTemplate {
            title: page.title.clone(),
            description,
            content: page.content_html.clone(),
            site: site.clone(),
        }
        .render()
        .map_err(|source| RenderError::Template {
            template: "page",
            source,
        }),
        Layout::Article => ArticleTemplate {
            title: page.title.clone(),
            description,
            date: page.date.as_ref().map(display_date),
            tags: page.tags.clone(),
            content: page.content_html.clone(),
            site: site.clone(),
        }
        .render()
        .map_err(|source| RenderError::Template {
            template: "article",
            source,
        }),
    }
}

/// Render `index.html`: the `index` page's content (if the site has one)
/// followed by the articles collection, newest first.
pub fn render_index(index: &SiteIndex, site: &SiteMeta) -> Result<String, RenderError> {
    let intro = index
        .pages
        .iter()
        .find(|p| p.output_path == "index.html" && !p.draft)
        .map(|p| p.content_html.clone());

    IndexTemplate {
        title: site.title.clone(),
        description: site.description.clone(),
        intro,
        articles: index
            .article_summaries(&site.base_url)
            .into_iter()
            .map(ArticleEntry::from)
            .collect(),
        site: site.clone(),
    }
    .render()
    .map_err(|source| RenderError::Template {
        template: "index",
        source,
    })
}

fn display_date(date: &NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::SourceKind;

    fn site(mathjax: bool) -> SiteMeta {
        SiteMeta {
            title: "Distill Notes".to_string(),
            description: "Notes on <ML>".to_string(),
            author: "A. Author".to_string(),
            base_url: "/blog/".to_string(),
            year: 2024,
            mathjax,
        }
    }

    fn page(slug: &str, is_article: bool) -> Page {
        Page {
            slug: slug.to_string(),
            title: format!("{} & more", slug),
            description: None,
            date: NaiveDate::from_ymd_opt(2017, 4, 4),
            tags: vec!["optimization".to_string()],
            draft: false,
            kind: SourceKind::Markdown,
            layout: None,
            source_path: format!("{}.md", slug),
            output_path: format!("{}.html", slug),
            content_html: "<p>Body <em>text</em></p>".to_string(),
            footnotes: vec![],
            citations: vec![],
            is_article,
        }
    }

    #[test]
    fn layout_selection() {
        let mut p = page("about", false);
        assert_eq!(Layout::for_page(&p), Layout::Page);
        p.layout = Some("article".to_string());
        assert_eq!(Layout::for_page(&p), Layout::Article);

        let mut a = page("articles/momentum", true);
        assert_eq!(Layout::for_page(&a), Layout::Article);
        a.layout = Some("page".to_string());
        assert_eq!(Layout::for_page(&a), Layout::Page);
        a.layout = Some("fancy".to_string());
        assert_eq!(Layout::for_page(&a), Layout::Page);
    }

    #[test]
    fn page_layout_keeps_content_raw_and_escapes_title() {
        let html = render_page(&page("about", false), &site(false)).unwrap();
        assert!(html.contains("<p>Body <em>text</em></p>"));
        assert!(html.contains("about &amp; more"));
        assert!(html.contains(r#"href="/blog/quire.css""#));
        assert!(html.contains(r#"<script defer src="/blog/slider.js"></script>"#));
        assert!(!html.contains("MathJax"));
    }

    #[test]
    fn article_layout_shows_date_and_tags() {
        let html = render_page(&page("articles/momentum", true), &site(true)).unwrap();
        assert!(html.contains("April 4, 2017"));
        assert!(html.contains("optimization"));
        assert!(html.contains(r#"<article class="d-article">"#));
        assert!(html.contains("mathjax"));
    }

    #[test]
    fn index_lists_articles_and_intro() {
        let mut home = page("index", false);
        home.content_html = "<h1>Welcome</h1>".to_string();
        let index = SiteIndex {
            pages: vec![home, page("articles/momentum", true)],
            ..SiteIndex::default()
        };
        let html = render_index(&index, &site(false)).unwrap();
        assert!(html.contains("<h1>Welcome</h1>"));
        assert!(html.contains(r#"href="/blog/articles/momentum.html""#));
        assert!(html.contains("articles/momentum &amp; more"));
        assert!(html.contains("Notes on &lt;ML&gt;"));
    }
}
