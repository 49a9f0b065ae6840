//! Citation numbering, reference lists and the tooltip filter.

use crate::bibliography::{BibEntry, Bibliography};
use crate::html::{escape, unescape};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::warn;

/// Tooltip used when a cited key has no bibliography entry.
pub const MISSING_CITATION: &str = "Citation not found";

/// Assigns reference numbers per page in first-use order.
#[derive(Debug, Clone, Default)]
pub struct CitationTracker {
    order: Vec<String>,
    index: HashMap<String, usize>,
}

impl CitationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number for `key`, registering it on first use.
    pub fn register(&mut self, key: &str) -> usize {
        if let Some(num) = self.index.get(key) {
            *num
        } else {
            let num = self.order.len() + 1;
            self.order.push(key.to_string());
            self.index.insert(key.to_string(), num);
            num
        }
    }

    /// Cited keys in first-use order.
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolve the cited keys against a bibliography.
    pub fn references(&self, bibliography: &Bibliography) -> Vec<CitationRef> {
        self.order
            .iter()
            .enumerate()
            .map(|(idx, key)| {
                let entry = bibliography.get(key).cloned();
                if entry.is_none() {
                    warn!("Missing bibliography entry for key '{}'", key);
                }
                CitationRef {
                    key: key.clone(),
                    number: idx + 1,
                    entry,
                }
            })
            .collect()
    }
}

/// A single reference entry in the rendered bibliography.
#[derive(Debug, Clone)]
pub struct CitationRef {
    pub key: String,
    pub number: usize,
    pub entry: Option<BibEntry>,
}

/// The inline link emitted for `{% cite "key" %}`.
pub fn render_citation(key: &str, number: usize) -> String {
    let key = escape(key);
    format!(
        r##"<a class="citation" href="#ref-{key}" data-cite="{key}">[{number}]</a>"##
    )
}

/// Render the cited references as an ordered list.
pub fn render_references(references: &[CitationRef]) -> String {
    let mut html = String::from(r#"<ol class="references">"#);
    for cite in references {
        html.push_str(&format!(r#"<li id="ref-{}">"#, escape(&cite.key)));
        let body = cite
            .entry
            .as_ref()
            .map(format_entry)
            .unwrap_or_else(|| format!("Missing entry: {}", escape(&cite.key)));
        html.push_str(&body);
        html.push_str("</li>");
    }
    html.push_str("</ol>");
    html
}

fn format_entry(entry: &BibEntry) -> String {
    let mut parts: Vec<String> = Vec::new();

    let authors = entry.authors();
    if !authors.is_empty() {
        parts.push(escape(&join_authors(&authors)));
    }

    parts.push(format!(
        "({})",
        escape(&entry.year().unwrap_or_else(|| "n.d.".to_string()))
    ));

    if let Some(title) = entry.title() {
        parts.push(format!(r#"<span class="ref-title">{}</span>"#, escape(&title)));
    }

    let venue = ["journal", "booktitle", "publisher"]
        .iter()
        .find_map(|field| entry.field(field))
        .map(crate::bibliography::clean_value)
        .filter(|v| !v.is_empty());
    if let Some(venue) = venue {
        parts.push(format!("<em>{}</em>", escape(&venue)));
    }

    if let Some(url) = entry.field("url").map(crate::bibliography::clean_value) {
        let escaped = escape(&url);
        parts.push(format!(r#"<a href="{0}">{0}</a>"#, escaped));
    } else if let Some(doi) = entry.field("doi").map(crate::bibliography::clean_value) {
        let escaped = escape(&doi);
        parts.push(format!(
            r#"doi: <a href="https://doi.org/{0}">{0}</a>"#,
            escaped
        ));
    }

    parts.join(". ")
}

fn join_authors(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{} & {}", first, second),
        [rest @ .., last] => format!("{}, & {}", rest.join(", "), last),
    }
}

/// Short citation text: `Family et al. (Year). Title.`
///
/// ```
/// use quire_core::bibliography::BibEntry;
/// use quire_core::citations::format_tooltip;
///
/// let entry = BibEntry::new("olah2017", "article")
///     .with_field("author", "Olah, Chris and Mordvintsev, Alexander")
///     .with_field("title", "Feature Visualization")
///     .with_field("year", "2017");
/// assert_eq!(
///     format_tooltip(Some(&entry)),
///     "Olah et al. (2017). Feature Visualization."
/// );
/// ```
pub fn format_tooltip(entry: Option<&BibEntry>) -> String {
    let Some(entry) = entry else {
        return MISSING_CITATION.to_string();
    };

    let author = entry
        .author_display()
        .unwrap_or_else(|| "Anon.".to_string());
    let year = entry.year().unwrap_or_else(|| "n.d.".to_string());
    let mut tooltip = format!("{} ({}).", author, year);
    if let Some(title) = entry.title() {
        tooltip.push(' ');
        tooltip.push_str(&title);
        if !title.ends_with(['.', '?', '!']) {
            tooltip.push('.');
        }
    }
    tooltip
}

static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<a\s[^>]*>").expect("valid anchor regex"));

static CITE_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\sdata-cite\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid data-cite regex")
});

static REPLACED_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s(?:class|data-tooltip)\s*=\s*(?:"[^"]*"|'[^']*')"#)
        .expect("valid attribute regex")
});

/// Annotate every citation link (`<a>` with `data-cite`) with tooltip text.
///
/// The link's class becomes `reference tooltip` and a `data-tooltip`
/// attribute is set from the bibliography entry for its key.
pub fn annotate_citations(html: &str, bibliography: &Bibliography) -> String {
    ANCHOR_RE
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            let Some(attr) = CITE_ATTR_RE.captures(tag) else {
                return tag.to_string();
            };
            let key = unescape(
                attr.get(1)
                    .or_else(|| attr.get(2))
                    .map_or("", |m| m.as_str()),
            );
            let tooltip = format_tooltip(bibliography.get(&key));

            let stripped = REPLACED_ATTR_RE.replace_all(tag, "");
            let (head, close) = match stripped.strip_suffix("/>") {
                Some(head) => (head, "/>"),
                None => (stripped.strip_suffix('>').unwrap_or(&stripped), ">"),
            };
            format!(
                r#"{} class="reference tooltip" data-tooltip="{}"{}"#,
                head.trim_end(),
                escape(&tooltip),
                close
            )
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bibliography() -> Bibliography {
        Bibliography::from_entries([
            BibEntry::new("solo", "article")
                .with_field("author", "Knuth, Donald")
                .with_field("title", "Literate Programming")
                .with_field("year", "1984")
                .with_field("journal", "The Computer Journal"),
            BibEntry::new("pair", "inproceedings")
                .with_field("author", "Ashish Vaswani and Noam Shazeer")
                .with_field("title", "{Attention} Is All You Need")
                .with_field("year", "2017"),
        ])
    }

    #[test]
    fn tracker_numbers_in_first_use_order() {
        let mut tracker = CitationTracker::new();
        assert_eq!(tracker.register("b"), 1);
        assert_eq!(tracker.register("a"), 2);
        assert_eq!(tracker.register("b"), 1);
        assert_eq!(tracker.keys(), ["b", "a"]);
    }

    #[test]
    fn single_author_tooltip_omits_et_al() {
        let bib = bibliography();
        assert_eq!(
            format_tooltip(bib.get("solo")),
            "Knuth (1984). Literate Programming."
        );
    }

    #[test]
    fn multiple_author_tooltip_includes_et_al() {
        let bib = bibliography();
        assert_eq!(
            format_tooltip(bib.get("pair")),
            "Vaswani et al. (2017). Attention Is All You Need."
        );
    }

    #[test]
    fn tooltip_fallbacks() {
        let bare = BibEntry::new("bare", "misc");
        assert_eq!(format_tooltip(Some(&bare)), "Anon. (n.d.).");
        let question = BibEntry::new("q", "misc")
            .with_field("author", "Doe, Jane")
            .with_field("title", "Why?");
        assert_eq!(format_tooltip(Some(&question)), "Doe (n.d.). Why?");
        assert_eq!(format_tooltip(None), MISSING_CITATION);
    }

    #[test]
    fn annotates_citation_links() {
        let bib = bibliography();
        let html = format!("<p>As shown {}.</p>", render_citation("pair", 1));
        let out = annotate_citations(&html, &bib);
        assert_eq!(
            out,
            r##"<p>As shown <a href="#ref-pair" data-cite="pair" class="reference tooltip" data-tooltip="Vaswani et al. (2017). Attention Is All You Need.">[1]</a>.</p>"##
        );
    }

    #[test]
    fn missing_keys_get_placeholder() {
        let out = annotate_citations(
            r##"<a href="#ref-nope" data-cite='nope'>[1]</a>"##,
            &Bibliography::default(),
        );
        assert!(out.contains(r#"data-tooltip="Citation not found""#));
    }

    #[test]
    fn leaves_other_links_alone() {
        let html = r#"<a href="https://distill.pub" class="external">Distill</a>"#;
        assert_eq!(annotate_citations(html, &bibliography()), html);
    }

    #[test]
    fn tooltip_text_is_attribute_escaped() {
        let bib = Bibliography::from_entries([BibEntry::new("q", "misc")
            .with_field("author", "Smith")
            .with_field("title", r#"The "Quoted" \& Escaped"#)]);
        let out = annotate_citations(r#"<a data-cite="q">[1]</a>"#, &bib);
        assert!(out.contains(
            r#"data-tooltip="Smith (n.d.). The &quot;Quoted&quot; &amp; Escaped.""#
        ));
    }

    #[test]
    fn renders_reference_list() {
        let bib = bibliography();
        let mut tracker = CitationTracker::new();
        tracker.register("solo");
        tracker.register("missing");
        let html = render_references(&tracker.references(&bib));
        assert!(html.starts_with(r#"<ol class="references">"#));
        assert!(html.contains(r#"<li id="ref-solo">Knuth, Donald. (1984). <span class="ref-title">Literate Programming</span>. <em>The Computer Journal</em></li>"#));
        assert!(html.contains("Missing entry: missing"));
    }
}
