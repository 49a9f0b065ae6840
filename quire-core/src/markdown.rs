//! Markdown to HTML conversion.

use crate::slug::slugify;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

/// Markdown processor used for page bodies and footnote text.
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        // Math and footnotes come from shortcodes, so their Markdown
        // extensions stay off

        Self { options }
    }

    /// Convert a page body. Headings get slug ids unless they set one.
    pub fn convert(&self, markdown: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();
        let events = attach_heading_ids(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Convert a short fragment, dropping the wrapping paragraph if the
    /// text is a single paragraph.
    pub fn render_inline(&self, markdown: &str) -> String {
        let html = self.convert(markdown);
        let trimmed = html.trim_end();
        match trimmed
            .strip_prefix("<p>")
            .and_then(|rest| rest.strip_suffix("</p>"))
        {
            Some(inner) if !inner.contains("<p>") => inner.to_string(),
            _ => trimmed.to_string(),
        }
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn attach_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let ids = heading_ids(&events);
    let mut ids = ids.into_iter();

    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let generated = ids.next().flatten();
                Event::Start(Tag::Heading {
                    level,
                    id: id.or_else(|| generated.map(CowStr::from)),
                    classes,
                    attrs,
                })
            }
            other => other,
        })
        .collect()
}

/// One entry per heading: a unique slug of its text, or `None` when the
/// text has no sluggable characters. Repeated slugs get `-2`, `-3`, ...
fn heading_ids(events: &[Event]) -> Vec<Option<String>> {
    let mut ids = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => current = Some(String::new()),
            Event::Text(text) | Event::Code(text) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some(title) = current.take() else {
                    continue;
                };
                let slug = slugify(&title);
                if slug.is_empty() {
                    ids.push(None);
                    continue;
                }
                let count = seen.entry(slug.clone()).or_insert(0);
                *count += 1;
                ids.push(Some(if *count == 1 {
                    slug
                } else {
                    format!("{}-{}", slug, count)
                }));
            }
            _ => {}
        }
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert("# Hello World\n\nThis is a **test**.");
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains("<strong>test</strong>"));
    }

    #[test]
    fn test_tables() {
        let processor = MarkdownProcessor::new();
        let md = r#"
| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |
"#;
        let html = processor.convert(md);
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Header 1</th>"));
    }

    #[test]
    fn test_duplicate_and_explicit_heading_ids() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert("## Setup\n\n## Setup\n\n## Custom {#mine}\n");
        assert!(html.contains(r#"<h2 id="setup">"#));
        assert!(html.contains(r#"<h2 id="setup-2">"#));
        assert!(html.contains(r#"<h2 id="mine">"#));
    }

    #[test]
    fn test_render_inline_unwraps_single_paragraph() {
        let processor = MarkdownProcessor::new();
        assert_eq!(
            processor.render_inline("A *short* note"),
            "A <em>short</em> note"
        );
        let multi = processor.render_inline("one\n\ntwo");
        assert!(multi.starts_with("<p>one</p>"));
    }
}
