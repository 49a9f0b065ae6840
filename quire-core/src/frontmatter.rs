//! YAML frontmatter splitting for page sources.

use crate::models::Frontmatter;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n(.*))?$")
            .expect("valid frontmatter regex")
    })
}

/// Split a page source into its frontmatter and body.
///
/// Sources without a leading `---` block get default frontmatter and the
/// whole text as body. An empty `title` is left for the caller to fill in.
///
/// ```
/// use quire_core::frontmatter::parse_frontmatter;
///
/// let source = "---\ntitle: Attention\ndate: 2017-06-12\n---\n# Hello\n";
/// let (fm, body) = parse_frontmatter(source).unwrap();
/// assert_eq!(fm.title, "Attention");
/// assert_eq!(body, "# Hello\n");
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok((frontmatter, body.to_string()))
}
