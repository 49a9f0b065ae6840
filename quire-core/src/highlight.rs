//! Code syntax highlighting using syntect.

use crate::html::escape;
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use tracing::debug;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Theme> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        let theme_set = ThemeSet::load_defaults();
        theme_set
            .themes
            .get("InspiredGitHub")
            .or_else(|| theme_set.themes.get("base16-ocean.light"))
            .cloned()
            .unwrap_or_default()
    })
}

/// Highlight `code` as `lang`, returning a `<pre class="language-{lang}">` block.
///
/// Unknown languages are rendered as plain text.
pub fn highlight_code(code: &str, lang: &str) -> String {
    let ss = syntax_set();
    let syntax = ss
        .find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    let class = format!("language-{}", escape(lang));
    match highlighted_html_for_string(code, ss, syntax, theme()) {
        Ok(html) => match html.strip_prefix("<pre ") {
            Some(rest) => format!(r#"<pre class="{}" {}"#, class, rest),
            None => html,
        },
        Err(err) => {
            debug!("highlighting {} failed: {}", lang, err);
            format!(
                r#"<pre class="{}"><code>{}</code></pre>"#,
                class,
                escape(code)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_known_language() {
        let html = highlight_code("function f() { return 1; }\n", "javascript");
        assert!(html.starts_with(r#"<pre class="language-javascript" style="#));
        assert!(html.contains("<span"));
        assert!(html.contains("function"));
    }

    #[test]
    fn unknown_language_is_plain_text() {
        let html = highlight_code("a < b\n", "no-such-lang");
        assert!(html.starts_with(r#"<pre class="language-no-such-lang""#));
        assert!(html.contains("a &lt; b"));
    }
}
