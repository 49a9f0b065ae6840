//! MathJax-compatible math rendering.
//!
//! Unlike the Typst renderer which produces SVG at build time, this wraps
//! the TeX in delimiters that MathJax processes client-side.

use super::MathRenderer;
use crate::html::escape;
use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct MathJaxRenderer;

impl MathRenderer for MathJaxRenderer {
    fn render(&self, tex: &str, display: bool) -> Result<String> {
        check_braces(tex)?;
        if display {
            Ok(wrap_display_math(tex))
        } else {
            Ok(wrap_inline_math(tex))
        }
    }
}

/// MathJax gives up on a formula with unbalanced groups, so reject it here
/// and let the caller fall back to the source text.
fn check_braces(tex: &str) -> Result<()> {
    let mut depth: i64 = 0;
    let mut chars = tex.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    bail!("unexpected '}}' in math: {tex}");
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        bail!("unclosed '{{' in math: {tex}");
    }
    Ok(())
}

fn wrap_inline_math(math: &str) -> String {
    let escaped = escape(math);
    format!(
        r#"<span class="math math-inline" aria-label="{}">\({}\)</span>"#,
        escaped, escaped
    )
}

fn wrap_display_math(math: &str) -> String {
    let escaped = escape(math);
    format!(
        r#"<div class="math math-display" aria-label="{}">\[{}\]</div>"#,
        escaped, escaped
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_math_wrapping() {
        let html = MathJaxRenderer.render("x^2 + y^2", false).unwrap();
        assert!(html.contains(r"\(x^2 + y^2\)"));
        assert!(html.contains("math-inline"));
    }

    #[test]
    fn test_display_math_wrapping() {
        let html = MathJaxRenderer.render(r"\sum_{i=0}^n i", true).unwrap();
        assert!(html.contains(r"\[\sum_{i=0}^n i\]"));
        assert!(html.contains("math-display"));
    }

    #[test]
    fn test_escapes_special_chars() {
        let html = wrap_inline_math("x < y & z > w");
        assert!(html.contains("x &lt; y &amp; z &gt; w"));
        assert!(!html.contains("x < y"));
    }

    #[test]
    fn test_unbalanced_braces_are_errors() {
        assert!(MathJaxRenderer.render(r"\frac{a}{b", false).is_err());
        assert!(MathJaxRenderer.render("a}", false).is_err());
        assert!(MathJaxRenderer.render(r"\{ a \}", false).is_ok());
    }
}
