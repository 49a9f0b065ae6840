//! `code` and `codeblock` shortcodes.

use super::{Rendered, RenderContext, Shortcode, ShortcodeCall, ShortcodeError};
use crate::highlight::highlight_code;
use crate::html::escape;

const DEFAULT_BLOCK_LANGUAGE: &str = "javascript";

/// `{% code "lang" "source" %}`: inline code, escaped.
pub struct CodeShortcode;

impl Shortcode for CodeShortcode {
    fn name(&self) -> &'static str {
        "code"
    }

    fn render(
        &self,
        call: &ShortcodeCall,
        _ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        let lang = call.required_arg(0, "language")?;
        let source = call.required_arg(1, "source")?;
        Ok(Rendered::Html(format!(
            r#"<code class="language-{}">{}</code>"#,
            escape(lang),
            escape(source)
        )))
    }
}

/// `{% codeblock "lang" %}source{% endcodeblock %}`: highlighted block.
pub struct CodeBlockShortcode;

impl Shortcode for CodeBlockShortcode {
    fn name(&self) -> &'static str {
        "codeblock"
    }

    fn block(&self) -> bool {
        true
    }

    fn paired(&self) -> bool {
        true
    }

    fn expands_body(&self) -> bool {
        false
    }

    fn render(
        &self,
        call: &ShortcodeCall,
        _ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        let lang = call.arg(0).unwrap_or(DEFAULT_BLOCK_LANGUAGE);
        let mut source = call.body().trim().to_string();
        source.push('\n');
        Ok(Rendered::Html(highlight_code(&source, lang)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::Bibliography;
    use crate::context::BuildContext;
    use crate::math::MathJaxRenderer;

    fn render(shortcode: &dyn Shortcode, call: &ShortcodeCall) -> Result<Rendered, ShortcodeError> {
        let mut build = BuildContext::new();
        let bibliography = Bibliography::default();
        let mut ctx = RenderContext {
            build: &mut build,
            bibliography: &bibliography,
            math: &MathJaxRenderer,
        };
        shortcode.render(call, &mut ctx)
    }

    #[test]
    fn inline_code_is_escaped() {
        let mut call = ShortcodeCall::new("code");
        call.args = vec!["html".into(), "<b>&</b>".into()];
        assert_eq!(
            render(&CodeShortcode, &call).unwrap(),
            Rendered::Html(
                r#"<code class="language-html">&lt;b&gt;&amp;&lt;/b&gt;</code>"#.to_string()
            )
        );
    }

    #[test]
    fn inline_code_needs_source() {
        let mut call = ShortcodeCall::new("code");
        call.args = vec!["rust".into()];
        assert!(render(&CodeShortcode, &call).is_err());
    }

    #[test]
    fn codeblock_defaults_to_javascript() {
        let mut call = ShortcodeCall::new("codeblock");
        call.body = Some("\nconst x = 1;\n".to_string());
        let Rendered::Html(html) = render(&CodeBlockShortcode, &call).unwrap() else {
            panic!("expected html");
        };
        assert!(html.starts_with(r#"<pre class="language-javascript""#));
        assert!(html.contains("const"));
    }

    #[test]
    fn codeblock_uses_given_language() {
        let mut call = ShortcodeCall::new("codeblock");
        call.args = vec!["python".into()];
        call.body = Some("def f(): pass".to_string());
        let Rendered::Html(html) = render(&CodeBlockShortcode, &call).unwrap() else {
            panic!("expected html");
        };
        assert!(html.starts_with(r#"<pre class="language-python""#));
    }
}
