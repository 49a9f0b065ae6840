//! `math` and `mathblock` shortcodes.

use super::{Rendered, RenderContext, Shortcode, ShortcodeCall, ShortcodeError};
use crate::models::Diagnostic;
use tracing::error;

/// `{% math "tex" %}`: inline math.
pub struct MathShortcode;

impl Shortcode for MathShortcode {
    fn name(&self) -> &'static str {
        "math"
    }

    fn render(
        &self,
        call: &ShortcodeCall,
        ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        let tex = call.required_arg(0, "TeX")?;
        match ctx.math.render(tex, false) {
            Ok(html) => Ok(Rendered::Html(html)),
            Err(err) => {
                math_failed(ctx, tex, &err);
                Ok(Rendered::Html(tex.to_string()))
            }
        }
    }
}

/// `{% mathblock %}tex{% endmathblock %}`: display math in a `math-block` div.
pub struct MathBlockShortcode;

impl Shortcode for MathBlockShortcode {
    fn name(&self) -> &'static str {
        "mathblock"
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
        ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        let tex = call.body().trim();
        let inner = match ctx.math.render(tex, true) {
            Ok(html) => html,
            Err(err) => {
                math_failed(ctx, tex, &err);
                tex.to_string()
            }
        };
        Ok(Rendered::Html(format!(
            r#"<div class="math-block">{}</div>"#,
            inner
        )))
    }
}

fn math_failed(ctx: &mut RenderContext<'_>, tex: &str, err: &anyhow::Error) {
    error!(page = ?ctx.build.page_slug(), "Math render error: {:#}", err);
    ctx.build.push_diagnostic(Diagnostic::warning(
        "math.render_failed",
        format!("Could not render `{}`: {:#}", tex, err),
    ));
}
