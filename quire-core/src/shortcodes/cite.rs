//! `cite` and `bibliography` shortcodes.

use super::{Rendered, RenderContext, Shortcode, ShortcodeCall, ShortcodeError};
use crate::citations::render_citation;
use tracing::warn;

/// `{% cite "key" %}`: numbered link to the page's reference list.
pub struct CiteShortcode;

impl Shortcode for CiteShortcode {
    fn name(&self) -> &'static str {
        "cite"
    }

    fn render(
        &self,
        call: &ShortcodeCall,
        ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        let key = call.required_arg(0, "citation key")?.trim();
        if ctx.bibliography.get(key).is_none() {
            warn!(page = ?ctx.build.page_slug(), "Unknown citation key '{}'", key);
        }
        let number = ctx.build.cite(key);
        Ok(Rendered::Html(render_citation(key, number)))
    }
}

/// `{% bibliography %}`: the page's cited references.
pub struct BibliographyShortcode;

impl Shortcode for BibliographyShortcode {
    fn name(&self) -> &'static str {
        "bibliography"
    }

    fn render(
        &self,
        _call: &ShortcodeCall,
        _ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError> {
        Ok(Rendered::References)
    }
}
