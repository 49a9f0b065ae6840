//! Math rendering backends for the `math` and `mathblock` shortcodes.

pub mod mathjax;
pub mod typst_math;

use crate::config::{MathBackend, MathConfig};
use anyhow::Result;

pub use mathjax::MathJaxRenderer;
pub use typst_math::TypstMathRenderer;

/// Turns TeX source into HTML.
///
/// Errors are reported to the caller, which decides on a fallback; the
/// shortcodes fall back to the original source text.
pub trait MathRenderer: Send + Sync {
    fn render(&self, tex: &str, display: bool) -> Result<String>;
}

/// Renderer for the configured backend.
pub fn renderer_for(config: &MathConfig) -> Box<dyn MathRenderer> {
    match config.backend {
        MathBackend::MathJax => Box::new(MathJaxRenderer),
        MathBackend::Typst => Box::new(TypstMathRenderer::new(config.preamble.clone())),
    }
}
