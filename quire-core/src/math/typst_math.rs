//! Build-time math: TeX is translated to Typst with mitex, compiled, and
//! embedded as inline SVG.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    num::NonZeroUsize,
    sync::Mutex,
};

use anyhow::{anyhow, Result};
use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use typst::diag::SourceDiagnostic;
use typst::layout::{Abs, PagedDocument};
use typst_as_lib::TypstEngine;

use super::MathRenderer;
use crate::html::escape;

const MATH_CACHE_CAPACITY: usize = 512;

/// Definitions for the helper functions mitex emits that have no direct
/// Typst equivalent.
const MITEX_SHIM: &str = r#"
#let mitexsqrt(..args) = {
  let a = args.pos()
  if a.len() == 1 { math.sqrt(a.at(0)) } else { math.root(a.at(0), a.at(1)) }
}
#let mitexmathbf(it) = math.bold(math.upright(it))
#let mitexbold(it) = math.bold(math.upright(it))
#let mitexupright(it) = math.upright(it)
#let mitexitalic(it) = math.italic(it)
#let mitexsans(it) = math.sans(it)
#let mitexfrak(it) = math.frak(it)
#let mitexmono(it) = math.mono(it)
#let mitexcal(it) = math.cal(it)
#let mitexdisplay(it) = math.display(it)
#let mitexinline(it) = math.inline(it)
"#;

/// Renders TeX to SVG through Typst, caching results by source.
#[derive(Debug)]
pub struct TypstMathRenderer {
    fonts: Vec<&'static [u8]>,
    preamble: Option<String>,
    cache: Mutex<LruCache<u64, String>>,
}

impl TypstMathRenderer {
    pub fn new(preamble: Option<String>) -> Self {
        let capacity = NonZeroUsize::new(MATH_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            fonts: typst_assets::fonts().collect(),
            preamble,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn render_svg(&self, tex: &str, display: bool) -> Result<String> {
        let key = cache_key(tex, display, self.preamble.as_deref());
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(svg) = cache.get(&key) {
                return Ok(svg.clone());
            }
        }

        let typst_math = mitex::convert_math(tex, None)
            .map_err(|err| anyhow!("TeX to Typst conversion failed: {err}"))?;
        debug!(tex, typst = %typst_math, "converted math");

        let source = build_source(&typst_math, display, self.preamble.as_deref());
        let engine = TypstEngine::builder()
            .main_file(source)
            .fonts(self.fonts.iter().copied())
            .build();

        let warned = engine.compile::<PagedDocument>();
        log_warnings(&warned.warnings);
        let doc = warned
            .output
            .map_err(|err| anyhow!("Typst math compilation failed: {err:?}"))?;

        // Small padding keeps strokes from being clipped at the edges
        let svg = typst_svg::svg_merged(&doc, Abs::pt(0.5));
        let svg = normalize_svg(&svg);

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, svg.clone());
        }
        Ok(svg)
    }
}

impl MathRenderer for TypstMathRenderer {
    fn render(&self, tex: &str, display: bool) -> Result<String> {
        let svg = self.render_svg(tex, display)?;
        Ok(wrap_svg(&svg, tex, display))
    }
}

fn build_source(math: &str, display: bool, preamble: Option<&str>) -> String {
    // Block equations need whitespace inside the delimiters
    let (open, close) = if display { ("$ ", " $") } else { ("$", "$") };
    let preamble = preamble.unwrap_or_default();
    format!(
        r#"
#set page(width: auto, height: auto, margin: 0pt, fill: none)
#set text(font: "New Computer Modern", size: 15pt, fill: black)
#set math.equation(numbering: none)
{MITEX_SHIM}
{preamble}

{open}{math}{close}
"#
    )
}

fn cache_key(tex: &str, display: bool, preamble: Option<&str>) -> u64 {
    let mut hasher = DefaultHasher::new();
    tex.hash(&mut hasher);
    display.hash(&mut hasher);
    preamble.hash(&mut hasher);
    hasher.finish()
}

fn wrap_svg(svg: &str, tex: &str, display: bool) -> String {
    let alt = escape(tex);
    let (tag, class) = if display {
        ("div", "typst-display")
    } else {
        ("span", "typst-inline")
    };
    format!(
        r#"<{tag} class="typst-math {class}" role="math" aria-label="{alt}" data-math="{alt}">{svg}</{tag}>"#
    )
}

fn log_warnings(warnings: &[SourceDiagnostic]) {
    for warning in warnings {
        warn!("Typst warning: {}", warning.message);
    }
}

fn normalize_svg(svg: &str) -> String {
    hide_from_a11y(&normalize_svg_colors(svg))
}

/// Black fills and strokes become `currentColor` so math follows the text color.
fn normalize_svg_colors(svg: &str) -> String {
    static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r#"(?i)(fill|stroke)=["']\s*(black|#000(?:000)?|rgb\(\s*0\s*,\s*0\s*,\s*0\s*\))\s*["']"#,
        )
        .expect("valid color attribute regex")
    });
    static STYLE_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r#"(?i)(fill|stroke)\s*:\s*(black|#000(?:000)?|rgb\(\s*0\s*,\s*0\s*,\s*0\s*\))"#,
        )
        .expect("valid color style regex")
    });

    let svg = ATTR_RE.replace_all(svg, r#"$1="currentColor""#);
    STYLE_RE.replace_all(&svg, "$1:currentColor").into_owned()
}

/// The wrapper carries the accessible label, so the SVG itself is hidden.
fn hide_from_a11y(svg: &str) -> String {
    if svg.contains("aria-hidden") {
        return svg.to_string();
    }
    svg.replacen("<svg ", r#"<svg aria-hidden="true" focusable="false" "#, 1)
        .replacen("<svg>", r#"<svg aria-hidden="true" focusable="false">"#, 1)
}
