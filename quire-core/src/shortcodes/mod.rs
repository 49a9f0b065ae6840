//! `{% name args %}` shortcodes expanded in page sources before Markdown.
//!
//! Top-level shortcode output is swapped for placeholders so the Markdown
//! pass cannot alter it; [`Expansion::restore`] puts the HTML back into the
//! converted page. Bodies of paired shortcodes that accept rich text are
//! expanded in place.

mod cite;
mod code;
mod footnote;
mod math;
mod parse;
mod slider;

use crate::bibliography::Bibliography;
use crate::citations::render_references;
use crate::context::BuildContext;
use crate::math::MathRenderer;
use crate::models::Diagnostic;
use quire_widgets::WidgetError;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::warn;

pub use cite::{BibliographyShortcode, CiteShortcode};
pub use code::{CodeBlockShortcode, CodeShortcode};
pub use footnote::{footnote_marker, render_footnotes, FootnoteShortcode};
pub use math::{MathBlockShortcode, MathShortcode};
pub use slider::SliderShortcode;

#[derive(Error, Debug)]
pub enum ShortcodeError {
    #[error("Invalid shortcode syntax: {0}")]
    Parse(String),

    #[error("`{shortcode}` requires a {name} argument")]
    MissingArgument {
        shortcode: String,
        name: &'static str,
    },

    #[error(transparent)]
    Widget(#[from] WidgetError),
}

/// One shortcode invocation with its parsed arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcodeCall {
    pub name: String,
    pub args: Vec<String>,
    pub kwargs: BTreeMap<String, String>,
    /// Body of a paired shortcode
    pub body: Option<String>,
}

impl ShortcodeCall {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn kwarg(&self, name: &str) -> Option<&str> {
        self.kwargs.get(name).map(String::as_str)
    }

    /// True when `name` appears as a bare word or as `name=true`.
    pub fn flag(&self, name: &str) -> bool {
        self.args.iter().any(|a| a == name)
            || matches!(self.kwarg(name), Some("true") | Some("1") | Some(""))
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub(crate) fn required_arg(
        &self,
        index: usize,
        name: &'static str,
    ) -> Result<&str, ShortcodeError> {
        self.arg(index).ok_or_else(|| ShortcodeError::MissingArgument {
            shortcode: self.name.clone(),
            name,
        })
    }
}

/// What a shortcode produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Html(String),
    /// The page's reference list, rendered once every citation is known
    References,
}

/// Everything a shortcode may read or update while rendering.
pub struct RenderContext<'a> {
    pub build: &'a mut BuildContext,
    pub bibliography: &'a Bibliography,
    pub math: &'a dyn MathRenderer,
}

impl RenderContext<'_> {
    /// Reference list for the citations made so far on this page.
    pub fn references_html(&self) -> String {
        render_references(&self.build.citations().references(self.bibliography))
    }
}

pub trait Shortcode: Send + Sync {
    fn name(&self) -> &'static str;

    /// Paired shortcodes take a body closed by `{% end<name> %}`.
    fn paired(&self) -> bool {
        false
    }

    /// Whether shortcodes inside the body are expanded first.
    fn expands_body(&self) -> bool {
        true
    }

    /// Block output replaces the paragraph Markdown wraps around it.
    fn block(&self) -> bool {
        false
    }

    fn render(
        &self,
        call: &ShortcodeCall,
        ctx: &mut RenderContext<'_>,
    ) -> Result<Rendered, ShortcodeError>;
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Html { html: String, block: bool },
    References,
}

/// Page text with shortcodes replaced by placeholders.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub text: String,
    slots: Vec<Slot>,
}

impl Expansion {
    /// Substitute rendered shortcode output back into converted HTML.
    ///
    /// A block placeholder that Markdown wrapped in its own paragraph is
    /// replaced together with the `<p>` tags.
    pub fn restore(&self, html: &str, references: &str) -> String {
        let mut html = html.to_string();
        for (index, slot) in self.slots.iter().enumerate() {
            let marker = placeholder(index);
            let (content, block) = match slot {
                Slot::Html { html: content, block } => (content.as_str(), *block),
                Slot::References => (references, true),
            };
            if block {
                html = html.replace(&format!("<p>{}</p>", marker), content);
            }
            html = html.replace(&marker, content);
        }
        html
    }

    pub fn has_references(&self) -> bool {
        self.slots.contains(&Slot::References)
    }
}

fn placeholder(index: usize) -> String {
    format!("\u{27E6}qs{}\u{27E7}", index)
}

/// Shortcode handlers by name.
pub struct ShortcodeRegistry {
    handlers: HashMap<&'static str, Box<dyn Shortcode>>,
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with every built-in shortcode.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MathShortcode));
        registry.register(Box::new(MathBlockShortcode));
        registry.register(Box::new(CodeShortcode));
        registry.register(Box::new(CodeBlockShortcode));
        registry.register(Box::new(FootnoteShortcode));
        registry.register(Box::new(CiteShortcode));
        registry.register(Box::new(BibliographyShortcode));
        registry.register(Box::new(SliderShortcode));
        registry
    }

    pub fn register(&mut self, shortcode: Box<dyn Shortcode>) {
        self.handlers.insert(shortcode.name(), shortcode);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Expand every shortcode in `source`, leaving placeholders behind.
    pub fn expand(&self, source: &str, ctx: &mut RenderContext<'_>) -> Expansion {
        let mut slots = Vec::new();
        let text = self.process(source, ctx, Some(&mut slots));
        Expansion { text, slots }
    }

    /// Expand every shortcode in `source` straight to HTML.
    pub fn expand_inline(&self, source: &str, ctx: &mut RenderContext<'_>) -> String {
        self.process(source, ctx, None)
    }

    fn process(
        &self,
        source: &str,
        ctx: &mut RenderContext<'_>,
        mut slots: Option<&mut Vec<Slot>>,
    ) -> String {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{%") {
            out.push_str(&rest[..start]);
            let text = &rest[start..];

            let Some(tag) = parse::scan_tag(text) else {
                report(ctx, "shortcode.unclosed_tag", "Shortcode tag is never closed with `%}`".to_string());
                out.push_str(text);
                return out;
            };
            let tag_text = &text[..tag.len];
            let after_tag = &text[tag.len..];

            if tag.name == "raw" {
                match parse::find_end(after_tag, "raw") {
                    Some((body_end, end_len)) => {
                        out.push_str(&after_tag[..body_end]);
                        rest = &after_tag[body_end + end_len..];
                    }
                    None => {
                        report(ctx, "shortcode.unterminated", "`raw` block is never closed".to_string());
                        out.push_str(tag_text);
                        rest = after_tag;
                    }
                }
                continue;
            }

            let Some(handler) = self.handlers.get(tag.name) else {
                report(ctx, "shortcode.unknown", format!("Unknown shortcode `{}`", tag.name));
                out.push_str(tag_text);
                rest = after_tag;
                continue;
            };

            let mut call = match parse::parse_call(tag.name, tag.args) {
                Ok(call) => call,
                Err(err) => {
                    report(ctx, "shortcode.invalid", format!("`{}`: {}", tag.name, err));
                    out.push_str(tag_text);
                    rest = after_tag;
                    continue;
                }
            };

            let mut consumed = tag.len;
            if handler.paired() {
                let Some((body_end, end_len)) = parse::find_end(after_tag, tag.name) else {
                    report(
                        ctx,
                        "shortcode.unterminated",
                        format!("`{0}` is never closed with `end{0}`", tag.name),
                    );
                    out.push_str(tag_text);
                    rest = after_tag;
                    continue;
                };
                let body = &after_tag[..body_end];
                call.body = Some(if handler.expands_body() {
                    self.process(body, ctx, None)
                } else {
                    body.to_string()
                });
                consumed += body_end + end_len;
            }

            match handler.render(&call, ctx) {
                Ok(rendered) => {
                    out.push_str(&emit(rendered, handler.block(), ctx, slots.as_deref_mut()))
                }
                Err(err) => {
                    report(ctx, "shortcode.failed", format!("`{}`: {}", tag.name, err));
                    out.push_str(&text[..consumed]);
                }
            }
            rest = &text[consumed..];
        }

        out.push_str(rest);
        out
    }
}

impl Default for ShortcodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn emit(
    rendered: Rendered,
    block: bool,
    ctx: &RenderContext<'_>,
    slots: Option<&mut Vec<Slot>>,
) -> String {
    match slots {
        Some(slots) => {
            let index = slots.len();
            slots.push(match rendered {
                Rendered::Html(html) => Slot::Html { html, block },
                Rendered::References => Slot::References,
            });
            placeholder(index)
        }
        None => match rendered {
            Rendered::Html(html) => html,
            Rendered::References => ctx.references_html(),
        },
    }
}

fn report(ctx: &mut RenderContext<'_>, code: &str, message: String) {
    warn!(page = ?ctx.build.page_slug(), "{}", message);
    ctx.build.push_diagnostic(Diagnostic::warning(code, message));
}
