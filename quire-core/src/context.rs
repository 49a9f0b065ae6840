//! Per-build state threaded through every shortcode invocation.

use crate::citations::CitationTracker;
use crate::html::tooltip_text;
use crate::models::{Diagnostic, Footnote};
use quire_widgets::SliderRegistry;
use std::mem;

/// State owned by one build and dropped with it.
///
/// Footnote ids are sequential across the whole build and start at 1, so
/// a new context is created at the start of every build. Citations and
/// sliders are tracked per page between [`BuildContext::begin_page`] and
/// [`BuildContext::finish_page`].
#[derive(Debug, Default)]
pub struct BuildContext {
    footnotes: Vec<Footnote>,
    page: PageState,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
struct PageState {
    slug: Option<String>,
    first_footnote: usize,
    citations: CitationTracker,
    sliders: SliderRegistry,
}

/// What one page contributed to the build.
#[derive(Debug, Clone, Default)]
pub struct PageOutput {
    pub footnotes: Vec<Footnote>,
    pub citations: Vec<String>,
    pub slider_ids: Vec<String>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start collecting per-page state for `slug`.
    pub fn begin_page(&mut self, slug: &str) {
        self.page = PageState {
            slug: Some(slug.to_string()),
            first_footnote: self.footnotes.len(),
            ..PageState::default()
        };
    }

    /// Close the current page and hand back what it recorded.
    pub fn finish_page(&mut self) -> PageOutput {
        let page = mem::take(&mut self.page);
        let footnotes = self.footnotes[page.first_footnote..].to_vec();
        self.page.first_footnote = self.footnotes.len();
        PageOutput {
            footnotes,
            citations: page.citations.keys().to_vec(),
            slider_ids: page.sliders.iter().map(|(id, _)| id.to_string()).collect(),
        }
    }

    pub fn page_slug(&self) -> Option<&str> {
        self.page.slug.as_deref()
    }

    /// Record a footnote with the next sequential id.
    pub fn next_footnote(&mut self, content: &str) -> &Footnote {
        let id = self.footnotes.len() as u32 + 1;
        self.footnotes.push(Footnote {
            id,
            content: content.to_string(),
            tooltip: tooltip_text(content),
        });
        &self.footnotes[self.footnotes.len() - 1]
    }

    /// Every footnote recorded so far in this build, in id order.
    pub fn footnotes(&self) -> &[Footnote] {
        &self.footnotes
    }

    /// Footnotes of the page currently being rendered.
    pub fn page_footnotes(&self) -> &[Footnote] {
        &self.footnotes[self.page.first_footnote..]
    }

    /// Reference number of `key` on the current page.
    pub fn cite(&mut self, key: &str) -> usize {
        self.page.citations.register(key)
    }

    pub fn citations(&self) -> &CitationTracker {
        &self.page.citations
    }

    pub fn sliders(&self) -> &SliderRegistry {
        &self.page.sliders
    }

    pub fn sliders_mut(&mut self) -> &mut SliderRegistry {
        &mut self.page.sliders
    }

    /// Record a diagnostic, attributing it to the current page.
    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        let diagnostic = if diagnostic.page.is_none() {
            diagnostic.with_page(self.page.slug.as_deref())
        } else {
            diagnostic
        };
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take accumulated diagnostics (clearing the internal buffer).
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    /// Consume the context, returning all footnotes of the build.
    pub fn into_footnotes(self) -> Vec<Footnote> {
        self.footnotes
    }
}
