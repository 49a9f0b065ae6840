//! # quire-core
//!
//! Core library for the quire static site generator.
//!
//! This crate parses page sources and configuration, expands shortcodes
//! against a per-build [`BuildContext`], converts Markdown, and annotates
//! citations from BibTeX bibliographies.

pub mod bibliography;
pub mod builder;
pub mod citations;
pub mod config;
pub mod context;
pub mod frontmatter;
pub mod highlight;
pub mod html;
pub mod markdown;
pub mod math;
pub mod models;
pub mod shortcodes;
pub mod slug;

pub use bibliography::{parse_bibtex, BibEntry, Bibliography, BibliographyStore};
pub use builder::{BuildError, SiteBuilder};
pub use citations::{annotate_citations, format_tooltip};
pub use config::{Config, MathBackend};
pub use context::BuildContext;
pub use models::{
    ArticleSummary, Diagnostic, DiagnosticSeverity, Footnote, Frontmatter, Page, SiteIndex,
    SourceKind,
};
pub use shortcodes::{RenderContext, ShortcodeRegistry};
pub use slug::slugify;
