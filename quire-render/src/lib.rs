//! # quire-render
//!
//! Page layouts for quire.
//!
//! This crate wraps built pages in Askama layouts (`page`, `article`) and
//! renders the site index with the `articles` collection.

pub mod templates;

pub use templates::{
    render_index, render_page, ArticleEntry, ArticleTemplate, IndexTemplate, Layout,
    PageTemplate, RenderError, SiteMeta,
};
