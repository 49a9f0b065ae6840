//! Site building logic - discovers sources, expands shortcodes, converts
//! Markdown and applies the citation filter.

use crate::{
    bibliography::BibliographyStore,
    citations::annotate_citations,
    config::Config,
    context::BuildContext,
    frontmatter::parse_frontmatter,
    markdown::MarkdownProcessor,
    math::{renderer_for, MathRenderer},
    models::*,
    shortcodes::{render_footnotes, RenderContext, ShortcodeRegistry},
    slug::slugify,
};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input directory not found: {0}")]
    MissingInput(PathBuf),

    #[error("Duplicate slug '{slug}' ({first} and {second})")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
}

/// Layouts understood by the renderer
pub const LAYOUTS: [&str; 2] = ["page", "article"];

/// A discovered page source before rendering
#[derive(Debug)]
struct Source {
    path: PathBuf,
    rel_path: String,
    kind: SourceKind,
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
    processor: MarkdownProcessor,
    shortcodes: ShortcodeRegistry,
    math: Box<dyn MathRenderer>,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        let math = renderer_for(&config.math);
        Self {
            config,
            processor: MarkdownProcessor::new(),
            shortcodes: ShortcodeRegistry::builtin(),
            math,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the entire site in memory.
    ///
    /// Every call starts from a fresh [`BuildContext`], so footnote ids
    /// restart at 1 on each build.
    pub fn build(&self) -> Result<SiteIndex, BuildError> {
        let input_dir = self.config.input_dir();
        if !input_dir.is_dir() {
            return Err(BuildError::MissingInput(input_dir));
        }

        let sources = self.discover_sources(&input_dir);
        info!("Found {} page sources", sources.len());

        let mut ctx = BuildContext::new();
        let mut bibliography_store = BibliographyStore::new();
        bibliography_store.preload_paths(&self.config.bibliography_paths());

        let mut pages: Vec<Page> = Vec::new();
        let mut owners: HashMap<String, String> = HashMap::new();

        for source in &sources {
            let content = fs::read_to_string(&source.path)?;
            let (frontmatter, body) = match parse_frontmatter(&content) {
                Ok(parsed) => parsed,
                Err(err) => {
                    error!("Failed to parse {:?}: {}", source.path, err);
                    ctx.push_diagnostic(
                        Diagnostic::error("frontmatter.invalid", err.to_string())
                            .with_source(source.rel_path.clone()),
                    );
                    continue;
                }
            };

            let slug = page_slug(&source.rel_path, frontmatter.slug.as_deref());
            if let Some(first) = owners.get(&slug) {
                warn!("Duplicate slug: {}", slug);
                return Err(BuildError::DuplicateSlug {
                    slug,
                    first: first.clone(),
                    second: source.rel_path.clone(),
                });
            }
            owners.insert(slug.clone(), source.rel_path.clone());

            let page = self.render_page(
                source,
                slug,
                frontmatter,
                &body,
                &mut ctx,
                &mut bibliography_store,
            );
            debug!("Rendered {} -> {}", page.source_path, page.output_path);
            pages.push(page);
        }

        let mut diagnostics = ctx.take_diagnostics();
        diagnostics.extend(bibliography_store.take_diagnostics());
        let footnotes = ctx.into_footnotes();

        info!(
            "Built site index with {} pages ({} footnotes, {} diagnostics)",
            pages.len(),
            footnotes.len(),
            diagnostics.len()
        );

        Ok(SiteIndex {
            pages,
            diagnostics,
            footnotes,
        })
    }

    fn render_page(
        &self,
        source: &Source,
        slug: String,
        frontmatter: Frontmatter,
        body: &str,
        ctx: &mut BuildContext,
        bibliography_store: &mut BibliographyStore,
    ) -> Page {
        ctx.begin_page(&slug);

        let bibliography = bibliography_store.collect(&self.bibliography_paths(&frontmatter));
        let html = {
            let mut render_ctx = RenderContext {
                build: &mut *ctx,
                bibliography: &bibliography,
                math: self.math.as_ref(),
            };
            let expansion = self.shortcodes.expand(body, &mut render_ctx);
            let converted = match source.kind {
                SourceKind::Markdown => self.processor.convert(&expansion.text),
                SourceKind::Html => expansion.text.clone(),
            };

            let cited = !render_ctx.build.citations().is_empty();
            let references = if expansion.has_references() || cited {
                render_ctx.references_html()
            } else {
                String::new()
            };
            let mut html = expansion.restore(&converted, &references);
            // Cited pages without a `bibliography` shortcode still get their list
            if cited && !expansion.has_references() {
                html.push('\n');
                html.push_str(&references);
            }
            html
        };

        let output = ctx.finish_page();
        let mut html = html;
        if let Some(section) = render_footnotes(&output.footnotes) {
            html.push('\n');
            html.push_str(&section);
        }
        // Footnote bodies may carry citations too
        let content_html = annotate_citations(&html, &bibliography);

        let date = frontmatter.date.as_deref().and_then(|raw| {
            let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok();
            if parsed.is_none() {
                ctx.push_diagnostic(
                    Diagnostic::warning("frontmatter.date", format!("Unrecognized date '{}'", raw))
                        .with_page(Some(&slug))
                        .with_source(source.rel_path.clone()),
                );
            }
            parsed
        });

        if let Some(layout) = frontmatter.layout.as_deref() {
            if !LAYOUTS.contains(&layout) {
                ctx.push_diagnostic(
                    Diagnostic::warning(
                        "layout.unknown",
                        format!("Unknown layout '{}', using 'page'", layout),
                    )
                    .with_page(Some(&slug))
                    .with_source(source.rel_path.clone()),
                );
            }
        }

        let title = if frontmatter.title.trim().is_empty() {
            Path::new(&source.rel_path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        } else {
            frontmatter.title
        };

        let is_article = Path::new(&source.rel_path).starts_with(&self.config.paths.articles);

        Page {
            output_path: format!("{}.html", slug),
            slug,
            title,
            description: frontmatter.description,
            date,
            tags: frontmatter.tags,
            draft: frontmatter.draft,
            kind: source.kind,
            layout: frontmatter.layout,
            source_path: source.rel_path.clone(),
            content_html,
            footnotes: output.footnotes,
            citations: output.citations,
            is_article,
        }
    }

    /// Discover page sources under the input directory, in path order.
    ///
    /// Directories starting with `_` (includes, layouts, data) or `.` are
    /// skipped, as are paths matching `ignore_patterns`.
    fn discover_sources(&self, input_dir: &Path) -> Vec<Source> {
        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns);
        let output_dir = self.config.output_dir();
        let mut sources = Vec::new();

        let walker = WalkDir::new(input_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(is_private(e.file_name().to_string_lossy().as_ref())
                        || e.path() == output_dir)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let kind = match entry.path().extension().and_then(|e| e.to_str()) {
                Some("md") | Some("markdown") => SourceKind::Markdown,
                Some("html") | Some("htm") => SourceKind::Html,
                _ => continue,
            };

            let rel_path = relative_path(entry.path(), input_dir);
            if should_ignore(&rel_path, &ignore_patterns) {
                debug!("Ignoring {} due to ignore_patterns", rel_path);
                continue;
            }

            sources.push(Source {
                path: entry.path().to_path_buf(),
                rel_path,
                kind,
            });
        }

        sources
    }

    fn bibliography_paths(&self, frontmatter: &Frontmatter) -> Vec<PathBuf> {
        let mut paths = self.config.bibliography_paths();
        for extra in &frontmatter.bibliography {
            if extra.trim().is_empty() {
                continue;
            }
            paths.push(self.config.resolve_relative(Path::new(extra.trim())));
        }
        paths
    }
}

fn is_private(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// `/`-separated path of `path` below `root`.
fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Slug of a page: slugified directories plus the file stem (or the
/// frontmatter override for the last segment).
fn page_slug(rel_path: &str, override_slug: Option<&str>) -> String {
    let path = Path::new(rel_path);
    let mut segments: Vec<String> = path
        .parent()
        .into_iter()
        .flat_map(|parent| parent.components())
        .map(|c| slugify(&c.as_os_str().to_string_lossy()))
        .filter(|s| !s.is_empty())
        .collect();

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let last = match override_slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(custom) => slugify(custom),
        None => slugify(&stem),
    };
    segments.push(if last.is_empty() {
        "untitled".to_string()
    } else {
        last
    });
    segments.join("/")
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}
