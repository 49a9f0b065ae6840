//! Build command implementation.

use anyhow::{Context, Result};
use include_dir::{include_dir, Dir};
use quire_core::{Config, DiagnosticSeverity, SiteBuilder, SiteIndex};
use quire_render::{render_index, render_page, SiteMeta};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// Embed the stylesheets and slider script at compile time so they're available after cargo install
static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Build the static site (writes output) and discard the in-memory index
pub fn build_site(config_path: &Path) -> Result<()> {
    build_site_with_index(config_path).map(|_| ())
}

/// Build the static site and return the in-memory index alongside the loaded config
pub fn build_site_with_index(config_path: &Path) -> Result<(Config, SiteIndex)> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    build_site_with_config(config)
}

/// Build the site from an already loaded config, writing output and returning the index.
pub fn build_site_with_config(config: Config) -> Result<(Config, SiteIndex)> {
    tracing::info!("Building site: {}", config.site.title);

    let builder = SiteBuilder::new(config.clone());
    let site_index = builder.build().context("Failed to build site")?;
    report_diagnostics(&site_index);

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let site = SiteMeta::from_config(&config);
    let mut written = 0;
    for page in &site_index.pages {
        if page.draft {
            tracing::debug!("Skipping draft: {}", page.slug);
            continue;
        }
        // The index page's content is shown by the generated index
        if page.output_path == "index.html" {
            continue;
        }
        write_page(&output_dir, &page.output_path, &render_page(page, &site)?)?;
        tracing::debug!("Rendered: {}", page.slug);
        written += 1;
    }

    let index_html = render_index(&site_index, &site)?;
    fs::write(output_dir.join("index.html"), index_html).context("Failed to write index.html")?;

    generate_articles_json(&config, &site_index, &site.base_url)?;
    copy_passthrough(&config)?;
    extract_embedded_static(&output_dir)?;

    tracing::info!("✓ Built {} pages and the index", written);
    tracing::info!("✓ Output written to {:?}", output_dir);

    Ok((config, site_index))
}

fn report_diagnostics(site_index: &SiteIndex) {
    for diag in &site_index.diagnostics {
        let page = diag.page.as_deref().unwrap_or("-");
        match diag.severity {
            DiagnosticSeverity::Error => {
                tracing::error!("{} [{}]: {}", diag.code, page, diag.message)
            }
            DiagnosticSeverity::Warning => {
                tracing::warn!("{} [{}]: {}", diag.code, page, diag.message)
            }
            DiagnosticSeverity::Info => {
                tracing::info!("{} [{}]: {}", diag.code, page, diag.message)
            }
        }
    }
}

fn write_page(output_dir: &Path, rel_path: &str, html: &str) -> Result<()> {
    let output_path = output_dir.join(rel_path);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(&output_path, html).with_context(|| format!("Failed to write {:?}", output_path))
}

/// Generate articles.json with the articles collection, newest first
fn generate_articles_json(config: &Config, site_index: &SiteIndex, base_url: &str) -> Result<()> {
    let articles = site_index.article_summaries(base_url);
    let json = serde_json::to_string_pretty(&articles).context("Failed to serialize articles")?;
    fs::write(config.output_dir().join("articles.json"), json)
        .context("Failed to write articles.json")?;

    tracing::info!("Generated articles.json with {} articles", articles.len());
    Ok(())
}

/// Copy configured files and directories verbatim into the output
fn copy_passthrough(config: &Config) -> Result<()> {
    let output_dir = config.output_dir();
    for rule in &config.passthrough {
        let (from, to) = rule.endpoints();
        let src = config.resolve_relative(from);
        let dest = output_dir.join(to);

        if src.is_dir() {
            copy_dir(&src, &dest)?;
        } else if src.is_file() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&src, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", src, dest))?;
        } else {
            tracing::warn!("Passthrough path {:?} does not exist", src);
            continue;
        }
        tracing::info!("Copied {:?} -> {:?}", from, to);
    }
    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", entry.path(), target))?;
    }
    Ok(())
}

fn extract_embedded_static(dest: &Path) -> Result<()> {
    for file in STATIC_ASSETS.files() {
        let target = dest.join(file.path());
        fs::write(&target, file.contents())
            .with_context(|| format!("Failed to write embedded static file to {:?}", target))?;
    }
    Ok(())
}
