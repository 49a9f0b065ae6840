//! Verify command: build in memory and report diagnostics.

use anyhow::{Context, Result};
use quire_core::{Config, Diagnostic, DiagnosticSeverity, SiteBuilder};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct VerificationSummary<'a> {
    pages: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    diagnostics: &'a [Diagnostic],
}

/// Run the build pipeline without writing output and surface diagnostics.
pub fn verify_site(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let builder = SiteBuilder::new(config);
    let site_index = builder
        .build()
        .context("Failed to build site for verification")?;

    let diagnostics = &site_index.diagnostics;
    let count = |severity| diagnostics.iter().filter(|d| d.severity == severity).count();

    let summary = VerificationSummary {
        pages: site_index.pages.len(),
        errors: count(DiagnosticSeverity::Error),
        warnings: count(DiagnosticSeverity::Warning),
        infos: count(DiagnosticSeverity::Info),
        diagnostics,
    };

    if json {
        let payload = serde_json::to_string_pretty(&summary)?;
        println!("{}", payload);
    } else {
        println!(
            "Verification complete: {} pages, {} errors, {} warnings, {} info",
            summary.pages, summary.errors, summary.warnings, summary.infos
        );
        for diag in diagnostics {
            let page = diag
                .page
                .as_deref()
                .map(|s| format!(" [{}]", s))
                .unwrap_or_default();
            let source = diag
                .source_path
                .as_deref()
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            println!(
                "- {:?} {}{}{}: {}",
                diag.severity, diag.code, page, source, diag.message
            );
        }
    }

    Ok(())
}
