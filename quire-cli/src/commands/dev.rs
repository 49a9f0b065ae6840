//! Dev server command implementation.

use super::build::build_site_with_index;
use anyhow::{Context, Result};
use axum::Router;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build, serve the output directory, and rebuild whenever sources change
pub async fn dev_server(config_path: &Path, port: Option<u16>) -> Result<()> {
    let (config, _) = build_site_with_index(config_path).context("Failed to build site")?;
    let port = port.unwrap_or(config.server.port);
    let output_dir = config.output_dir();

    let mut watched = vec![config.input_dir(), config_path.to_path_buf()];
    watched.extend(config.bibliography_paths());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut _watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;

    for path in &watched {
        if !path.exists() {
            tracing::debug!("Not watching missing path {:?}", path);
            continue;
        }
        _watcher
            .watch(path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {:?}", path))?;
    }

    tokio::spawn({
        let config_path = config_path.to_path_buf();
        let output_dir = output_dir.clone();
        async move {
            while let Some(event) = rx.recv().await {
                match event {
                    Ok(ev) if !triggers_rebuild(&ev, &output_dir) => continue,
                    Ok(_) => {
                        // Debounce a bit by draining pending events
                        while rx.try_recv().is_ok() {}
                        tracing::info!("Change detected, rebuilding site...");
                        // Each rebuild constructs a fresh SiteBuilder and BuildContext
                        let res = tokio::task::spawn_blocking({
                            let config_path = config_path.clone();
                            move || build_site_with_index(&config_path)
                        })
                        .await;

                        match res {
                            Ok(Ok((_, site_index))) => tracing::info!(
                                "Rebuild complete ({} pages, {} footnotes)",
                                site_index.pages.len(),
                                site_index.footnotes.len()
                            ),
                            Ok(Err(e)) => tracing::error!("Rebuild failed: {:?}", e),
                            Err(e) => tracing::error!("Rebuild task panicked: {}", e),
                        }
                    }
                    Err(err) => tracing::warn!("Watcher error: {}", err),
                }
            }
        }
    });

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Starting dev server on http://localhost:{}", port);
    println!("\nServing {:?} at http://localhost:{}", output_dir, port);
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, router(output_dir))
        .await
        .context("Server error")?;

    Ok(())
}

/// Static file router over the output directory
fn router(output_dir: PathBuf) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(output_dir))
        .layer(TraceLayer::new_for_http())
}

/// Content changes trigger a rebuild; access events and writes into the
/// output directory do not.
fn triggers_rebuild(event: &Event, output_dir: &Path) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    );
    relevant_kind && event.paths.iter().any(|p| !p.starts_with(output_dir))
}
