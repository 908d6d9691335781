//! HTTP glue for the web desktop shell: static assets with SPA fallback, the
//! app-manifest API, the software catalog, and desktop-state persistence.

mod api;
mod paths;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::paths::ServerPaths;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let root: PathBuf = std::env::var_os("AERODESK_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000);

    let paths = Arc::new(ServerPaths::under(&root));
    paths
        .ensure_bootstrap_files()
        .context("bootstrapping server state files")?;

    let spa = ServeDir::new(&paths.public_dir)
        .fallback(ServeFile::new(paths.public_dir.join("index.html")));
    let app = Router::new()
        .merge(api::router(paths.clone()))
        .fallback_service(spa);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, root = %root.display(), "web desktop server listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
