mod collaborator;
mod config;
mod errors;
mod layout;
mod models;
mod report;
mod routes;
mod session;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::collaborator::HttpScreeningBackend;
use crate::config::Config;
use crate::routes::build_router;
use crate::session::CollectionManager;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the screening collaborator client
    let backend = HttpScreeningBackend::new(
        &config.collaborator_url,
        config.remote_timeout,
        config.match_timeout,
    )
    .context("Failed to build collaborator client")?;
    info!(
        "Collaborator client initialized ({}, timeout {:?})",
        config.collaborator_url, config.remote_timeout
    );

    // Report layout (A4 defaults unless REPORT_LAYOUT_FILE overrides)
    let layout = config.load_layout()?;
    info!(
        "Report layout: {}x{}mm, {:?} {}pt",
        layout.page_width_mm, layout.page_height_mm, layout.font, layout.body_font_size_pt
    );

    // Build app state
    let state = AppState {
        manager: CollectionManager::new(Arc::new(backend)),
        config: config.clone(),
        layout: Arc::new(layout),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the shell's deployment host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
