//! Report PDF Server
//!
//! Edits text fields of an HTML report template and regenerates the report
//! as a PDF. Provides:
//!
//! - `POST /api/generate-pdf`: patch fields, render, drop spacer pages
//! - `GET /health`
//! - Static serving of the template, its fonts and sibling assets
//!
//! ## Architecture
//!
//! ```text
//! request ──► report-template (patch in memory)
//!                  │
//!                  ▼
//!             render-engine (headless Chrome, 1920×1080 pages)
//!                  │
//!                  ▼
//!             pagefilter-core (keep odd pages) ──► output_final.pdf
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use render_engine::ChromeRenderer;
use report_template::TemplateStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod assets;
mod config;
mod error;
mod job;
mod state;

use api::{handle_generate_pdf, handle_health};
use config::Config;
use state::AppState;

/// Command-line arguments for the report server
#[derive(Parser, Debug)]
#[command(name = "report-server")]
#[command(about = "Patch report fields and regenerate the report PDF")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host address to bind to (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Full application router
fn router(state: AppState) -> Router {
    let assets = assets::routes(state.store.path(), &state.fonts_dir);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/generate-pdf", post(handle_generate_pdf))
        .with_state(state)
        .merge(assets)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Log what the fonts directory holds, or that it is missing
fn check_fonts_dir(config: &Config) {
    let fonts_dir = &config.template.fonts_dir;
    match std::fs::read_dir(fonts_dir) {
        Ok(entries) => {
            let count = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "woff2"))
                .count();
            info!("Found {} font files in {}", count, fonts_dir.display());
        }
        Err(_) => warn!("Fonts directory not found: {}", fonts_dir.display()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    check_fonts_dir(&config);

    let renderer = Arc::new(ChromeRenderer::new(config.render_options()));
    let state = AppState::new(
        TemplateStore::new(&config.template.path),
        config.field_map(),
        renderer,
        &config.template.output,
    )
    .with_fonts_dir(&config.template.fonts_dir)
    .with_asset_base_url(config.asset_base_url())
    .with_job_timeout(config.job_timeout());

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server running on http://{}", addr);
    info!("Template: {}", config.template.path.display());
    info!("Assets served to the renderer from {}", config.asset_base_url());

    axum::serve(listener, app).await?;

    Ok(())
}
