use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cv_normalizer::config::Config;
use cv_normalizer::normalize::{HeuristicTables, Normalizer};
use cv_normalizer::routes::build_router;
use cv_normalizer::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "cv_normalizer={level},tower_http={level}",
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Normalizer v{}", env!("CARGO_PKG_VERSION"));

    let tables = match &config.heuristics_path {
        Some(path) => {
            let tables = HeuristicTables::from_json_file(path)
                .with_context(|| format!("Failed to load heuristic tables from {}", path.display()))?;
            info!("Heuristic tables loaded from {}", path.display());
            tables
        }
        None => HeuristicTables::default(),
    };
    let normalizer = Normalizer::new(tables).context("Failed to compile heuristic tables")?;

    let state = AppState {
        config: config.clone(),
        normalizer: Arc::new(normalizer),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
