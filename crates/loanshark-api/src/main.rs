use axum::{
    routing::{get, post},
    Router,
};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

mod handlers;
mod models;

use handlers::{analyze, analyze_file, health_check, root};
use loanshark_core::Analyzer;
use models::AppState;

const DEFAULT_MODEL_DIR: &str = "model/models";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "info,loanshark_api=debug".to_string()),
        )
        .init();

    info!("Starting LoanShark API");

    // Model directory; a missing or invalid model downgrades to rule-only.
    let model_dir = env::var("LOANSHARK_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_DIR));

    let analyzer = Analyzer::from_model_dir(&model_dir);
    if analyzer.has_model() {
        info!("Model loaded from {}", model_dir.display());
    } else {
        warn!(
            "No model at {}, running rule-only analysis",
            model_dir.display()
        );
    }

    let state = Arc::new(AppState { analyzer });

    // Build router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/analyze", post(analyze))
        .route("/analyze/file", post(analyze_file))
        .with_state(state)
        .layer(CorsLayer::permissive()); // TODO: Restrict in production

    // Server address
    let port = env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse::<u16>()
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("LoanShark API listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
