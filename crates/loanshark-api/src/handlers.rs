use crate::models::*;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use loanshark_core::AnalysisResult;

const MIN_CONTRACT_CHARS: usize = 10;

/// Custom error type for API handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });
        (self.status, Json(body)).into_response()
    }
}

/// GET / - Service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "online",
        service: "loanshark-api",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            analyze: "/analyze",
            health: "/health",
        },
    })
}

/// GET /health - Detailed health check with model status
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let schema = state.analyzer.model().map(|model| model.schema());

    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.analyzer.has_model(),
        schema_loaded: schema.is_some(),
        model_type: schema.and_then(|s| s.model_type.clone()),
        features_count: schema.map(|s| s.feature_count()).unwrap_or(0),
    })
}

/// POST /analyze - Analyze pasted contract text
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let result = analyze_text(&state, &payload.text)?;
    Ok(Json(result))
}

/// POST /analyze/file - Analyze an uploaded plain-text contract
pub async fn analyze_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|err| {
            warn!("Malformed multipart upload: {}", err);
            ApiError::bad_request("Invalid file upload.")
        })?
        .ok_or_else(|| ApiError::bad_request("No file provided."))?;

    let content = field.bytes().await.map_err(|err| {
        warn!("Failed to read uploaded file: {}", err);
        ApiError::bad_request("Invalid file upload.")
    })?;

    let text = String::from_utf8(content.to_vec()).map_err(|_| {
        ApiError::bad_request("File encoding error. Please upload a plain text file.")
    })?;

    let result = analyze_text(&state, &text)?;
    Ok(Json(result))
}

/// Shared request gate plus pipeline invocation. Contracts shorter than 10
/// non-whitespace-trimmed characters are rejected before analysis.
fn analyze_text(state: &AppState, text: &str) -> Result<AnalysisResult, ApiError> {
    if text.trim().chars().count() < MIN_CONTRACT_CHARS {
        return Err(ApiError::bad_request(
            "Text is too short. Please provide a valid loan contract.",
        ));
    }

    debug!("Analyzing contract: {} bytes", text.len());
    let result = state.analyzer.analyze(text);
    info!(
        "Contract analyzed: score={}, label={}, confidence={}",
        result.score,
        result.label.as_str(),
        result.confidence.as_str()
    );

    Ok(result)
}
