use serde::{Deserialize, Serialize};

use loanshark_core::Analyzer;

/// Shared application state. The analyzer pins the model decision made at
/// startup; requests never reload model files.
pub struct AppState {
    pub analyzer: Analyzer,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub analyze: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub schema_loaded: bool,
    pub model_type: Option<String>,
    pub features_count: usize,
}
