pub mod analyzer;
pub mod explain;
pub mod features;
pub mod hybrid;
pub mod model;
pub mod patterns;

pub mod scoring;

pub use analyzer::{AnalysisResult, Analyzer, DebugScores};
pub use explain::{Highlight, HighlightCategory};
pub use features::{extract_features, FeatureSet, FEATURE_NAMES};
pub use hybrid::{combine, RiskLabel, ScoreResult};
pub use model::{shared_model, FeatureSchema, MlPrediction, ModelBundle, ModelError};
pub use scoring::{calculate_confidence, calculate_rule_score, Confidence};
