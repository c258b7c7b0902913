use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::explain::{extract_highlights, generate_reasons, Highlight};
use crate::features::extract_features;
use crate::hybrid::{combine, RiskLabel};
use crate::model::{shared_model, ModelBundle};
use crate::scoring::{calculate_confidence, calculate_rule_score, Confidence};

/// Full verdict for one contract: the combined score, its label, and the
/// human-readable evidence behind it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub score: u8,
    pub label: RiskLabel,
    pub confidence: Confidence,
    pub reasons: Vec<String>,
    pub highlights: Vec<Highlight>,
    pub debug: DebugScores,
}

/// Component scores exposed for inspection. `ml_score`/`ml_prob` are absent
/// when the process runs rule-only.
#[derive(Debug, Clone, Serialize)]
pub struct DebugScores {
    pub rule_score: u8,
    pub ml_score: Option<u8>,
    pub ml_prob: Option<f64>,
}

/// Stateless pipeline front door. Holding an `Analyzer` pins whether the
/// statistical model participates; the same input always yields the same
/// result for a given analyzer.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    model: Option<Arc<ModelBundle>>,
}

impl Analyzer {
    /// Rule-only analyzer.
    pub fn new() -> Self {
        Self { model: None }
    }

    pub fn with_model(model: Arc<ModelBundle>) -> Self {
        Self { model: Some(model) }
    }

    /// Analyzer backed by the process-wide shared model handle. A failed load
    /// is not an error; the analyzer silently runs rule-only.
    pub fn from_model_dir(dir: &Path) -> Self {
        Self {
            model: shared_model(dir),
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&Arc<ModelBundle>> {
        self.model.as_ref()
    }

    /// Run the whole pipeline on raw contract text. Infallible: degenerate
    /// input produces a low-confidence result, never an error.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let features = extract_features(text);
        let rule_score = calculate_rule_score(&features);
        let confidence = calculate_confidence(&features);

        let prediction = self
            .model
            .as_deref()
            .and_then(|model| model.predict_features(&features));

        let combined = combine(&features, rule_score, confidence, prediction.as_ref());

        AnalysisResult {
            score: combined.final_score,
            label: combined.label,
            confidence: combined.confidence,
            reasons: generate_reasons(&features),
            highlights: extract_highlights(text, &features),
            debug: DebugScores {
                rule_score: combined.rule_score,
                ml_score: combined.ml_score,
                ml_prob: combined.ml_prob,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::features::FEATURE_NAMES;
    use crate::hybrid::RiskLabel;
    use crate::model::{ModelBundle, MODEL_FILE, SCHEMA_FILE};

    use super::Analyzer;

    #[test]
    fn rule_only_analyzer_leaves_ml_fields_empty() {
        let analyzer = Analyzer::new();
        let result = analyzer.analyze("APR: 450%. Term: 14 days. Rollover permitted.");
        assert!(result.debug.ml_score.is_none());
        assert!(result.debug.ml_prob.is_none());
        assert_eq!(result.label, RiskLabel::Predatory);
    }

    #[test]
    fn model_backed_analyzer_reports_component_scores() {
        let dir = TempDir::new().expect("tempdir");
        let names: Vec<String> = FEATURE_NAMES.iter().map(|n| n.to_string()).collect();
        let coefficients = vec![0.01; names.len()];
        fs::write(
            dir.path().join(SCHEMA_FILE),
            serde_json::json!({ "feature_names": names, "model_type": "logistic_regression" })
                .to_string(),
        )
        .expect("write schema");
        fs::write(
            dir.path().join(MODEL_FILE),
            serde_json::json!({
                "model_type": "logistic_regression",
                "coefficients": coefficients,
                "intercept": -1.0,
            })
            .to_string(),
        )
        .expect("write model");

        let bundle = ModelBundle::load(dir.path()).expect("load bundle");
        let analyzer = Analyzer::with_model(Arc::new(bundle));
        assert!(analyzer.has_model());

        let result = analyzer.analyze("APR: 250%. Term: 14 days. Amount $400.");
        let prob = result.debug.ml_prob.expect("ml probability");
        assert!((0.0..=1.0).contains(&prob));
        assert_eq!(
            result.debug.ml_score.expect("ml score"),
            (prob * 100.0).round() as u8
        );
    }

    #[test]
    fn missing_model_dir_degrades_to_rule_only() {
        let dir = TempDir::new().expect("tempdir");
        let analyzer = Analyzer::from_model_dir(&dir.path().join("nope"));
        // Either rule-only, or a model pinned earlier by another test via the
        // shared handle; in both cases analyze must succeed.
        let result = analyzer.analyze("APR: 30%. Term: 12 months. Amount $500.");
        assert!(result.score <= 100);
    }

    #[test]
    fn result_serializes_with_wire_field_names() {
        let result = Analyzer::new().analyze("APR: 450%. Binding arbitration required.");
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["label"], "Predatory");
        assert!(value["confidence"].is_string());
        assert!(value["reasons"].is_array());
        assert!(value["highlights"].is_array());
        assert!(value["debug"]["rule_score"].is_u64());
        assert!(value["debug"]["ml_score"].is_null());
    }
}
