use serde::Serialize;

use crate::features::FeatureSet;
use crate::model::MlPrediction;
use crate::scoring::Confidence;

/// Categorical risk label. Floor rules may only escalate severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    Safe,
    Caution,
    #[serde(rename = "High Risk")]
    HighRisk,
    Predatory,
}

impl RiskLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLabel::Safe => "Safe",
            RiskLabel::Caution => "Caution",
            RiskLabel::HighRisk => "High Risk",
            RiskLabel::Predatory => "Predatory",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            RiskLabel::Safe => 0,
            RiskLabel::Caution => 1,
            RiskLabel::HighRisk => 2,
            RiskLabel::Predatory => 3,
        }
    }

    fn at_least(self, floor: RiskLabel) -> RiskLabel {
        if self.rank() >= floor.rank() {
            self
        } else {
            floor
        }
    }

    fn from_score(score: u8) -> RiskLabel {
        match score {
            0..=20 => RiskLabel::Safe,
            21..=50 => RiskLabel::Caution,
            51..=80 => RiskLabel::HighRisk,
            _ => RiskLabel::Predatory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub rule_score: u8,
    pub ml_score: Option<u8>,
    pub ml_prob: Option<f64>,
    pub confidence: Confidence,
    pub final_score: u8,
    pub label: RiskLabel,
}

/// Reconcile the rule score with the optional statistical probability.
///
/// Evaluation order matters and is fixed: adaptive weighting, the
/// anti-suppression floor, the two hard score floors, score-to-label
/// mapping, then the three label floors from least to most severe.
pub fn combine(
    features: &FeatureSet,
    rule_score: u8,
    confidence: Confidence,
    ml: Option<&MlPrediction>,
) -> ScoreResult {
    let mut final_score = match ml {
        None => rule_score,
        Some(prediction) => {
            let (rule_weight, ml_weight) = adaptive_weights(features, confidence);
            let weighted = rule_weight * f64::from(rule_score)
                + ml_weight * f64::from(prediction.score);
            let mut combined = weighted.round() as u8;

            // The statistical model may not discount a strong rule signal by
            // more than 30%.
            if rule_score > 20 {
                let floor = (f64::from(rule_score) * 0.7).round() as u8;
                combined = combined.max(floor);
            }
            combined
        }
    };

    let apr = features.apr_value();
    if apr > 400.0 {
        final_score = final_score.max(85);
    }
    if features.has_arbitration && features.has_class_action_waiver && apr > 100.0 {
        final_score = final_score.max(75);
    }

    let mut label = RiskLabel::from_score(final_score);

    // Label floors, monotonic escalation only.
    if features.has_arbitration || features.has_class_action_waiver || features.has_confession_of_judgment
    {
        label = label.at_least(RiskLabel::Caution);
    }
    if features.has_rollover_or_renewal
        || features.mentions_per_100
        || apr >= 100.0
        || features.term_very_short()
    {
        label = label.at_least(RiskLabel::HighRisk);
    }
    if apr >= 300.0
        && (features.has_rollover_or_renewal
            || features.has_arbitration
            || features.has_continuous_debit)
    {
        label = RiskLabel::Predatory;
    }

    ScoreResult {
        rule_score,
        ml_score: ml.map(|prediction| prediction.score),
        ml_prob: ml.map(|prediction| prediction.prob),
        confidence,
        final_score,
        label,
    }
}

/// Weight split between the rule engine and the statistical model. A sparse
/// document (no APR, little fee language) leans almost entirely on rules.
fn adaptive_weights(features: &FeatureSet, confidence: Confidence) -> (f64, f64) {
    if features.apr_missing() && features.fee_word_count < 3 {
        (0.9, 0.1)
    } else if confidence == Confidence::High {
        (0.5, 0.5)
    } else {
        (0.6, 0.4)
    }
}
