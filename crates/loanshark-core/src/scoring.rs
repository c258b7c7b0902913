use serde::Serialize;

use crate::features::FeatureSet;

/// How much the extraction quality supports the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

/// Point values for the rule engine. Fixed constants carried over from the
/// tuned original; kept here as configuration rather than re-derived.
pub mod weights {
    // Cost bucket (mutually exclusive tiers, max 40).
    pub const APR_EXTREME: i32 = 40;
    pub const APR_TRIPLE_DIGIT: i32 = 25;
    pub const APR_ELEVATED: i32 = 10;
    pub const APR_MISSING_TRANSPARENCY: i32 = 15;

    // Fee bucket.
    pub const PER_100_FEE: i32 = 20;
    pub const ANY_UPFRONT_FEE: i32 = 5;
    pub const FEE_AMBIGUITY: i32 = 10;

    // Debt-cycle bucket.
    pub const ROLLOVER_OR_RENEWAL: i32 = 20;
    pub const BALLOON_PAYMENT: i32 = 10;
    pub const VERY_SHORT_TERM: i32 = 10;

    // Legal/collection bucket.
    pub const CONFESSION_OF_JUDGMENT: i32 = 20;
    pub const WAGE_ASSIGNMENT: i32 = 15;
    pub const ARBITRATION: i32 = 10;
    pub const CLASS_ACTION_WAIVER: i32 = 10;
    pub const JURY_WAIVER: i32 = 5;
    pub const CONTINUOUS_OR_AUTO_DEBIT: i32 = 10;
    pub const EMPLOYER_CONTACT: i32 = 7;
}

/// Additive, capped rule score in [0, 100]. Only penalties accumulate; there
/// are no negative adjustments that could mask a predatory signal.
pub fn calculate_rule_score(features: &FeatureSet) -> u8 {
    let mut score = 0i32;

    // Cost: APR tiers are mutually exclusive; a missing APR earns a flat
    // transparency penalty instead.
    let apr = features.apr_value();
    if features.apr_missing() {
        score += weights::APR_MISSING_TRANSPARENCY;
    } else if apr >= 300.0 {
        score += weights::APR_EXTREME;
    } else if apr >= 100.0 {
        score += weights::APR_TRIPLE_DIGIT;
    } else if apr >= 36.0 {
        score += weights::APR_ELEVATED;
    }

    // Fees: "$X per $100" dominates; otherwise any positive service or
    // origination fee earns the small penalty. Ambiguity language stacks.
    if features.mentions_per_100 {
        score += weights::PER_100_FEE;
    } else if features.service_fee.unwrap_or(0.0) > 0.0
        || features.origination_fee.unwrap_or(0.0) > 0.0
    {
        score += weights::ANY_UPFRONT_FEE;
    }
    if features.has_fee_ambiguity {
        score += weights::FEE_AMBIGUITY;
    }

    // Debt cycle.
    if features.has_rollover_or_renewal {
        score += weights::ROLLOVER_OR_RENEWAL;
    }
    if features.has_balloon_payment {
        score += weights::BALLOON_PAYMENT;
    }
    if features.term_very_short() {
        score += weights::VERY_SHORT_TERM;
    }

    // Legal and collection traps, all additive.
    if features.has_confession_of_judgment {
        score += weights::CONFESSION_OF_JUDGMENT;
    }
    if features.has_wage_assignment {
        score += weights::WAGE_ASSIGNMENT;
    }
    if features.has_arbitration {
        score += weights::ARBITRATION;
    }
    if features.has_class_action_waiver {
        score += weights::CLASS_ACTION_WAIVER;
    }
    if features.has_jury_waiver {
        score += weights::JURY_WAIVER;
    }
    if features.has_continuous_debit || features.has_auto_debit {
        score += weights::CONTINUOUS_OR_AUTO_DEBIT;
    }
    if features.has_employer_contact {
        score += weights::EMPLOYER_CONTACT;
    }

    score.clamp(0, 100) as u8
}

/// Confidence in the assessment, from extraction quality and completeness.
pub fn calculate_confidence(features: &FeatureSet) -> Confidence {
    let mut confidence = 100i32;

    if features.apr_missing() {
        confidence -= 25;
    }
    if features.term_days_or_zero() == 0 {
        confidence -= 15;
    }

    let words = features.doc_length_words;
    if words < 30 {
        confidence -= 30;
    } else if words < 50 {
        confidence -= 20;
    } else if words < 100 {
        confidence -= 10;
    }

    let money = features.num_money_amounts;
    let percent = features.num_percentages;
    if money == 0 && percent == 0 {
        confidence -= 20;
    } else if money < 2 && percent < 1 {
        confidence -= 10;
    }

    if features.fee_word_count < 2 {
        confidence -= 10;
    }

    match confidence.clamp(0, 100) {
        75..=100 => Confidence::High,
        45..=74 => Confidence::Medium,
        _ => Confidence::Low,
    }
}

#[cfg(test)]
mod tests {
    use crate::features::extract_features;

    use super::{calculate_confidence, calculate_rule_score, Confidence};

    #[test]
    fn apr_tiers_are_mutually_exclusive() {
        assert_eq!(calculate_rule_score(&extract_features("APR: 450%. Fee charge penalty.")), 40);
        assert_eq!(calculate_rule_score(&extract_features("APR: 150%. Fee charge penalty.")), 25);
        assert_eq!(calculate_rule_score(&extract_features("APR: 40%. Fee charge penalty.")), 10);
        assert_eq!(calculate_rule_score(&extract_features("APR: 20%. Fee charge penalty.")), 0);
    }

    #[test]
    fn missing_apr_earns_transparency_penalty() {
        let features = extract_features("Borrow money today, details inside.");
        assert_eq!(calculate_rule_score(&features), 15);
    }

    #[test]
    fn per_100_fee_dominates_upfront_fee_branch() {
        let per_100 = extract_features("APR: 20%. Cost: $15 per $100 borrowed.");
        assert_eq!(calculate_rule_score(&per_100), 20);

        let upfront = extract_features("APR: 20%. Origination Fee: $50.");
        assert_eq!(calculate_rule_score(&upfront), 5);
    }

    #[test]
    fn fee_ambiguity_stacks_on_fee_branch() {
        let features = extract_features("APR: 20%. Origination Fee: $50. Additional fees apply.");
        assert_eq!(calculate_rule_score(&features), 15);
    }

    #[test]
    fn legal_trap_points_are_additive() {
        let features = extract_features(
            "APR: 20%. Confession of judgment. Wage assignment. Binding arbitration. \
             Class action waiver. No jury trial.",
        );
        // 20 + 15 + 10 + 10 + 5.
        assert_eq!(calculate_rule_score(&features), 60);
    }

    #[test]
    fn score_is_capped_at_100() {
        let features = extract_features(
            "APR: 600%. $30 per $100 borrowed. Additional fees apply. Automatic rollover. \
             Balloon payment due. Term: 7 days. Confession of judgment. Wage assignment. \
             Binding arbitration. Class action waiver. No jury trial. \
             Lender may repeatedly debit until paid. Contact employer for collection.",
        );
        assert_eq!(calculate_rule_score(&features), 100);
    }

    #[test]
    fn rich_complete_contract_scores_high_confidence() {
        let text = format!(
            "CONSUMER INSTALLMENT LOAN AGREEMENT. APR: 18%. Term: 24 months. \
             Loan amount $2,000 repayable in monthly installments of $98. \
             Late Fee: $15. No processing charge or penalty beyond the stated fee schedule. \
             All fees are clearly disclosed. {}",
            "This agreement is governed by state law. ".repeat(12)
        );
        let features = extract_features(&text);
        assert_eq!(calculate_confidence(&features), Confidence::High);
    }

    #[test]
    fn short_vague_text_scores_low_confidence() {
        let features = extract_features("Quick cash now, ask us how.");
        assert_eq!(calculate_confidence(&features), Confidence::Low);
    }

    #[test]
    fn medium_confidence_band() {
        // APR and term present, short document, financial mentions present.
        let features = extract_features(
            "Loan agreement. APR: 30%. Term: 12 months. Amount $500. Late Fee: $10. \
             A penalty charge applies to missed payments.",
        );
        assert_eq!(calculate_confidence(&features), Confidence::Medium);
    }
}
