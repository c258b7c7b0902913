use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use serde::Serialize;

use crate::features::FeatureSet;

pub const MAX_REASONS: usize = 5;
pub const MAX_HIGHLIGHTS: usize = 6;
const SNIPPET_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HighlightCategory {
    ExcessiveCost,
    LegalTrap,
    DebtCycle,
    PaymentAccess,
    Collection,
}

impl HighlightCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightCategory::ExcessiveCost => "ExcessiveCost",
            HighlightCategory::LegalTrap => "LegalTrap",
            HighlightCategory::DebtCycle => "DebtCycle",
            HighlightCategory::PaymentAccess => "PaymentAccess",
            HighlightCategory::Collection => "Collection",
        }
    }
}

/// A dangerous snippet lifted from the contract, normalized and word-bounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Highlight {
    pub text: String,
    pub category: HighlightCategory,
}

fn anchor(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("highlight anchor must compile")
}

static APR_ANCHOR: Lazy<Regex> = Lazy::new(|| anchor(r"(APR[:\s]+[0-9]+\.?[0-9]*%)"));
static PER_100_ANCHOR: Lazy<Regex> = Lazy::new(|| anchor(r"(\$[0-9]+\s*per\s*\$100[^\n]{0,60})"));
static ARBITRATION_ANCHOR: Lazy<Regex> =
    Lazy::new(|| anchor(r"([^\n]{0,30}(?:binding )?arbitration[^\n]{0,50})"));
static CLASS_ACTION_ANCHOR: Lazy<Regex> =
    Lazy::new(|| anchor(r"([^\n]{0,20}class action waiver[^\n]{0,30})"));
static ROLLOVER_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    anchor(r"([^\n]{0,20}(?:automatically renew|rollover|may be renewed|renew)[^\n]{0,50})")
});
static CONTINUOUS_DEBIT_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    anchor(
        r"([^\n]{0,30}(?:authorizes? lender|lender may|initiate.*debit|repeatedly debit|multiple.*withdrawal|until paid)[^\n]{0,50})",
    )
});
static AUTO_DEBIT_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    anchor(
        r"([^\n]{0,30}(?:authorize|permission|grant)[^\n]{0,30}(?:debit|withdraw|ACH|bank account)[^\n]{0,40})",
    )
});
static EMPLOYER_ANCHOR: Lazy<Regex> = Lazy::new(|| anchor(r"([^\n]{0,20}contact.*employer[^\n]{0,30})"));

/// Negation words that invalidate a payment-access snippet even when the
/// document-level flag was set from matter outside this window.
static SNIPPET_NEGATION: Lazy<Regex> = Lazy::new(|| anchor(r"(\bno\b|\bnot\b|does not|may not)"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| anchor(r"\s+"));

/// Ranked, templated reasons. Six priority tiers evaluated in order, each
/// contributing at most one sentence, truncated to `MAX_REASONS`.
pub fn generate_reasons(features: &FeatureSet) -> Vec<String> {
    let mut reasons = Vec::new();
    let apr = features.apr_value();

    // Tier 1: APR severity.
    if apr > 300.0 {
        reasons.push(format!(
            "APR is {apr:.0}%, which is extremely high and predatory."
        ));
    } else if apr > 100.0 {
        reasons.push(format!(
            "APR is {apr:.0}%, significantly above typical rates (36% is considered high)."
        ));
    } else if apr > 50.0 {
        reasons.push(format!(
            "APR is {apr:.0}%, which is elevated compared to standard loans."
        ));
    }

    // Tier 2: fee structure.
    if features.mentions_per_100 {
        reasons.push(
            "Fees charged per $100 borrowed compound quickly on short-term loans.".to_string(),
        );
    }

    // Tier 3: debt cycle.
    if features.has_rollover_or_renewal {
        reasons.push(
            "Loan includes rollover/renewal clauses that can trap borrowers in debt cycles."
                .to_string(),
        );
    } else if features.term_very_short() {
        reasons.push(
            "Very short repayment term (14 days or less) makes it difficult to repay without rolling over."
                .to_string(),
        );
    }

    // Tier 4: legal traps.
    if features.has_arbitration && features.has_class_action_waiver {
        reasons.push(
            "Mandatory arbitration + class action waiver severely limits your legal rights."
                .to_string(),
        );
    } else if features.has_arbitration {
        reasons.push(
            "Mandatory arbitration clause found (you waive your right to sue in court).".to_string(),
        );
    } else if features.has_class_action_waiver {
        reasons
            .push("Class action waiver prevents you from joining group lawsuits.".to_string());
    }

    // Tier 5: payment access.
    if features.has_continuous_debit {
        reasons.push(
            "Lender can repeatedly debit your account, risking overdraft fees and loss of control."
                .to_string(),
        );
    } else if features.has_auto_debit {
        reasons.push(
            "Automatic debit authorization may make it difficult to manage payments.".to_string(),
        );
    }

    // Tier 6: collection tactics.
    if features.has_employer_contact {
        reasons.push(
            "Lender may contact your employer for collection, risking your job.".to_string(),
        );
    } else if features.has_wage_assignment {
        reasons.push("Wage assignment gives lender direct access to your paycheck.".to_string());
    }

    if reasons.is_empty()
        && apr < 36.0
        && !features.has_arbitration
        && !features.has_class_action_waiver
    {
        reasons.push("No major red flags detected in this contract.".to_string());
    }

    reasons.truncate(MAX_REASONS);
    reasons
}

/// Highlighted snippets per active category, deduplicated by
/// (category, text) in first-seen order and capped at `MAX_HIGHLIGHTS`.
pub fn extract_highlights(text: &str, features: &FeatureSet) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    if features.apr_value() > 100.0 {
        push_anchor(&mut highlights, text, &APR_ANCHOR, HighlightCategory::ExcessiveCost);
    }
    push_anchor(&mut highlights, text, &PER_100_ANCHOR, HighlightCategory::ExcessiveCost);

    if features.has_arbitration {
        push_anchor(&mut highlights, text, &ARBITRATION_ANCHOR, HighlightCategory::LegalTrap);
    }
    if features.has_class_action_waiver {
        push_anchor(&mut highlights, text, &CLASS_ACTION_ANCHOR, HighlightCategory::LegalTrap);
    }
    if features.has_rollover_or_renewal {
        push_anchor(&mut highlights, text, &ROLLOVER_ANCHOR, HighlightCategory::DebtCycle);
    }

    // The document-level flag may have been set by a trigger elsewhere in the
    // text; a snippet that itself reads as a negation is discarded.
    if features.has_continuous_debit {
        if let Some(caps) = CONTINUOUS_DEBIT_ANCHOR.captures(text) {
            let snippet = &caps[1];
            if !SNIPPET_NEGATION.is_match(snippet) {
                highlights.push(Highlight {
                    text: clean_snippet(snippet),
                    category: HighlightCategory::PaymentAccess,
                });
            }
        }
    }
    if features.has_auto_debit {
        push_anchor(&mut highlights, text, &AUTO_DEBIT_ANCHOR, HighlightCategory::PaymentAccess);
    }
    if features.has_employer_contact {
        push_anchor(&mut highlights, text, &EMPLOYER_ANCHOR, HighlightCategory::Collection);
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for highlight in highlights {
        if seen.insert((highlight.category, highlight.text.clone())) {
            unique.push(highlight);
        }
    }
    unique.truncate(MAX_HIGHLIGHTS);
    unique
}

fn push_anchor(
    highlights: &mut Vec<Highlight>,
    text: &str,
    pattern: &Regex,
    category: HighlightCategory,
) {
    if let Some(caps) = pattern.captures(text) {
        highlights.push(Highlight {
            text: clean_snippet(&caps[1]),
            category,
        });
    }
}

/// Collapse whitespace and trim to at most 80 characters at a word boundary,
/// appending an ellipsis when truncated.
fn clean_snippet(raw: &str) -> String {
    let unbroken = raw.replace(['\n', '\r'], " ");
    let collapsed = WHITESPACE_RUN.replace_all(&unbroken, " ");
    let snippet = collapsed.trim();

    if snippet.chars().count() <= SNIPPET_MAX_CHARS {
        return snippet.to_string();
    }

    let head: String = snippet.chars().take(SNIPPET_MAX_CHARS - 3).collect();
    match head.rfind(' ') {
        Some(cut) if cut > 60 => format!("{}...", &head[..cut]),
        _ => format!("{}...", head.trim_end()),
    }
}

#[cfg(test)]
mod tests {
    use crate::features::extract_features;

    use super::{clean_snippet, extract_highlights, generate_reasons, HighlightCategory};

    #[test]
    fn reasons_follow_priority_order() {
        let features = extract_features(
            "APR: 520%. $25 per $100 borrowed. Loan may rollover. Binding arbitration. \
             Class action waiver. Lender may repeatedly debit until paid. \
             We will contact your employer.",
        );
        let reasons = generate_reasons(&features);
        assert_eq!(reasons.len(), 5);
        assert!(reasons[0].starts_with("APR is 520%"));
        assert!(reasons[1].contains("per $100"));
        assert!(reasons[2].contains("rollover"));
        assert!(reasons[3].contains("arbitration + class action"));
        assert!(reasons[4].contains("repeatedly debit"));
    }

    #[test]
    fn each_tier_contributes_at_most_one_sentence() {
        // Rollover and a very short term both present: tier 3 emits only the
        // rollover sentence.
        let features = extract_features("APR: 20%. Term: 7 days. Automatic rollover permitted.");
        let reasons = generate_reasons(&features);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("rollover"));
    }

    #[test]
    fn clean_contract_gets_fallback_reason() {
        let features = extract_features(
            "Personal loan. APR: 12%. Term: 36 months. Monthly payment schedule. \
             All fees clearly disclosed.",
        );
        let reasons = generate_reasons(&features);
        assert_eq!(
            reasons,
            vec!["No major red flags detected in this contract.".to_string()]
        );
    }

    #[test]
    fn no_fallback_when_legal_trap_present_even_with_low_apr() {
        let features = extract_features("APR: 12%. Disputes resolved by binding arbitration.");
        let reasons = generate_reasons(&features);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("arbitration"));
    }

    #[test]
    fn elevated_apr_tier_fires_between_50_and_100() {
        let features = extract_features("APR: 75%. Term: 12 months.");
        let reasons = generate_reasons(&features);
        assert!(reasons[0].contains("elevated"));
    }

    #[test]
    fn highlights_cover_active_categories() {
        let text = "APR: 520% applies. Service charge of $25 per $100 borrowed. \
                    Disputes require binding arbitration in all cases. \
                    The loan will automatically renew unless repaid. \
                    We may contact your employer about collection.";
        let highlights = extract_highlights(text, &extract_features(text));

        assert!(highlights.len() <= 6);
        let categories: Vec<_> = highlights.iter().map(|h| h.category).collect();
        assert!(categories.contains(&HighlightCategory::ExcessiveCost));
        assert!(categories.contains(&HighlightCategory::LegalTrap));
        assert!(categories.contains(&HighlightCategory::DebtCycle));
        assert!(categories.contains(&HighlightCategory::Collection));
    }

    #[test]
    fn highlights_are_deduplicated_by_category_and_text() {
        let text = "APR: 520% now. APR: 520% again on the same line.";
        let highlights = extract_highlights(text, &extract_features(text));
        let mut seen = std::collections::HashSet::new();
        for highlight in &highlights {
            assert!(seen.insert((highlight.category, highlight.text.clone())));
        }
    }

    #[test]
    fn negated_snippet_is_discarded_even_when_flag_is_set() {
        // The flag is forced on via a trigger far from the anchor text, but
        // the snippet itself reads as a negation.
        let padding = "x ".repeat(120);
        let text = format!(
            "Lender may not initiate transfers. {padding} Funds can be withdrawn at any time from the branch."
        );
        let features = extract_features(&text);
        let highlights = extract_highlights(&text, &features);
        assert!(highlights
            .iter()
            .all(|h| h.category != HighlightCategory::PaymentAccess));
    }

    #[test]
    fn snippets_are_word_bounded_and_capped() {
        let long = format!(
            "Borrower authorizes lender to {} withdraw repeatedly debit the account",
            "initiate electronic transactions and ".repeat(4)
        );
        let highlights = extract_highlights(&long, &extract_features(&long));
        for highlight in &highlights {
            assert!(highlight.text.chars().count() <= 80, "{}", highlight.text);
            if highlight.text.ends_with("...") {
                assert!(!highlight.text.trim_end_matches("...").ends_with(' '));
            }
        }
    }

    #[test]
    fn snippet_cleaning_collapses_newlines_and_whitespace() {
        assert_eq!(clean_snippet("binding\narbitration   required\r\nnow"),
            "binding arbitration required now");
    }

    #[test]
    fn snippet_longer_than_cap_gets_ellipsis() {
        let raw = "a".repeat(50) + " " + &"b".repeat(50);
        let cleaned = clean_snippet(&raw);
        assert!(cleaned.chars().count() <= 80);
        assert!(cleaned.ends_with("..."));
    }
}
