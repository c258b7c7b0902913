use loanshark_core::{extract_features, Analyzer, Confidence, RiskLabel};

const PAYDAY_CONTRACT: &str = "APR: 520%, Service Fee: $25 per $100 borrowed, Term: 14 days, \
     Binding arbitration required, class action waiver.";

#[test]
fn payday_contract_end_to_end() {
    let features = extract_features(PAYDAY_CONTRACT);
    assert_eq!(features.apr, Some(520.0));
    assert!(features.mentions_per_100);
    assert!(features.term_very_short());
    assert!(features.has_arbitration);
    assert!(features.has_class_action_waiver);

    let result = Analyzer::new().analyze(PAYDAY_CONTRACT);
    assert_eq!(result.debug.rule_score, 90);
    assert_eq!(result.score, 90);
    assert_eq!(result.label, RiskLabel::Predatory);
    assert_eq!(result.confidence, Confidence::Medium);
    assert!(!result.reasons.is_empty());
    assert!(!result.highlights.is_empty());
}

#[test]
fn benign_contract_end_to_end() {
    let text = "CONSUMER INSTALLMENT LOAN. APR: 12%. Term: 36 months. \
        Loan amount $5,000 repaid in monthly installments of $166. \
        Late Fee: $15. All fees are clearly disclosed in the fee schedule below. \
        No penalty applies to early repayment.";
    let result = Analyzer::new().analyze(text);
    assert_eq!(result.label, RiskLabel::Safe);
    assert_eq!(
        result.reasons,
        vec!["No major red flags detected in this contract.".to_string()]
    );
    assert!(result.highlights.is_empty());
}

#[test]
fn result_shape_is_complete_for_any_input() {
    for text in ["", "x", PAYDAY_CONTRACT, "$$$%%% 💰"] {
        let result = Analyzer::new().analyze(text);
        let value = serde_json::to_value(&result).expect("serialize");
        for key in ["score", "label", "confidence", "reasons", "highlights", "debug"] {
            assert!(value.get(key).is_some(), "missing key {key} for {text:?}");
        }
        for key in ["rule_score", "ml_score", "ml_prob"] {
            assert!(value["debug"].get(key).is_some(), "missing debug key {key}");
        }
        assert!(result.score <= 100);
        assert!(result.reasons.len() <= 5);
        assert!(result.highlights.len() <= 6);
    }
}

#[test]
fn analysis_is_deterministic() {
    let analyzer = Analyzer::new();
    let first = serde_json::to_value(analyzer.analyze(PAYDAY_CONTRACT)).expect("serialize");
    let second = serde_json::to_value(analyzer.analyze(PAYDAY_CONTRACT)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn fixture_contracts_land_on_opposite_ends() {
    let analyzer = Analyzer::new();

    let payday = analyzer.analyze(include_str!("../../../tests/fixtures/payday_loan.txt"));
    assert_eq!(payday.label, RiskLabel::Predatory);
    assert_eq!(payday.debug.rule_score, 100);

    let installment =
        analyzer.analyze(include_str!("../../../tests/fixtures/installment_loan.txt"));
    assert_eq!(installment.label, RiskLabel::Safe);
    assert_eq!(installment.debug.rule_score, 0);
}

#[test]
fn risk_grows_with_apr() {
    let analyzer = Analyzer::new();
    let ranks: Vec<u8> = [50, 150, 350]
        .iter()
        .map(|apr| {
            let text = format!("APR: {apr}%. Term: 12 months. Amount $500.");
            analyzer.analyze(&text).label.rank()
        })
        .collect();
    assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]), "{ranks:?}");
}

#[test]
fn negated_clauses_stay_off_the_verdict() {
    let text = "APR: 14%. Term: 24 months. Amount $1,000 with a $10 Late Fee. \
        No continuous authorization is granted; only scheduled payments will be debited. \
        Autopay enrollment is optional.";
    let result = Analyzer::new().analyze(text);
    let features = extract_features(text);
    assert!(!features.has_continuous_debit);
    assert!(!features.has_auto_debit);
    assert_eq!(result.label, RiskLabel::Safe);
}

#[test]
fn kitchen_sink_contract_respects_output_caps() {
    let text = "PAYDAY LOAN AGREEMENT. APR: 600%. Service Fee: $30 per $100 borrowed. \
        Additional fees apply. Term: 7 days. Single payment due in full. \
        The loan will automatically renew unless repaid. Balloon payment due at maturity. \
        Borrower authorizes lender to repeatedly debit the account until paid. \
        Disputes resolved by binding arbitration. Class action waiver applies. \
        Borrower waives right to jury trial. Confession of judgment. \
        Wage assignment authorized. We may contact your employer.";
    let result = Analyzer::new().analyze(text);
    assert_eq!(result.label, RiskLabel::Predatory);
    assert_eq!(result.reasons.len(), 5);
    assert!(result.highlights.len() <= 6);
    assert_eq!(result.debug.rule_score, 100);
}
