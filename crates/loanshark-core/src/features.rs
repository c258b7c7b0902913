use regex::Regex;

use crate::patterns::{
    fee_patterns, ClauseFlag, APR_PATTERNS, AUTO_DEBIT_EXCLUSIONS, AUTO_DEBIT_TRIGGER,
    CLAUSE_RULES, CONTINUOUS_DEBIT_NEGATIONS, CONTINUOUS_DEBIT_TRIGGERS, FEE_KEYWORDS, MONEY_RE,
    PERCENT_RE, PER_100_PATTERNS, TERM_DAYS_RE, TERM_MONTHS_RE,
};

/// Fixed feature schema, in vector order. Every analysis produces a value for
/// every name here; unknown names encode to 0 during vectorization.
pub static FEATURE_NAMES: &[&str] = &[
    "apr_value",
    "apr_missing",
    "apr_over_100",
    "apr_over_300",
    "late_fee_value",
    "origination_fee_value",
    "service_fee_value",
    "renewal_fee_value",
    "fee_word_count",
    "mentions_per_100",
    "term_days",
    "term_very_short",
    "has_single_payment_due",
    "has_monthly_payment",
    "has_rollover_or_renewal",
    "has_balloon_payment",
    "has_auto_debit",
    "has_continuous_debit",
    "has_wage_assignment",
    "has_arbitration",
    "has_class_action_waiver",
    "has_jury_waiver",
    "has_confession_of_judgment",
    "has_employer_contact",
    "has_clear_disclosure",
    "has_transparency_language",
    "has_fee_ambiguity",
    "doc_length_words",
    "num_money_amounts",
    "num_percentages",
    "apr_to_term_ratio",
];

/// Signals extracted from one contract. Quantities that may be absent are
/// `Option` so that a missing APR can never be confused with a true 0% APR.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub apr: Option<f64>,
    pub late_fee: Option<f64>,
    pub origination_fee: Option<f64>,
    pub service_fee: Option<f64>,
    pub renewal_fee: Option<f64>,
    pub fee_word_count: u32,
    pub mentions_per_100: bool,
    pub term_days: Option<u32>,
    pub has_single_payment_due: bool,
    pub has_monthly_payment: bool,
    pub has_rollover_or_renewal: bool,
    pub has_balloon_payment: bool,
    pub has_auto_debit: bool,
    pub has_continuous_debit: bool,
    pub has_wage_assignment: bool,
    pub has_arbitration: bool,
    pub has_class_action_waiver: bool,
    pub has_jury_waiver: bool,
    pub has_confession_of_judgment: bool,
    pub has_employer_contact: bool,
    pub has_clear_disclosure: bool,
    pub has_transparency_language: bool,
    pub has_fee_ambiguity: bool,
    pub doc_length_words: u32,
    pub num_money_amounts: u32,
    pub num_percentages: u32,
}

impl FeatureSet {
    /// APR as used by scoring: the extracted value when positive, else 0.
    /// Absence is carried separately by `apr_missing`.
    pub fn apr_value(&self) -> f64 {
        match self.apr {
            Some(apr) if apr > 0.0 => apr,
            _ => 0.0,
        }
    }

    pub fn apr_missing(&self) -> bool {
        self.apr.is_none()
    }

    pub fn apr_over(&self, threshold: f64) -> bool {
        self.apr.map_or(false, |apr| apr > threshold)
    }

    pub fn term_days_or_zero(&self) -> u32 {
        self.term_days.unwrap_or(0)
    }

    /// Term of 14 days or less (and known, and non-zero).
    pub fn term_very_short(&self) -> bool {
        matches!(self.term_days, Some(days) if (1..=14).contains(&days))
    }

    pub fn apr_to_term_ratio(&self) -> f64 {
        match (self.apr, self.term_days) {
            (Some(apr), Some(term)) if apr > 0.0 && term > 0 => apr / f64::from(term),
            _ => 0.0,
        }
    }

    /// Numeric encoding of one schema key, for ML vectorization. Names not in
    /// the schema encode to 0.
    pub fn value(&self, name: &str) -> f64 {
        match name {
            "apr_value" => self.apr_value(),
            "apr_missing" => bool_value(self.apr_missing()),
            "apr_over_100" => bool_value(self.apr_over(100.0)),
            "apr_over_300" => bool_value(self.apr_over(300.0)),
            "late_fee_value" => self.late_fee.unwrap_or(0.0).max(0.0),
            "origination_fee_value" => self.origination_fee.unwrap_or(0.0).max(0.0),
            "service_fee_value" => self.service_fee.unwrap_or(0.0).max(0.0),
            "renewal_fee_value" => self.renewal_fee.unwrap_or(0.0).max(0.0),
            "fee_word_count" => f64::from(self.fee_word_count),
            "mentions_per_100" => bool_value(self.mentions_per_100),
            "term_days" => f64::from(self.term_days_or_zero()),
            "term_very_short" => bool_value(self.term_very_short()),
            "has_single_payment_due" => bool_value(self.has_single_payment_due),
            "has_monthly_payment" => bool_value(self.has_monthly_payment),
            "has_rollover_or_renewal" => bool_value(self.has_rollover_or_renewal),
            "has_balloon_payment" => bool_value(self.has_balloon_payment),
            "has_auto_debit" => bool_value(self.has_auto_debit),
            "has_continuous_debit" => bool_value(self.has_continuous_debit),
            "has_wage_assignment" => bool_value(self.has_wage_assignment),
            "has_arbitration" => bool_value(self.has_arbitration),
            "has_class_action_waiver" => bool_value(self.has_class_action_waiver),
            "has_jury_waiver" => bool_value(self.has_jury_waiver),
            "has_confession_of_judgment" => bool_value(self.has_confession_of_judgment),
            "has_employer_contact" => bool_value(self.has_employer_contact),
            "has_clear_disclosure" => bool_value(self.has_clear_disclosure),
            "has_transparency_language" => bool_value(self.has_transparency_language),
            "has_fee_ambiguity" => bool_value(self.has_fee_ambiguity),
            "doc_length_words" => f64::from(self.doc_length_words),
            "num_money_amounts" => f64::from(self.num_money_amounts),
            "num_percentages" => f64::from(self.num_percentages),
            "apr_to_term_ratio" => self.apr_to_term_ratio(),
            _ => 0.0,
        }
    }
}

fn bool_value(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Extract every schema signal from raw contract text. Total: never fails,
/// and on empty or degenerate input every field holds its documented default.
pub fn extract_features(text: &str) -> FeatureSet {
    let lower = text.to_lowercase();

    FeatureSet {
        apr: extract_apr(text),
        late_fee: extract_fee(text, "Late Fee"),
        origination_fee: extract_fee(text, "Origination Fee"),
        service_fee: extract_fee(text, "Service Fee"),
        renewal_fee: extract_fee(text, "Renewal Fee"),
        fee_word_count: count_keywords(&lower, FEE_KEYWORDS),
        mentions_per_100: has_pattern(text, &PER_100_PATTERNS),
        term_days: extract_term_days(text),
        has_single_payment_due: clause(text, ClauseFlag::SinglePaymentDue),
        has_monthly_payment: clause(text, ClauseFlag::MonthlyPayment),
        has_rollover_or_renewal: clause(text, ClauseFlag::RolloverOrRenewal),
        has_balloon_payment: clause(text, ClauseFlag::BalloonPayment),
        has_auto_debit: detect_auto_debit(text),
        has_continuous_debit: detect_continuous_debit(text),
        has_wage_assignment: clause(text, ClauseFlag::WageAssignment),
        has_arbitration: clause(text, ClauseFlag::Arbitration),
        has_class_action_waiver: clause(text, ClauseFlag::ClassActionWaiver),
        has_jury_waiver: clause(text, ClauseFlag::JuryWaiver),
        has_confession_of_judgment: clause(text, ClauseFlag::ConfessionOfJudgment),
        has_employer_contact: clause(text, ClauseFlag::EmployerContact),
        has_clear_disclosure: clause(text, ClauseFlag::ClearDisclosure),
        has_transparency_language: clause(text, ClauseFlag::TransparencyLanguage),
        has_fee_ambiguity: clause(text, ClauseFlag::FeeAmbiguity),
        doc_length_words: text.split_whitespace().count() as u32,
        num_money_amounts: MONEY_RE.find_iter(text).count() as u32,
        num_percentages: PERCENT_RE.find_iter(text).count() as u32,
    }
}

/// First match among the ordered APR pattern alternatives.
fn extract_apr(text: &str) -> Option<f64> {
    for pattern in APR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(value) = caps[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

/// Fee value for a named fee label, matching either dollar or percent form.
fn extract_fee(text: &str, label: &str) -> Option<f64> {
    let (dollar, percent) = fee_patterns(label);
    for pattern in [&dollar, &percent] {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(value) = caps[1].parse::<f64>() {
                return Some(value.max(0.0));
            }
        }
    }
    None
}

/// Loan term in days: an explicit day count wins, else months x 30.
fn extract_term_days(text: &str) -> Option<u32> {
    if let Some(caps) = TERM_DAYS_RE.captures(text) {
        if let Ok(days) = caps[1].parse::<u32>() {
            return Some(days);
        }
    }
    if let Some(caps) = TERM_MONTHS_RE.captures(text) {
        if let Ok(months) = caps[1].parse::<u32>() {
            return Some(months.saturating_mul(30));
        }
    }
    None
}

fn count_keywords(lower: &str, keywords: &[&str]) -> u32 {
    keywords
        .iter()
        .map(|keyword| lower.matches(keyword).count() as u32)
        .sum()
}

fn has_pattern(text: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(text))
}

fn clause(text: &str, flag: ClauseFlag) -> bool {
    CLAUSE_RULES
        .iter()
        .find(|rule| rule.flag == flag)
        .map_or(false, |rule| has_pattern(text, &rule.patterns))
}

/// Auto-debit is flagged only when the authorization-near-debit trigger fires
/// and no optional/enrollment/opt-out vocabulary appears anywhere in the
/// document. Keeps "autopay enrollment is optional" clauses off the flag.
fn detect_auto_debit(text: &str) -> bool {
    if !AUTO_DEBIT_TRIGGER.is_match(text) {
        return false;
    }
    !has_pattern(text, &AUTO_DEBIT_EXCLUSIONS)
}

/// Continuous debit with a negation shield: find the first trigger phrasing,
/// then search the +/-150 character window around the match for a negation
/// phrase. The flag is set only when the window is clean.
fn detect_continuous_debit(text: &str) -> bool {
    let matched = CONTINUOUS_DEBIT_TRIGGERS
        .iter()
        .find_map(|pattern| pattern.find(text));

    let Some(matched) = matched else {
        return false;
    };

    let start = floor_char_boundary(text, matched.start().saturating_sub(150));
    let end = floor_char_boundary(text, (matched.end() + 150).min(text.len()));
    let context = &text[start..end];

    !has_pattern(context, &CONTINUOUS_DEBIT_NEGATIONS)
}

/// Largest char boundary at or below `index`. The context window is measured
/// in bytes, so clamping keeps slicing safe on non-ASCII contracts.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
