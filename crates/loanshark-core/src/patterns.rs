use once_cell::sync::Lazy;
use regex::Regex;

/// Binary clause signals detected by ordered, first-match-wins pattern sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseFlag {
    SinglePaymentDue,
    MonthlyPayment,
    RolloverOrRenewal,
    BalloonPayment,
    WageAssignment,
    Arbitration,
    ClassActionWaiver,
    JuryWaiver,
    ConfessionOfJudgment,
    EmployerContact,
    ClearDisclosure,
    TransparencyLanguage,
    FeeAmbiguity,
}

/// One clause-detection rule: a flag plus its ordered pattern alternatives.
pub struct ClauseRule {
    pub flag: ClauseFlag,
    pub patterns: Vec<Regex>,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("clause pattern must compile")
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// Ordered APR pattern alternatives: explicit APR label first, then the
/// long-form label, then a generic interest-rate label.
pub static APR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"APR[:\s]+([0-9]+\.?[0-9]*)%",
        r"Annual Percentage Rate[:\s]+([0-9]+\.?[0-9]*)%",
        r"interest rate[:\s]+([0-9]+\.?[0-9]*)%",
    ])
});

/// Fee labels extracted by `extract_fee`, paired with dollar- and
/// percent-form patterns built from the label.
pub static FEE_LABELS: &[&str] = &["Late Fee", "Origination Fee", "Service Fee", "Renewal Fee"];

pub fn fee_patterns(label: &str) -> (Regex, Regex) {
    let escaped = regex::escape(label);
    (
        compile(&format!(r"{escaped}[:\s]+\$([0-9]+\.?[0-9]*)")),
        compile(&format!(r"{escaped}[:\s]+([0-9]+\.?[0-9]*)%")),
    )
}

pub static TERM_DAYS_RE: Lazy<Regex> = Lazy::new(|| compile(r"Term[:\s]+([0-9]+)\s*days?"));
pub static TERM_MONTHS_RE: Lazy<Regex> = Lazy::new(|| compile(r"Term[:\s]+([0-9]+)\s*months?"));

/// Keywords summed into the fee-density count (case-insensitive substrings).
pub static FEE_KEYWORDS: &[&str] = &["fee", "charge", "penalty", "service fee", "processing"];

pub static PER_100_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile_all(&[r"\$[0-9]+\s*per\s*\$100", r"per\s*\$100\s*borrowed"]));

/// Clause detection table. Kept as data so rules can be audited and extended
/// without touching control flow; evaluated in order, first match sets the flag.
pub static CLAUSE_RULES: Lazy<Vec<ClauseRule>> = Lazy::new(|| {
    vec![
        ClauseRule {
            flag: ClauseFlag::SinglePaymentDue,
            patterns: compile_all(&[r"single payment", r"due on payday", r"payment due.*payday"]),
        },
        ClauseRule {
            flag: ClauseFlag::MonthlyPayment,
            patterns: compile_all(&[r"monthly", r"payment schedule.*monthly"]),
        },
        ClauseRule {
            flag: ClauseFlag::RolloverOrRenewal,
            patterns: compile_all(&[
                r"rollover",
                r"renew",
                r"renewal",
                r"extend",
                r"automatically renew",
            ]),
        },
        ClauseRule {
            flag: ClauseFlag::BalloonPayment,
            patterns: compile_all(&[r"balloon payment", r"balloon"]),
        },
        ClauseRule {
            flag: ClauseFlag::WageAssignment,
            patterns: compile_all(&[r"wage assignment", r"paycheck.*assignment"]),
        },
        ClauseRule {
            flag: ClauseFlag::Arbitration,
            patterns: compile_all(&[r"arbitration", r"binding arbitration"]),
        },
        ClauseRule {
            flag: ClauseFlag::ClassActionWaiver,
            patterns: compile_all(&[
                r"class action waiver",
                r"waive.*class action",
                r"no class action",
            ]),
        },
        ClauseRule {
            flag: ClauseFlag::JuryWaiver,
            patterns: compile_all(&[r"jury.*waiver", r"waive.*jury", r"no jury trial"]),
        },
        ClauseRule {
            flag: ClauseFlag::ConfessionOfJudgment,
            patterns: compile_all(&[r"confession of judgment", r"confess.*judgment"]),
        },
        ClauseRule {
            flag: ClauseFlag::EmployerContact,
            patterns: compile_all(&[r"contact.*employer", r"employer.*collection"]),
        },
        ClauseRule {
            flag: ClauseFlag::ClearDisclosure,
            patterns: compile_all(&[
                r"APR.*disclosed",
                r"fee schedule.*included",
                r"clearly.*disclosed",
            ]),
        },
        ClauseRule {
            flag: ClauseFlag::TransparencyLanguage,
            patterns: compile_all(&[
                r"transparency",
                r"disclosure",
                r"right to sue",
                r"may revoke",
                r"can cancel",
            ]),
        },
        ClauseRule {
            flag: ClauseFlag::FeeAmbiguity,
            patterns: compile_all(&[
                r"fees may apply",
                r"may change without notice",
                r"see external schedule",
                r"additional fees",
            ]),
        },
    ]
});

/// Auto-debit trigger: an authorization verb within 50 characters of a
/// debit verb.
pub static AUTO_DEBIT_TRIGGER: Lazy<Regex> =
    Lazy::new(|| compile(r"(authorize|permission|grant|allow).{0,50}(debit|withdraw|ACH|bank account)"));

/// Optional/enrollment/opt-out vocabulary that suppresses the auto-debit
/// flag anywhere in the document.
pub static AUTO_DEBIT_EXCLUSIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"optional",
        r"enrollment",
        r"may enroll",
        r"can enroll",
        r"elect to",
        r"may not",
        r"no continuous",
        r"no blanket",
        r"only.*scheduled",
        r"may be cancelled",
        r"may revoke",
        r"can opt out",
    ])
});

/// Repeated-withdrawal phrasings that trigger the continuous-debit flag.
pub static CONTINUOUS_DEBIT_TRIGGERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"repeatedly debit",
        r"continuous.*authorization",
        r"debit.*repeatedly",
        r"until paid",
        r"multiple.*withdrawals",
        r"at any time",
    ])
});

/// Negation phrases that shield a continuous-debit trigger when found within
/// the +/-150 character context window around the match.
pub static CONTINUOUS_DEBIT_NEGATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"no continuous",
        r"no blanket",
        r"does not authorize",
        r"not authorize",
        r"not authorized",
        r"may not initiate",
        r"except for scheduled",
        r"only scheduled",
        r"optional autopay",
        r"opt in",
        r"can cancel",
        r"can opt out",
        r"may revoke",
    ])
});

pub static MONEY_RE: Lazy<Regex> = Lazy::new(|| compile(r"\$[0-9,]+"));
pub static PERCENT_RE: Lazy<Regex> = Lazy::new(|| compile(r"[0-9]+\.?[0-9]*%"));
