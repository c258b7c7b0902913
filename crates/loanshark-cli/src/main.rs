use std::env;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use loanshark_core::{extract_features, AnalysisResult, Analyzer, FEATURE_NAMES};

const DEFAULT_MODEL_DIR: &str = "model/models";
const MIN_CONTRACT_CHARS: usize = 10;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        print_help();
        return Ok(());
    }

    match args[0].as_str() {
        "analyze" => run_analyze(&args[1..]),
        "features" => run_features(&args[1..]),
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        cmd => Err(format!("unknown command `{cmd}`")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format `{other}` (expected table|json)")),
        }
    }
}

fn run_analyze(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("analyze requires a contract file (or `-` for stdin)".to_string());
    }

    let input = args[0].clone();

    let mut format = OutputFormat::Table;
    let mut model_dir = PathBuf::from(DEFAULT_MODEL_DIR);
    let mut no_model_flag = false;
    let mut output_path = None::<PathBuf>;
    let mut fail_over = None::<u8>;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--format" => {
                i += 1;
                format = OutputFormat::parse(args.get(i).ok_or("--format requires a value")?)?;
            }
            "--model-dir" => {
                i += 1;
                model_dir = PathBuf::from(args.get(i).ok_or("--model-dir requires a value")?);
            }
            "--no-model" => no_model_flag = true,
            "--output" => {
                i += 1;
                output_path = Some(PathBuf::from(
                    args.get(i).ok_or("--output requires a value")?,
                ));
            }
            "--fail-over" => {
                i += 1;
                let raw = args.get(i).ok_or("--fail-over requires a value")?;
                fail_over = Some(
                    raw.parse::<u8>()
                        .map_err(|_| "invalid --fail-over value (expected 0-100)".to_string())?,
                );
            }
            other => return Err(format!("unknown option `{other}`")),
        }
        i += 1;
    }

    let text = read_contract(&input)?;
    check_contract_length(&text)?;

    let analyzer = if no_model_flag {
        Analyzer::new()
    } else {
        Analyzer::from_model_dir(&model_dir)
    };
    if !no_model_flag && !analyzer.has_model() {
        eprintln!(
            "warning: no model at {}, running rule-only analysis",
            model_dir.display()
        );
    }

    let result = analyzer.analyze(&text);

    let rendered = match format {
        OutputFormat::Table => render_table(&result),
        OutputFormat::Json => render_json(&result)?,
    };

    match output_path {
        Some(path) => fs::write(&path, rendered)
            .map_err(|err| format!("failed to write {}: {err}", path.display()))?,
        None => print!("{rendered}"),
    }

    if let Some(threshold) = fail_over {
        if result.score >= threshold {
            std::process::exit(2);
        }
    }

    Ok(())
}

fn run_features(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("features requires a contract file (or `-` for stdin)".to_string());
    }

    let mut format = OutputFormat::Table;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--format" => {
                i += 1;
                format = OutputFormat::parse(args.get(i).ok_or("--format requires a value")?)?;
            }
            other => return Err(format!("unknown option `{other}`")),
        }
        i += 1;
    }

    let text = read_contract(&args[0])?;
    check_contract_length(&text)?;
    let features = extract_features(&text);

    match format {
        OutputFormat::Table => {
            for name in FEATURE_NAMES {
                println!("{name:<28} {}", features.value(name));
            }
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = FEATURE_NAMES
                .iter()
                .map(|name| (name.to_string(), features.value(name).into()))
                .collect();
            let rendered = serde_json::to_string_pretty(&map)
                .map_err(|err| format!("failed to encode features: {err}"))?;
            println!("{rendered}");
        }
    }

    Ok(())
}

fn read_contract(input: &str) -> Result<String, String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|err| format!("failed to read stdin: {err}"))?;
        Ok(text)
    } else {
        fs::read_to_string(input).map_err(|err| format!("failed to read {input}: {err}"))
    }
}

fn check_contract_length(text: &str) -> Result<(), String> {
    if text.trim().chars().count() < MIN_CONTRACT_CHARS {
        return Err("contract text is too short (need at least 10 characters)".to_string());
    }
    Ok(())
}

fn render_table(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "LoanShark analysis: score {}/100, label {}, confidence {}",
        result.score,
        result.label.as_str(),
        result.confidence.as_str()
    );
    let _ = writeln!(
        out,
        "Rule score: {} | ML score: {}",
        result.debug.rule_score,
        result
            .debug
            .ml_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a (rule-only)".to_string())
    );

    let _ = writeln!(out, "\nReasons:");
    for reason in &result.reasons {
        let _ = writeln!(out, "  - {reason}");
    }

    if !result.highlights.is_empty() {
        let _ = writeln!(out, "\nFlagged clauses:");
        let _ = writeln!(out, "{:<16} Snippet", "Category");
        let _ = writeln!(out, "{}", "-".repeat(100));
        for highlight in &result.highlights {
            let _ = writeln!(out, "{:<16} {}", highlight.category.as_str(), highlight.text);
        }
    }

    out
}

fn render_json(result: &AnalysisResult) -> Result<String, String> {
    serde_json::to_string_pretty(result)
        .map(|mut rendered| {
            rendered.push('\n');
            rendered
        })
        .map_err(|err| format!("failed to encode result: {err}"))
}

fn print_help() {
    println!("LoanShark CLI\n");
    println!("Usage:");
    println!("  loanshark analyze <file|-> [--format table|json] [--model-dir DIR] [--no-model] [--output PATH] [--fail-over SCORE]");
    println!("  loanshark features <file|-> [--format table|json]");
}
