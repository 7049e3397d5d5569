//! Text (terminal) reporter with colors and formatting

use crate::models::{DetectionResult, Label};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Indicators listed before truncating
const MAX_INDICATORS: usize = 8;

fn label_color(label: Label) -> &'static str {
    match label {
        Label::Ai => "\x1b[35m",    // Magenta
        Label::Human => "\x1b[32m", // Green
    }
}

/// Color a 0-100 score by how strongly it points at AI
fn format_score(score: f64) -> String {
    let color = if score >= 60.0 {
        "\x1b[35m"
    } else if score > 40.0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    format!("{color}{score:5.1}{RESET}")
}

fn bar(score: f64) -> String {
    let filled = (score / 5.0).round().clamp(0.0, 20.0) as usize;
    format!("{}{DIM}{}{RESET}", "█".repeat(filled), "░".repeat(20 - filled))
}

/// Render result as formatted terminal output
pub fn render(result: &DetectionResult) -> Result<String> {
    let mut out = String::new();
    let label_c = label_color(result.label);
    let verdict = match result.label {
        Label::Ai => "AI-GENERATED",
        Label::Human => "HUMAN-WRITTEN",
    };

    out.push_str(&format!("\n{BOLD}aicodechecker{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Verdict: {label_c}{BOLD}{verdict}{RESET}  Score: {BOLD}{:.1}/100{RESET}  Confidence: {BOLD}{:.0}%{RESET}\n",
        result.score,
        result.confidence * 100.0
    ));
    out.push_str(&format!("Language: {}", result.language));
    if let Some(generator) = &result.likely_generator {
        out.push_str(&format!("  Resembles: {BOLD}{generator}{RESET}"));
    }
    out.push_str("\n\n");

    out.push_str(&format!("{BOLD}METHODS{RESET}\n"));
    if result.methods.is_empty() {
        out.push_str(&format!("  {DIM}none available{RESET}\n"));
    }
    for m in &result.methods {
        out.push_str(&format!(
            "  {:<10} {} {}  {}{}{RESET}\n",
            m.method.as_str(),
            format_score(m.score),
            bar(m.score),
            label_color(m.label),
            m.label
        ));
    }
    out.push('\n');

    if !result.indicators.is_empty() {
        out.push_str(&format!(
            "{BOLD}INDICATORS{RESET} ({} total)\n",
            result.indicators.len()
        ));
        for indicator in result.indicators.iter().take(MAX_INDICATORS) {
            out.push_str(&format!("  • {indicator}\n"));
        }
        if result.indicators.len() > MAX_INDICATORS {
            out.push_str(&format!(
                "  {DIM}... and {} more (use --format json for all){RESET}\n",
                result.indicators.len() - MAX_INDICATORS
            ));
        }
        out.push('\n');
    }

    let m = &result.metrics;
    out.push_str(&format!("{BOLD}METRICS{RESET}\n"));
    out.push_str(&format!(
        "  Lines: {}  Functions: {}  Classes: {}  Imports: {}  Nesting: {}  Complexity: {}\n",
        m.total_lines,
        m.function_count,
        m.class_count,
        m.import_count,
        m.max_nesting_depth,
        m.cyclomatic_complexity
    ));
    out.push_str(&format!(
        "  Comments: {:.0}%  Docs: {:.0}%  Naming consistency: {:.0}%  Duplicates: {:.0}%  Indent: {}\n\n",
        m.comment_ratio * 100.0,
        m.doc_coverage * 100.0,
        m.naming_consistency * 100.0,
        m.duplicate_line_ratio * 100.0,
        m.indent_width
    ));

    out.push_str(&format!("{DIM}{}{RESET}\n", result.explanation));
    Ok(out)
}
