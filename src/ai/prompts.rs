//! Prompt templates and reply parsing for the external classifier

use crate::models::{Label, Language};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Prompts sent to the external model
pub struct PromptTemplate;

impl PromptTemplate {
    pub fn system_prompt() -> &'static str {
        "You are a precise classifier for code origin (AI vs HUMAN).\n\
         Return only a single JSON object with keys: label, score, explanation.\n\
         - label: one of AI, HUMAN, UNCERTAIN\n\
         - score: float 0..100 = probability code is AI-generated\n\
         - explanation: one short sentence\n\
         Be conservative; if unsure use UNCERTAIN with score near 50."
    }

    pub fn user_prompt(code: &str, language: Language) -> String {
        let hint = match language {
            Language::Unknown => "auto",
            lang => lang.as_str(),
        };
        format!("Language: {hint}\n\nCODE:\n````\n{code}\n````\n\nReply with only the JSON object.")
    }
}

/// The external model's opinion
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalVerdict {
    pub label: Label,
    pub score: f64,
    pub explanation: String,
    /// The reply was not JSON and was mapped by keywords
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    score: Option<serde_json::Value>,
    #[serde(default)]
    explanation: Option<String>,
}

static JSON_BLOCK: OnceLock<Regex> = OnceLock::new();

fn json_block() -> &'static Regex {
    JSON_BLOCK.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"))
}

static AI_WORD: OnceLock<Regex> = OnceLock::new();
static HUMAN_WORD: OnceLock<Regex> = OnceLock::new();

/// Whole words only: "explain" and "certain" must not read as "ai"
fn ai_word() -> &'static Regex {
    AI_WORD.get_or_init(|| {
        Regex::new(r"(?i)\b(ai|llm)\b|\bmachine[- ]generated\b").expect("valid regex")
    })
}

fn human_word() -> &'static Regex {
    HUMAN_WORD.get_or_init(|| Regex::new(r"(?i)\bhumans?\b").expect("valid regex"))
}

fn score_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn parse_json(reply: &str) -> Option<ExternalVerdict> {
    let block = json_block().find(reply)?;
    let raw: RawVerdict = serde_json::from_str(block.as_str()).ok()?;

    let score = raw
        .score
        .as_ref()
        .and_then(score_value)
        .filter(|s| s.is_finite())
        .unwrap_or(50.0)
        .clamp(0.0, 100.0);
    let label = match raw.label.as_deref().map(|l| l.trim().to_uppercase()) {
        Some(l) if l == "AI" => Label::Ai,
        Some(l) if l == "HUMAN" => Label::Human,
        _ => Label::from_score(score),
    };

    Some(ExternalVerdict {
        label,
        score,
        explanation: raw
            .explanation
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "No explanation provided.".to_string()),
        fallback: false,
    })
}

/// Parse a model reply. A JSON object wins; anything else is mapped by
/// which of the words "ai" / "human" it mentions.
pub fn parse_verdict(reply: &str) -> ExternalVerdict {
    if let Some(verdict) = parse_json(reply) {
        return verdict;
    }

    let says_ai = ai_word().is_match(reply);
    let says_human = human_word().is_match(reply);
    let score = match (says_ai, says_human) {
        (true, false) => 90.0,
        (false, true) => 20.0,
        _ => 50.0,
    };
    ExternalVerdict {
        label: Label::from_score(score),
        score,
        explanation: "Parsed non-JSON output; applied fallback mapping.".to_string(),
        fallback: true,
    }
}
