//! Static generator fingerprints
//!
//! Hand-collected textual habits of specific generators, plus a few general
//! AI and human tells. They complement the corpus neighbours: each hit becomes
//! a `PatternMatch` that votes alongside them.

use crate::models::{OriginClass, PatternMatch};
use regex::Regex;
use std::sync::OnceLock;

/// Vote strength of a single fingerprint hit
const FINGERPRINT_STRENGTH: f64 = 0.5;

enum Origin {
    Generator(&'static str),
    Ai,
    Human,
}

struct Fingerprint {
    origin: Origin,
    name: &'static str,
    pattern: &'static str,
}

const FINGERPRINTS: &[Fingerprint] = &[
    Fingerprint {
        origin: Origin::Generator("codestral"),
        name: "typing import",
        pattern: r"(?m)^\s*from\s+typing\s+import\s+",
    },
    Fingerprint {
        origin: Origin::Generator("codestral"),
        name: "annotated return type",
        pattern: r"\bdef\s+\w+\s*\([^)]*\)\s*->\s*\w+:",
    },
    Fingerprint {
        origin: Origin::Generator("gemini"),
        name: "collections import",
        pattern: r"(?m)^\s*(import\s+collections\b|from\s+collections\s+import\s+defaultdict)",
    },
    Fingerprint {
        origin: Origin::Generator("gemini"),
        name: "Args section docstring",
        pattern: r#"\bdef\s+\w+\s*\([^)]*\)[^:\n]*:\s*\n\s*"""\s*\w[^\n]*\n(\s*\n)?\s*Args:"#,
    },
    Fingerprint {
        origin: Origin::Generator("llama"),
        name: "capitalized docstring opener",
        pattern: r#"\bdef\s+\w+\s*\([^)]*\):\s*\n\s*"""\s*[A-Z]"#,
    },
    Fingerprint {
        origin: Origin::Generator("llama"),
        name: "capitalized trailing return comment",
        pattern: r"\breturn\s+\w+\s*#\s*[A-Z]",
    },
    Fingerprint {
        origin: Origin::Ai,
        name: "Returns section docstring",
        pattern: r"(?m)^\s*(Returns?|Raises?):\s*$",
    },
    Fingerprint {
        origin: Origin::Ai,
        name: "defensive ValueError",
        pattern: r"\braise\s+ValueError\(",
    },
    Fingerprint {
        origin: Origin::Human,
        name: "informal comment",
        pattern: r"(?i)(#|//)\s*(hack|quick|dirty|ugly|stupid|weird|wtf)\b",
    },
    Fingerprint {
        origin: Origin::Human,
        name: "TODO/FIXME marker",
        pattern: r"(#|//)\s*(TODO|FIXME|XXX)\b",
    },
    Fingerprint {
        origin: Origin::Human,
        name: "debug print",
        pattern: r"(?i)\bprint\s*\([^)]*debug[^)]*\)",
    },
    Fingerprint {
        origin: Origin::Human,
        name: "throwaway name",
        pattern: r"\b(my_|temp_|debug_|foo|bar|asdf)\w*\b",
    },
];

static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();

fn compiled() -> &'static [Regex] {
    COMPILED.get_or_init(|| {
        FINGERPRINTS
            .iter()
            .map(|f| Regex::new(f.pattern).expect("valid regex"))
            .collect()
    })
}

/// Every fingerprint that occurs in `code`, at most once each
pub fn scan(code: &str) -> Vec<PatternMatch> {
    FINGERPRINTS
        .iter()
        .zip(compiled())
        .filter(|(_, re)| re.is_match(code))
        .map(|(fp, _)| {
            let class = match fp.origin {
                Origin::Generator(name) => OriginClass::Generator(name.to_string()),
                Origin::Ai => OriginClass::generic_ai(),
                Origin::Human => OriginClass::Human,
            };
            PatternMatch {
                indicator: format!("fingerprint: {} ({class})", fp.name),
                class,
                strength: FINGERPRINT_STRENGTH,
            }
        })
        .collect()
}
