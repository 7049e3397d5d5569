//! Repetition: duplicated lines, repeated calls, reassigned variables

use super::tokens::TokenKind;
use super::{Context, Feature, FeatureVector};
use rustc_hash::FxHashSet;

/// Lines shorter than this (or with fewer tokens) are too generic to count
const MIN_LINE_CHARS: usize = 6;
const MIN_LINE_TOKENS: usize = 3;

const ASSIGN_OPS: &[&str] = &["=", "+=", "-=", "*=", "/=", ":=", "<-"];

/// (total, distinct) -> share of repeats
fn repeat_ratio(total: usize, distinct: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (total - distinct) as f64 / total as f64
    }
}

pub(crate) fn extract(ctx: &Context<'_>, out: &mut FeatureVector) {
    let mut candidates = 0usize;
    let mut unique_lines: FxHashSet<&str> = FxHashSet::default();
    for (i, line) in ctx.view.code_lines() {
        let text = line.raw.trim();
        if text.chars().count() < MIN_LINE_CHARS || ctx.tokens[i].len() < MIN_LINE_TOKENS {
            continue;
        }
        candidates += 1;
        unique_lines.insert(text);
    }
    out.set(
        Feature::DuplicateLineRatio,
        repeat_ratio(candidates, unique_lines.len()),
    );

    let mut calls = 0usize;
    let mut callees: FxHashSet<&str> = FxHashSet::default();
    let mut assignments = 0usize;
    let mut targets: FxHashSet<&str> = FxHashSet::default();
    for tokens in &ctx.tokens {
        for (i, pair) in tokens.windows(2).enumerate() {
            let (name, next) = (&pair[0], &pair[1]);
            if name.kind != TokenKind::Ident {
                continue;
            }
            let declared = i > 0
                && matches!(
                    tokens[i - 1].text,
                    "def" | "fn" | "func" | "fun" | "function"
                );
            if next.is_op("(") {
                if declared {
                    continue;
                }
                calls += 1;
                callees.insert(name.text);
            } else if next.kind == TokenKind::Op && ASSIGN_OPS.contains(&next.text) {
                assignments += 1;
                targets.insert(name.text);
            }
        }
    }
    out.set(Feature::RepeatedCallRatio, repeat_ratio(calls, callees.len()));
    out.set(
        Feature::VariableReuseRatio,
        repeat_ratio(assignments, targets.len()),
    );
}

#[cfg(test)]
mod tests {
    use crate::features::{extract, Feature};
    use crate::models::Language;

    #[test]
    fn test_duplicate_lines() {
        let code = "total = total + 1\ntotal = total + 1\ncount = count + 1\ntotal = total + 1\n";
        let fv = extract(code, Language::Python);
        assert_eq!(fv.get(Feature::DuplicateLineRatio), 0.5);
    }

    #[test]
    fn test_trivial_lines_not_duplicates() {
        let code = "if a {\n}\nif b {\n}\n";
        let fv = extract(code, Language::Rust);
        assert_eq!(fv.get(Feature::DuplicateLineRatio), 0.0);
    }

    #[test]
    fn test_repeated_calls_and_reuse() {
        let code = "def log(v):\n    pass\nlog(a)\nlog(b)\nsave(a)\nx = 1\nx = 2\ny = 3\nx += 1\n";
        let fv = extract(code, Language::Python);
        assert!((fv.get(Feature::RepeatedCallRatio) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(fv.get(Feature::VariableReuseRatio), 0.5);
    }
}
