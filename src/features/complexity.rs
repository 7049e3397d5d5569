//! Approximate complexity

use super::structure::{DefKind, Definition};
use super::tokens::{Token, TokenKind};
use super::{Context, Feature, FeatureVector};

fn is_branch(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Keyword => matches!(
            token.text,
            "if" | "elif"
                | "elsif"
                | "unless"
                | "until"
                | "for"
                | "foreach"
                | "while"
                | "case"
                | "when"
                | "catch"
                | "except"
                | "rescue"
                | "guard"
                | "and"
                | "or"
        ),
        TokenKind::Op => matches!(token.text, "&&" | "||"),
        _ => false,
    }
}

pub(crate) fn extract(ctx: &Context<'_>, defs: &[Definition], out: &mut FeatureVector) {
    let branches = ctx.all_tokens().filter(|t| is_branch(t)).count();
    let functions = defs.iter().filter(|d| d.kind == DefKind::Function).count();
    out.set(
        Feature::CyclomaticComplexity,
        (branches + functions.max(1)) as f64,
    );
    out.set(Feature::LineCount, ctx.view.lines.len() as f64);
    out.set(Feature::TokenCount, ctx.all_tokens().count() as f64);
}
