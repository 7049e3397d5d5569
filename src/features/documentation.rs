//! Documentation coverage of functions and classes

use super::source::{Placement, SourceLine};
use super::structure::Definition;
use super::{Context, Feature, FeatureVector};
use crate::models::Language;

/// Languages whose doc comments carry a dedicated marker (`/**`, `///`).
/// Elsewhere any comment block directly above a definition counts.
fn needs_doc_marker(language: Language) -> bool {
    matches!(
        language,
        Language::Java
            | Language::JavaScript
            | Language::Php
            | Language::CSharp
            | Language::Kotlin
            | Language::Scala
            | Language::Swift
            | Language::Rust
    )
}

fn is_full_comment(line: &SourceLine<'_>) -> bool {
    !line.has_code()
        && line
            .comment
            .as_ref()
            .is_some_and(|c| c.placement == Placement::FullLine)
}

fn next_non_blank(ctx: &Context<'_>, from: usize) -> Option<usize> {
    (from..ctx.view.lines.len()).find(|&i| !ctx.view.lines[i].is_blank())
}

/// Docstring directly after the definition header (Python style)
fn docstring_after(ctx: &Context<'_>, def: &Definition) -> Option<usize> {
    let lines = &ctx.view.lines;
    let header_end = (def.line..lines.len())
        .take_while(|&i| lines[i].has_code() || i == def.line)
        .find(|&i| lines[i].code.trim_end().ends_with(':'))
        .unwrap_or(def.line);
    let first = next_non_blank(ctx, header_end + 1)?;
    ctx.view
        .docstrings
        .iter()
        .find(|d| d.start == first)
        .map(|d| d.len)
}

/// Comment lines directly after the definition line (MATLAB help text)
fn comments_after(ctx: &Context<'_>, def: &Definition) -> Option<usize> {
    let lines = &ctx.view.lines;
    let first = next_non_blank(ctx, def.line + 1)?;
    let len: usize = lines[first..]
        .iter()
        .take_while(|l| is_full_comment(l))
        .filter_map(|l| l.comment.as_ref())
        .map(|c| c.len)
        .sum();
    (is_full_comment(&lines[first])).then_some(len)
}

/// Comment block directly above the definition, skipping decorators
fn comments_before(ctx: &Context<'_>, def: &Definition, need_marker: bool) -> Option<usize> {
    let lines = &ctx.view.lines;
    let mut i = def.line;
    while i > 0 {
        let code = lines[i - 1].code.trim_start();
        if lines[i - 1].has_code() && (code.starts_with('@') || code.starts_with("#[")) {
            i -= 1;
        } else {
            break;
        }
    }

    let mut total = 0usize;
    let mut found = false;
    let mut marked = false;
    while i > 0 && is_full_comment(&lines[i - 1]) {
        if let Some(c) = lines[i - 1].comment.as_ref() {
            total += c.len;
            marked |= c.is_doc;
        }
        found = true;
        i -= 1;
    }
    (found && (marked || !need_marker)).then_some(total)
}

fn doc_length(ctx: &Context<'_>, def: &Definition) -> Option<usize> {
    let language = ctx.view.language;
    match language {
        Language::Python => docstring_after(ctx, def),
        Language::Matlab => comments_after(ctx, def),
        Language::Unknown => {
            docstring_after(ctx, def).or_else(|| comments_before(ctx, def, false))
        }
        _ => comments_before(ctx, def, needs_doc_marker(language)),
    }
}

pub(crate) fn extract(ctx: &Context<'_>, defs: &[Definition], out: &mut FeatureVector) {
    if defs.is_empty() {
        return;
    }
    let docs: Vec<usize> = defs.iter().filter_map(|d| doc_length(ctx, d)).collect();
    out.set(Feature::DocCoverage, docs.len() as f64 / defs.len() as f64);
    if !docs.is_empty() {
        out.set(
            Feature::AvgDocLength,
            docs.iter().sum::<usize>() as f64 / docs.len() as f64,
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::features::{extract, Feature};
    use crate::models::Language;

    #[test]
    fn test_python_docstrings() {
        let code = "def a():\n    \"\"\"Doc.\"\"\"\n    return 1\n\ndef b(x,\n      y):\n\n    \"\"\"Other doc.\"\"\"\n    return 2\n\ndef c():\n    return 3\n";
        let fv = extract(code, Language::Python);
        assert!((fv.get(Feature::DocCoverage) - 2.0 / 3.0).abs() < 1e-9);
        // "Doc." and "Other doc."
        assert_eq!(fv.get(Feature::AvgDocLength), 7.0);
    }

    #[test]
    fn test_rust_doc_comments_need_marker() {
        let code = "/// Adds one.\nfn inc(x: i32) -> i32 {\n    x + 1\n}\n\n// plain note\nfn dec(x: i32) -> i32 {\n    x - 1\n}\n";
        let fv = extract(code, Language::Rust);
        assert_eq!(fv.get(Feature::DocCoverage), 0.5);
    }

    #[test]
    fn test_javadoc_with_annotation() {
        let code = "class A {\n    /**\n     * Returns one.\n     */\n    @Override\n    public int one() {\n        return 1;\n    }\n}\n";
        let fv = extract(code, Language::Java);
        // class undocumented, method documented
        assert_eq!(fv.get(Feature::DocCoverage), 0.5);
    }

    #[test]
    fn test_go_plain_comments_count() {
        let code = "package main\n\n// Add returns the sum.\nfunc Add(a, b int) int {\n\treturn a + b\n}\n";
        let fv = extract(code, Language::Go);
        assert_eq!(fv.get(Feature::DocCoverage), 1.0);
    }

    #[test]
    fn test_no_definitions_is_neutral() {
        let fv = extract("x = 1\n", Language::Python);
        assert_eq!(fv.get(Feature::DocCoverage), 0.0);
    }
}
