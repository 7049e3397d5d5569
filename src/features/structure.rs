//! Structure: definitions, imports and nesting
//!
//! Definitions are found line by line with per-language patterns over the
//! comment-free code text; a line holds at most one definition.

use super::style;
use super::{Context, Feature, FeatureVector};
use crate::models::Language;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefKind {
    Function,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Definition {
    /// 0-based line index
    pub line: usize,
    pub kind: DefKind,
}

struct Patterns {
    function: Regex,
    class: Regex,
    import: Option<Regex>,
}

/// First words that make a C-family "signature" line a statement instead
const STATEMENT_WORDS: &[&str] = &[
    "return", "else", "if", "while", "for", "switch", "case", "new", "throw", "delete", "goto",
    "using", "namespace", "sizeof", "catch", "do", "await", "yield",
];

const C_FAMILY_FN: &str = r"^\s*(?:[\w<>\[\],.*&:~?]+\s+)+\**&?[\w:~]+\s*\([^;{}]*\)?\s*(?:const\s*)?(?:noexcept\s*)?(?:throws\s+[\w.,\s]+)?\{?\s*$";
const BRACED_CLASS: &str =
    r"\b(?:class|interface|enum|struct|trait|object|record|protocol)\s+[A-Za-z_]\w*";

fn compile(function: &str, class: &str, import: Option<&str>) -> Patterns {
    Patterns {
        function: Regex::new(function).expect("valid regex"),
        class: Regex::new(class).expect("valid regex"),
        import: import.map(|p| Regex::new(p).expect("valid regex")),
    }
}

/// Pattern table indexed by `Language` discriminant (allowlist order, then `Unknown`)
fn patterns(language: Language) -> &'static Patterns {
    static CACHE: OnceLock<Vec<Patterns>> = OnceLock::new();
    let table = CACHE.get_or_init(|| {
        Language::SUPPORTED
            .into_iter()
            .chain([Language::Unknown])
            .map(build)
            .collect()
    });
    &table[language as usize]
}

fn build(language: Language) -> Patterns {
    match language {
        Language::Python => compile(
            r"^\s*(?:async\s+)?def\s+\w+",
            r"^\s*class\s+\w+",
            Some(r"^\s*(?:import\s+\w|from\s+[\w.]+\s+import\b)"),
        ),
        Language::JavaScript => compile(
            r"\bfunction\b|\b(?:const|let|var)\s+[\w$]+\s*=\s*(?:async\s+)?(?:\([^)]*\)|[\w$]+)\s*=>|^\s*(?:(?:async|static|get|set)\s+)*[A-Za-z_$][\w$]*\s*\([^)]*\)\s*\{",
            BRACED_CLASS,
            Some(r"^\s*import\b|\brequire\s*\("),
        ),
        Language::Java => compile(C_FAMILY_FN, BRACED_CLASS, Some(r"^\s*import\s")),
        Language::C => compile(
            C_FAMILY_FN,
            r"\b(?:struct|enum|union)\s+\w*\s*\{",
            Some(r"^\s*#\s*include\b"),
        ),
        Language::Cpp => compile(C_FAMILY_FN, BRACED_CLASS, Some(r"^\s*#\s*include\b")),
        Language::CSharp => compile(
            C_FAMILY_FN,
            BRACED_CLASS,
            Some(r"^\s*using\s+(?:static\s+)?[\w.]+(?:\s*=\s*[\w.]+)?\s*;"),
        ),
        Language::Php => compile(
            r"\bfunction\s+&?\w+\s*\(",
            BRACED_CLASS,
            Some(r"^\s*(?:use\s+[\w\\]+|(?:require|include)(?:_once)?\b)"),
        ),
        Language::Ruby => compile(
            r"^\s*def\s+[\w.?!]+",
            r"^\s*(?:class|module)\s+[A-Z]\w*",
            Some(r"^\s*(?:require|require_relative|load)\b"),
        ),
        // Go imports are counted separately (block syntax)
        Language::Go => compile(r"^\s*func\b", r"\btype\s+\w+\s+(?:struct|interface)\b", None),
        Language::Rust => compile(
            r"\bfn\s+\w+",
            r"\b(?:struct|enum|trait|union)\s+[A-Za-z_]\w*",
            Some(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s|^\s*extern\s+crate\b"),
        ),
        Language::Swift => compile(r"\bfunc\s+\w+", BRACED_CLASS, Some(r"^\s*import\s")),
        Language::Kotlin => compile(
            r"\bfun\s+(?:<[^>]*>\s*)?[\w.]+\s*\(",
            BRACED_CLASS,
            Some(r"^\s*import\s"),
        ),
        Language::Scala => compile(r"\bdef\s+\w+", BRACED_CLASS, Some(r"^\s*import\s")),
        Language::R => compile(
            r"\bfunction\s*\(",
            r"\b(?:setRefClass|R6Class|setClass)\s*\(",
            Some(r"\b(?:library|require)\s*\("),
        ),
        Language::Matlab => compile(r"^\s*function\b", r"^\s*classdef\b", Some(r"^\s*import\s")),
        Language::Unknown => compile(
            r"\b(?:def|function|fn|func|fun)\s+\w+",
            r"\b(?:class|struct|interface|trait)\s+[A-Za-z_]\w*",
            Some(r"^\s*(?:import\s|from\s+[\w.]+\s+import\b|#\s*include\b|use\s|using\s+[\w.]+\s*;|require\b)"),
        ),
    }
}

fn is_c_family(language: Language) -> bool {
    matches!(
        language,
        Language::Java | Language::C | Language::Cpp | Language::CSharp
    )
}

/// Find function and class definitions
pub(crate) fn definitions(ctx: &Context<'_>) -> Vec<Definition> {
    let language = ctx.view.language;
    let p = patterns(language);
    let mut defs = Vec::new();

    for (line, src) in ctx.view.code_lines() {
        let code = src.code.as_str();
        if p.class.is_match(code) {
            defs.push(Definition {
                line,
                kind: DefKind::Class,
            });
            continue;
        }
        if !p.function.is_match(code) {
            continue;
        }
        if is_c_family(language) || language == Language::JavaScript {
            let first = code.split_whitespace().next().unwrap_or("");
            let first = first.split('(').next().unwrap_or(first);
            if STATEMENT_WORDS.contains(&first) {
                continue;
            }
        }
        defs.push(Definition {
            line,
            kind: DefKind::Function,
        });
    }
    defs
}

fn count_imports(ctx: &Context<'_>) -> usize {
    if ctx.view.language == Language::Go {
        return count_go_imports(ctx);
    }
    let Some(re) = &patterns(ctx.view.language).import else {
        return 0;
    };
    ctx.view
        .code_lines()
        .filter(|(_, l)| re.is_match(&l.code))
        .count()
}

fn count_go_imports(ctx: &Context<'_>) -> usize {
    let mut count = 0;
    let mut in_block = false;
    for (_, line) in ctx.view.code_lines() {
        let code = line.code.trim();
        if in_block {
            if code.starts_with(')') {
                in_block = false;
            } else if code.ends_with("\"\"") {
                count += 1;
            }
        } else if let Some(rest) = code.strip_prefix("import") {
            let rest = rest.trim();
            if rest.starts_with('(') {
                in_block = true;
            } else if rest.ends_with("\"\"") {
                count += 1;
            }
        }
    }
    count
}

fn max_nesting(ctx: &Context<'_>) -> usize {
    let language = ctx.view.language;
    let braces = ctx.view.code_lines().any(|(_, l)| l.code.contains('{'));
    if language.uses_braces() || (language == Language::Unknown && braces) {
        let mut depth = 0usize;
        let mut max = 0usize;
        for (_, line) in ctx.view.code_lines() {
            for c in line.code.chars() {
                match c {
                    '{' => {
                        depth += 1;
                        max = max.max(depth);
                    }
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
        }
        return max;
    }

    let unit = style::indent_steps(ctx)
        .mode()
        .filter(|&w| w > 0)
        .unwrap_or(4);
    ctx.view
        .code_lines()
        .map(|(_, l)| l.indent.width / unit)
        .max()
        .unwrap_or(0)
}

pub(crate) fn extract(ctx: &Context<'_>, out: &mut FeatureVector) -> Vec<Definition> {
    let defs = definitions(ctx);
    let functions = defs.iter().filter(|d| d.kind == DefKind::Function).count();
    let classes = defs.len() - functions;
    out.set(Feature::FunctionCount, functions as f64);
    out.set(Feature::ClassCount, classes as f64);
    out.set(Feature::ImportCount, count_imports(ctx) as f64);
    out.set(Feature::MaxNestingDepth, max_nesting(ctx) as f64);
    defs
}
