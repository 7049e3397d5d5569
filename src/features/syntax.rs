//! Syntax sanity check
//!
//! Not a parser. Reports the lexical problems the scanner found plus a
//! language mismatch warning, which is enough to tell "odd but plausible" from
//! "this will not compile".

use super::language;
use super::source::SourceView;
use crate::models::Language;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SyntaxReport {
    pub language: Language,
    /// True when the language was sniffed rather than declared
    pub sniffed: bool,
    pub ok: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspected_language: Option<Language>,
}

/// Check `code`, sniffing the language when `declared` is `None`
pub fn check(code: &str, declared: Option<Language>) -> SyntaxReport {
    let (language, sniffed) = match declared {
        Some(lang) => (lang, false),
        None => (language::sniff(code), true),
    };
    let view = SourceView::scan(code, language);
    let suspected_language = if sniffed {
        None
    } else {
        language::mismatch(code, language)
    };

    SyntaxReport {
        language,
        sniffed,
        ok: view.issues.is_empty(),
        errors: view.issues,
        suspected_language,
    }
}
