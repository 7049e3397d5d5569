//! Naming conventions

use super::tokens::TokenKind;
use super::{Context, Feature, FeatureVector};
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NamingStyle {
    Camel,
    Snake,
    Screaming,
}

/// Share of classified identifiers a style needs before it counts as "in use"
const STYLE_PRESENCE: f64 = 0.1;

/// Classify an identifier. Single-word names (`count`, `Parser`, `x`) carry
/// no style signal and return `None`.
pub(crate) fn classify(ident: &str) -> Option<NamingStyle> {
    let name = ident.trim_start_matches('$').trim_matches('_');
    let mut chars = name.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let has_underscore = name.contains('_');
    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
    let well_formed = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.contains("__");

    if !well_formed {
        return None;
    }
    if !has_lower && has_upper && (has_underscore || name.len() > 1) {
        return (name.chars().filter(|c| c.is_ascii_alphabetic()).count() >= 2)
            .then_some(NamingStyle::Screaming);
    }
    if has_underscore && has_lower && !has_upper {
        return Some(NamingStyle::Snake);
    }
    if !has_underscore && first.is_ascii_lowercase() && has_upper {
        return Some(NamingStyle::Camel);
    }
    None
}

pub(crate) fn extract(ctx: &Context<'_>, out: &mut FeatureVector) {
    let identifiers: FxHashSet<&str> = ctx
        .all_tokens()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text)
        .collect();
    if identifiers.is_empty() {
        return;
    }

    let (mut camel, mut snake, mut screaming) = (0usize, 0usize, 0usize);
    for ident in &identifiers {
        match classify(ident) {
            Some(NamingStyle::Camel) => camel += 1,
            Some(NamingStyle::Snake) => snake += 1,
            Some(NamingStyle::Screaming) => screaming += 1,
            None => {}
        }
    }

    let total = identifiers.len() as f64;
    out.set(Feature::CamelCaseRatio, camel as f64 / total);
    out.set(Feature::SnakeCaseRatio, snake as f64 / total);
    out.set(Feature::ScreamingCaseRatio, screaming as f64 / total);

    let classified = camel + snake + screaming;
    if classified == 0 {
        return;
    }
    let floor = (classified as f64 * STYLE_PRESENCE).ceil().max(1.0) as usize;
    let distinct = [camel, snake, screaming]
        .iter()
        .filter(|&&n| n >= floor)
        .count()
        .max(1);
    out.set(
        Feature::NamingConsistency,
        1.0 - (distinct as f64 - 1.0) / distinct as f64,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract;
    use crate::models::Language;

    #[test]
    fn test_classify() {
        assert_eq!(classify("userName"), Some(NamingStyle::Camel));
        assert_eq!(classify("user_name"), Some(NamingStyle::Snake));
        assert_eq!(classify("MAX_SIZE"), Some(NamingStyle::Screaming));
        assert_eq!(classify("TIMEOUT"), Some(NamingStyle::Screaming));
        assert_eq!(classify("$total_price"), Some(NamingStyle::Snake));
        assert_eq!(classify("__init__"), None);
        assert_eq!(classify("count"), None);
        assert_eq!(classify("Parser"), None);
        assert_eq!(classify("HttpClient"), None);
        assert_eq!(classify("x"), None);
    }

    #[test]
    fn test_consistent_snake_case() {
        let code = "total_price = unit_price * item_count\nfinal_total = total_price\n";
        let fv = extract(code, Language::Python);
        assert_eq!(fv.get(Feature::NamingConsistency), 1.0);
        assert_eq!(fv.get(Feature::SnakeCaseRatio), 1.0);
        assert_eq!(fv.get(Feature::CamelCaseRatio), 0.0);
    }

    #[test]
    fn test_mixed_styles_lower_consistency() {
        let code = "totalPrice = unit_price * ITEM_COUNT\nfinalTotal = other_value\n";
        let fv = extract(code, Language::Python);
        let expected = 1.0 - 2.0 / 3.0;
        assert!((fv.get(Feature::NamingConsistency) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_styled_identifiers_is_neutral() {
        let fv = extract("x = y + z\n", Language::Python);
        assert_eq!(fv.get(Feature::NamingConsistency), 0.5);
    }
}
