//! Feature extraction
//!
//! `extract` turns a code string into a fixed-schema `FeatureVector`. It never
//! fails: code that does not scan cleanly still yields a full vector, with the
//! parse-dependent features set to neutral values and the scanner's complaints
//! recorded in `degraded()`.
//!
//! Values are the unnormalized ground truth. Ratios are clamped to [0, 1];
//! counts are raw and normalized later by the scorers.

mod comments;
mod complexity;
mod documentation;
pub mod language;
mod naming;
mod repetition;
pub mod source;
mod structure;
mod style;
pub mod syntax;
pub mod tokens;

use crate::models::Language;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use source::SourceView;
use tokens::Token;

/// The seven feature categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Comments,
    Naming,
    Structure,
    Complexity,
    Style,
    Repetition,
    Documentation,
}

/// Named features, in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    // Comments
    CommentRatio,
    AvgCommentLength,
    InlineCommentRatio,
    CommentPlacementVariance,
    CommentStyleConsistency,
    // Naming
    CamelCaseRatio,
    SnakeCaseRatio,
    ScreamingCaseRatio,
    NamingConsistency,
    // Structure
    FunctionCount,
    ClassCount,
    MaxNestingDepth,
    ImportCount,
    // Complexity
    CyclomaticComplexity,
    LineCount,
    TokenCount,
    // Style
    IndentWidthMode,
    IndentVariance,
    IndentConsistency,
    TrailingWhitespaceRate,
    BlankLineRate,
    // Repetition
    DuplicateLineRatio,
    RepeatedCallRatio,
    VariableReuseRatio,
    // Documentation
    DocCoverage,
    AvgDocLength,
}

impl Feature {
    pub const COUNT: usize = 26;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::CommentRatio,
        Feature::AvgCommentLength,
        Feature::InlineCommentRatio,
        Feature::CommentPlacementVariance,
        Feature::CommentStyleConsistency,
        Feature::CamelCaseRatio,
        Feature::SnakeCaseRatio,
        Feature::ScreamingCaseRatio,
        Feature::NamingConsistency,
        Feature::FunctionCount,
        Feature::ClassCount,
        Feature::MaxNestingDepth,
        Feature::ImportCount,
        Feature::CyclomaticComplexity,
        Feature::LineCount,
        Feature::TokenCount,
        Feature::IndentWidthMode,
        Feature::IndentVariance,
        Feature::IndentConsistency,
        Feature::TrailingWhitespaceRate,
        Feature::BlankLineRate,
        Feature::DuplicateLineRatio,
        Feature::RepeatedCallRatio,
        Feature::VariableReuseRatio,
        Feature::DocCoverage,
        Feature::AvgDocLength,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Feature::CommentRatio => "comment_ratio",
            Feature::AvgCommentLength => "avg_comment_length",
            Feature::InlineCommentRatio => "inline_comment_ratio",
            Feature::CommentPlacementVariance => "comment_placement_variance",
            Feature::CommentStyleConsistency => "comment_style_consistency",
            Feature::CamelCaseRatio => "camel_case_ratio",
            Feature::SnakeCaseRatio => "snake_case_ratio",
            Feature::ScreamingCaseRatio => "screaming_case_ratio",
            Feature::NamingConsistency => "naming_consistency",
            Feature::FunctionCount => "function_count",
            Feature::ClassCount => "class_count",
            Feature::MaxNestingDepth => "max_nesting_depth",
            Feature::ImportCount => "import_count",
            Feature::CyclomaticComplexity => "cyclomatic_complexity",
            Feature::LineCount => "line_count",
            Feature::TokenCount => "token_count",
            Feature::IndentWidthMode => "indent_width_mode",
            Feature::IndentVariance => "indent_variance",
            Feature::IndentConsistency => "indent_consistency",
            Feature::TrailingWhitespaceRate => "trailing_whitespace_rate",
            Feature::BlankLineRate => "blank_line_rate",
            Feature::DuplicateLineRatio => "duplicate_line_ratio",
            Feature::RepeatedCallRatio => "repeated_call_ratio",
            Feature::VariableReuseRatio => "variable_reuse_ratio",
            Feature::DocCoverage => "doc_coverage",
            Feature::AvgDocLength => "avg_doc_length",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn category(self) -> Category {
        use Feature::*;
        match self {
            CommentRatio | AvgCommentLength | InlineCommentRatio | CommentPlacementVariance
            | CommentStyleConsistency => Category::Comments,
            CamelCaseRatio | SnakeCaseRatio | ScreamingCaseRatio | NamingConsistency => {
                Category::Naming
            }
            FunctionCount | ClassCount | MaxNestingDepth | ImportCount => Category::Structure,
            CyclomaticComplexity | LineCount | TokenCount => Category::Complexity,
            IndentWidthMode | IndentVariance | IndentConsistency | TrailingWhitespaceRate
            | BlankLineRate => Category::Style,
            DuplicateLineRatio | RepeatedCallRatio | VariableReuseRatio => Category::Repetition,
            DocCoverage | AvgDocLength => Category::Documentation,
        }
    }

    /// Ratios live in [0, 1]; everything else is a raw count or measure
    pub fn is_ratio(self) -> bool {
        use Feature::*;
        !matches!(
            self,
            AvgCommentLength
                | FunctionCount
                | ClassCount
                | MaxNestingDepth
                | ImportCount
                | CyclomaticComplexity
                | LineCount
                | TokenCount
                | IndentWidthMode
                | IndentVariance
                | AvgDocLength
        )
    }

    /// Value used when the feature cannot be measured for a sample
    pub fn neutral(self) -> f64 {
        match self {
            Feature::CommentStyleConsistency
            | Feature::NamingConsistency
            | Feature::IndentConsistency => 0.5,
            Feature::MaxNestingDepth => 3.0,
            Feature::CyclomaticComplexity => 1.0,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-schema feature values. Every feature is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; Feature::COUNT],
    degraded: Vec<String>,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl FeatureVector {
    /// Every feature at its neutral value
    pub fn neutral() -> Self {
        let mut values = [0.0; Feature::COUNT];
        for f in Feature::ALL {
            values[f.index()] = f.neutral();
        }
        Self {
            values,
            degraded: Vec::new(),
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Store a value. Non-finite values fall back to neutral, ratios are
    /// clamped to [0, 1] and measures to >= 0.
    pub fn set(&mut self, feature: Feature, value: f64) {
        let value = if !value.is_finite() {
            feature.neutral()
        } else if feature.is_ratio() {
            value.clamp(0.0, 1.0)
        } else {
            value.max(0.0)
        };
        self.values[feature.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Reasons extraction fell back to neutral values, empty when clean
    pub fn degraded(&self) -> &[String] {
        &self.degraded
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Feature::COUNT))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

/// Scanned source plus per-line tokens, shared by the category analyzers
pub(crate) struct Context<'v> {
    pub view: &'v SourceView<'v>,
    /// Tokens of each line's code text (empty for lines without code)
    pub tokens: Vec<Vec<Token<'v>>>,
}

impl<'v> Context<'v> {
    pub fn new(view: &'v SourceView<'v>) -> Self {
        let tokens = view
            .lines
            .iter()
            .map(|line| {
                if line.has_code() {
                    tokens::tokenize_line(&line.code)
                } else {
                    Vec::new()
                }
            })
            .collect();
        Self { view, tokens }
    }

    pub fn all_tokens(&self) -> impl Iterator<Item = &Token<'v>> {
        self.tokens.iter().flatten()
    }
}

/// Extract the feature vector for `code` written in `language`
pub fn extract(code: &str, language: Language) -> FeatureVector {
    let view = SourceView::scan(code, language);
    let ctx = Context::new(&view);
    let mut out = FeatureVector::neutral();

    comments::extract(&ctx, &mut out);
    naming::extract(&ctx, &mut out);
    let definitions = structure::extract(&ctx, &mut out);
    complexity::extract(&ctx, &definitions, &mut out);
    style::extract(&ctx, &mut out);
    repetition::extract(&ctx, &mut out);
    documentation::extract(&ctx, &definitions, &mut out);

    if view.is_degraded() {
        // Nesting depth depends on delimiters that did not balance
        out.set(Feature::MaxNestingDepth, Feature::MaxNestingDepth.neutral());
        out.degraded = view.issues.clone();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_consistent() {
        for (i, f) in Feature::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
            assert_eq!(Feature::from_name(f.name()), Some(*f));
        }
    }

    #[test]
    fn test_every_feature_present_for_trivial_input() {
        let fv = extract("x", Language::Unknown);
        assert_eq!(fv.iter().count(), Feature::COUNT);
        for (f, v) in fv.iter() {
            assert!(v.is_finite(), "{f} not finite");
        }
        let json = serde_json::to_value(&fv).unwrap();
        assert_eq!(json.as_object().unwrap().len(), Feature::COUNT);
    }

    #[test]
    fn test_set_clamps() {
        let mut fv = FeatureVector::neutral();
        fv.set(Feature::CommentRatio, 1.7);
        assert_eq!(fv.get(Feature::CommentRatio), 1.0);
        fv.set(Feature::FunctionCount, -3.0);
        assert_eq!(fv.get(Feature::FunctionCount), 0.0);
        fv.set(Feature::NamingConsistency, f64::NAN);
        assert_eq!(fv.get(Feature::NamingConsistency), 0.5);
    }

    #[test]
    fn test_degraded_input_neutralizes_nesting() {
        let fv = extract(
            "def broken(:\n    if x:\n        if y:\n            return ((\n",
            Language::Python,
        );
        assert!(fv.is_degraded());
        assert_eq!(
            fv.get(Feature::MaxNestingDepth),
            Feature::MaxNestingDepth.neutral()
        );
    }

    #[test]
    fn test_clean_python_sample() {
        let code = r#"import math


def circle_area(radius):
    """Return the area of a circle."""
    return math.pi * radius ** 2


def circle_perimeter(radius):
    """Return the perimeter of a circle."""
    return 2 * math.pi * radius
"#;
        let fv = extract(code, Language::Python);
        assert!(!fv.is_degraded());
        assert_eq!(fv.get(Feature::FunctionCount), 2.0);
        assert_eq!(fv.get(Feature::ImportCount), 1.0);
        assert_eq!(fv.get(Feature::DocCoverage), 1.0);
        assert_eq!(fv.get(Feature::IndentWidthMode), 4.0);
        assert_eq!(fv.get(Feature::DuplicateLineRatio), 0.0);
        assert_eq!(fv.get(Feature::CommentRatio), 0.0);
    }
}
