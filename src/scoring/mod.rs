//! In-memory scoring methods
//!
//! The feature-only methods implement [`Scorer`]: it sees the code sample and its
//! feature vector and returns a `MethodOutcome`. Scorers never look at each
//! other's output.
//!
//! - [`HeuristicScorer`]: a small signed decision table around a neutral 50.
//! - [`WeightedScorer`]: normalized features through a versioned weight table
//!   and a logistic squash.
//!
//! The engine runs every [`Scorer`] it holds side by side. The dataset matcher
//! lives in `corpus` and is called directly, since it also reports the closest
//! generator.

mod heuristic;
pub mod normalize;
mod weighted;

pub use heuristic::HeuristicScorer;
pub use normalize::{Bounds, NormalizationBounds};
pub use weighted::{FeatureWeight, WeightTable, WeightedScorer};

use crate::features::{Feature, FeatureVector};
use crate::models::{CodeSample, Method, MethodOutcome};

/// Everything a scorer may look at for one request
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub sample: &'a CodeSample,
    pub features: &'a FeatureVector,
}

/// One independent scoring strategy
pub trait Scorer: Send + Sync {
    fn method(&self) -> Method;

    fn score(&self, input: &ScoringInput<'_>) -> MethodOutcome;
}

/// Human-readable feature names used in indicators
fn describe(feature: Feature) -> &'static str {
    match feature {
        Feature::CommentRatio => "comment density",
        Feature::AvgCommentLength => "comment length",
        Feature::InlineCommentRatio => "inline comment share",
        Feature::CommentPlacementVariance => "comment placement mix",
        Feature::CommentStyleConsistency => "comment style consistency",
        Feature::CamelCaseRatio => "camelCase share",
        Feature::SnakeCaseRatio => "snake_case share",
        Feature::ScreamingCaseRatio => "SCREAMING_CASE share",
        Feature::NamingConsistency => "naming consistency",
        Feature::FunctionCount => "function count",
        Feature::ClassCount => "class count",
        Feature::MaxNestingDepth => "nesting depth",
        Feature::ImportCount => "import count",
        Feature::CyclomaticComplexity => "cyclomatic complexity",
        Feature::LineCount => "line count",
        Feature::TokenCount => "token count",
        Feature::IndentWidthMode => "indent width",
        Feature::IndentVariance => "indentation variance",
        Feature::IndentConsistency => "indentation consistency",
        Feature::TrailingWhitespaceRate => "trailing whitespace",
        Feature::BlankLineRate => "blank line rate",
        Feature::DuplicateLineRatio => "duplicate lines",
        Feature::RepeatedCallRatio => "repeated calls",
        Feature::VariableReuseRatio => "variable reuse",
        Feature::DocCoverage => "docstring coverage",
        Feature::AvgDocLength => "docstring length",
    }
}

/// Indicator text for a feature that moved the score.
/// `high` says which side of the pivot the value sits on, `toward_ai` which
/// way it pushed.
pub(crate) fn indicator(feature: Feature, raw: f64, high: bool, toward_ai: bool) -> String {
    let value = if feature.is_ratio() {
        format!("{:.0}%", raw * 100.0)
    } else {
        format!("{raw:.1}")
    };
    format!(
        "{} {} ({value}) suggests {}",
        if high { "high" } else { "low" },
        describe(feature),
        if toward_ai { "ai" } else { "human" }
    )
}
