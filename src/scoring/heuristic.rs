//! Rule-based scorer
//!
//! Starts neutral at 50 and lets a handful of features push the score up
//! (AI-likely) or down (human-likely). Each rule contributes
//! `weight * (normalized - pivot)`, so a feature sitting at its pivot is silent.

use super::{indicator, NormalizationBounds, Scorer, ScoringInput};
use crate::features::{Feature, FeatureVector};
use crate::models::{Method, MethodOutcome, MethodResult};

struct Rule {
    feature: Feature,
    /// Points per unit of normalized feature; positive pushes toward AI
    weight: f64,
    pivot: f64,
}

const RULES: &[Rule] = &[
    // Generated code documents every definition
    Rule { feature: Feature::DocCoverage, weight: 30.0, pivot: 0.3 },
    Rule { feature: Feature::AvgDocLength, weight: 10.0, pivot: 0.2 },
    // Formatter-perfect indentation
    Rule { feature: Feature::IndentConsistency, weight: 20.0, pivot: 0.7 },
    Rule { feature: Feature::IndentVariance, weight: -15.0, pivot: 0.1 },
    Rule { feature: Feature::NamingConsistency, weight: 6.0, pivot: 0.5 },
    // Copy-paste is a human habit
    Rule { feature: Feature::DuplicateLineRatio, weight: -40.0, pivot: 0.05 },
    Rule { feature: Feature::CommentRatio, weight: 15.0, pivot: 0.1 },
    Rule { feature: Feature::CommentStyleConsistency, weight: 8.0, pivot: 0.5 },
    Rule { feature: Feature::TrailingWhitespaceRate, weight: -20.0, pivot: 0.02 },
];

/// Contributions smaller than this (in points) are not reported
const INDICATOR_MIN_POINTS: f64 = 2.0;

#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    bounds: NormalizationBounds,
}

impl HeuristicScorer {
    pub fn new(bounds: NormalizationBounds) -> Self {
        Self { bounds }
    }

    /// Pure function of the feature vector
    pub fn score_features(&self, features: &FeatureVector) -> MethodResult {
        let mut score = 50.0;
        let mut contributions = Vec::with_capacity(RULES.len());

        for rule in RULES {
            let raw = features.get(rule.feature);
            let normalized = self.bounds.normalize(rule.feature, raw);
            let points = rule.weight * (normalized - rule.pivot);
            score += points;
            contributions.push((rule, raw, normalized, points));
        }

        contributions.sort_by(|a, b| b.3.abs().total_cmp(&a.3.abs()));
        let indicators = contributions
            .into_iter()
            .filter(|(_, _, _, points)| points.abs() >= INDICATOR_MIN_POINTS)
            .map(|(rule, raw, normalized, points)| {
                indicator(rule.feature, raw, normalized > rule.pivot, points > 0.0)
            })
            .collect();

        MethodResult::new(Method::Heuristic, score, indicators)
    }
}

impl Scorer for HeuristicScorer {
    fn method(&self) -> Method {
        Method::Heuristic
    }

    fn score(&self, input: &ScoringInput<'_>) -> MethodOutcome {
        MethodOutcome::Present(self.score_features(input.features))
    }
}
