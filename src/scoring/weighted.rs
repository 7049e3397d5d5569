//! Weighted feature scorer
//!
//! Emulates a trained linear classifier: every feature is normalized to
//! [0, 1], centered, multiplied by its weight, summed with a bias and squashed
//! through a logistic. The weight table is versioned data (JSON), not code;
//! the default ships embedded and a tuned table can be loaded from disk.

use super::{indicator, NormalizationBounds, Scorer, ScoringInput};
use crate::error::{EngineError, EngineResult};
use crate::features::{Feature, FeatureVector};
use crate::models::{Method, MethodOutcome, MethodResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TABLE: &str = include_str!("weights/default_v1.json");

/// Number of strongest contributions reported as indicators
const TOP_INDICATORS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub weight: f64,
    /// Normalized value at which the feature contributes nothing
    #[serde(default)]
    pub center: f64,
}

/// On-disk weight table format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightFile {
    version: String,
    #[serde(default)]
    bias: f64,
    weights: BTreeMap<String, FeatureWeight>,
}

/// Resolved weight table; features missing from the file get weight 0
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    version: String,
    bias: f64,
    weights: [FeatureWeight; Feature::COUNT],
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WeightTable {
    /// The embedded default table
    pub fn builtin() -> Self {
        Self::parse(DEFAULT_TABLE).expect("embedded weight table is valid")
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidInput(format!("cannot read weight table {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> EngineResult<Self> {
        let file: WeightFile = serde_json::from_str(content)
            .map_err(|e| EngineError::InvalidInput(format!("invalid weight table: {e}")))?;
        if !file.bias.is_finite() {
            return Err(EngineError::InvalidInput(
                "weight table bias must be finite".to_string(),
            ));
        }

        let mut weights = [FeatureWeight::default(); Feature::COUNT];
        for (name, w) in &file.weights {
            let feature = Feature::from_name(name).ok_or_else(|| {
                EngineError::InvalidInput(format!("unknown feature in weight table: {name}"))
            })?;
            if !w.weight.is_finite() || !w.center.is_finite() {
                return Err(EngineError::InvalidInput(format!(
                    "weight for {name} must be finite"
                )));
            }
            weights[feature.index()] = *w;
        }

        Ok(Self {
            version: file.version,
            bias: file.bias,
            weights,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, feature: Feature) -> FeatureWeight {
        self.weights[feature.index()]
    }
}

/// Logistic function that never overflows
fn stable_sigmoid(x: f64) -> f64 {
    if x.is_nan() {
        0.5
    } else if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    table: WeightTable,
    bounds: NormalizationBounds,
}

impl WeightedScorer {
    pub fn new(table: WeightTable, bounds: NormalizationBounds) -> Self {
        Self { table, bounds }
    }

    /// Pure function of the feature vector
    pub fn score_features(&self, features: &FeatureVector) -> MethodResult {
        let mut x = self.table.bias;
        let mut contributions: Vec<(Feature, f64, f64, f64)> = Vec::new();

        for (feature, raw) in features.iter() {
            let w = self.table.get(feature);
            if w.weight == 0.0 {
                continue;
            }
            let normalized = self.bounds.normalize(feature, raw);
            let term = w.weight * (normalized - w.center);
            x += term;
            contributions.push((feature, raw, normalized, term));
        }

        let score = 100.0 * stable_sigmoid(x);

        contributions.sort_by(|a, b| b.3.abs().total_cmp(&a.3.abs()));
        let indicators = contributions
            .into_iter()
            .take(TOP_INDICATORS)
            .filter(|(_, _, _, term)| *term != 0.0)
            .map(|(feature, raw, normalized, term)| {
                let center = self.table.get(feature).center;
                indicator(feature, raw, normalized > center, term > 0.0)
            })
            .collect();

        MethodResult::new(Method::Weighted, score, indicators)
    }
}

impl Scorer for WeightedScorer {
    fn method(&self) -> Method {
        Method::Weighted
    }

    fn score(&self, input: &ScoringInput<'_>) -> MethodOutcome {
        MethodOutcome::Present(self.score_features(input.features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let table = WeightTable::builtin();
        assert_eq!(table.version(), "default-v1");
        assert_eq!(table.get(Feature::DocCoverage).weight, 3.5);
        assert_eq!(table.get(Feature::LineCount).weight, 0.0);
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(stable_sigmoid(0.0), 0.5);
        assert!(stable_sigmoid(1000.0) <= 1.0);
        assert!(stable_sigmoid(-1000.0) >= 0.0);
        assert!(!stable_sigmoid(-1000.0).is_nan());
        assert_eq!(stable_sigmoid(f64::NAN), 0.5);
    }

    #[test]
    fn test_extreme_vectors_stay_in_range() {
        let scorer = WeightedScorer::default();
        let mut zero = FeatureVector::neutral();
        let mut max = FeatureVector::neutral();
        for f in Feature::ALL {
            zero.set(f, 0.0);
            max.set(f, f64::MAX);
        }
        for fv in [zero, max, FeatureVector::neutral()] {
            let r = scorer.score_features(&fv);
            assert!(r.score.is_finite());
            assert!((0.0..=100.0).contains(&r.score), "{}", r.score);
        }
    }

    #[test]
    fn test_huge_weights_do_not_overflow() {
        let json = r#"{"version": "t", "bias": 0.0, "weights": {"doc_coverage": {"weight": 1e300, "center": 0.0}}}"#;
        let scorer = WeightedScorer::new(WeightTable::parse(json).unwrap(), Default::default());
        let mut fv = FeatureVector::neutral();
        fv.set(Feature::DocCoverage, 1.0);
        let r = scorer.score_features(&fv);
        assert_eq!(r.score, 100.0);
    }

    #[test]
    fn test_invalid_tables_rejected() {
        assert!(WeightTable::parse("not json").is_err());
        let unknown = r#"{"version": "t", "weights": {"vibes": {"weight": 1.0}}}"#;
        assert!(WeightTable::parse(unknown).is_err());
    }

    #[test]
    fn test_indicators_report_strongest_terms() {
        let mut fv = FeatureVector::neutral();
        fv.set(Feature::DocCoverage, 1.0);
        let r = WeightedScorer::default().score_features(&fv);
        assert!(r.indicators.len() <= TOP_INDICATORS);
        assert_eq!(r.indicators[0], "high docstring coverage (100%) suggests ai");
    }
}
