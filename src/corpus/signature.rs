//! Coarse feature signatures and probe vectors
//!
//! The index key is a bucketed triple of the most discriminative features
//! (naming consistency, complexity, comment ratio). Lookup visits the query's
//! bucket and its immediate neighbours, then ranks candidates by distance
//! between compact probe vectors.

use crate::features::{Feature, FeatureVector};
use crate::scoring::NormalizationBounds;
use serde::Serialize;

pub const PROBE_LEN: usize = 8;

/// Features making up the probe vector, all normalized to [0, 1]
pub const PROBE_FEATURES: [Feature; PROBE_LEN] = [
    Feature::NamingConsistency,
    Feature::DocCoverage,
    Feature::IndentConsistency,
    Feature::CommentRatio,
    Feature::DuplicateLineRatio,
    Feature::IndentVariance,
    Feature::CommentStyleConsistency,
    Feature::AvgDocLength,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FeatureSignature {
    pub naming: u8,
    pub complexity: u8,
    pub comments: u8,
}

const NAMING_BUCKETS: u8 = 4;

fn naming_bucket(consistency: f64) -> u8 {
    ((consistency.clamp(0.0, 1.0) * NAMING_BUCKETS as f64) as u8).min(NAMING_BUCKETS - 1)
}

fn complexity_bucket(cyclomatic: f64) -> u8 {
    match cyclomatic {
        c if c <= 2.0 => 0,
        c if c <= 5.0 => 1,
        c if c <= 10.0 => 2,
        c if c <= 20.0 => 3,
        _ => 4,
    }
}

fn comment_bucket(ratio: f64) -> u8 {
    match ratio {
        r if r <= 0.0 => 0,
        r if r <= 0.05 => 1,
        r if r <= 0.15 => 2,
        r if r <= 0.3 => 3,
        _ => 4,
    }
}

impl FeatureSignature {
    pub fn of(features: &FeatureVector) -> Self {
        Self {
            naming: naming_bucket(features.get(Feature::NamingConsistency)),
            complexity: complexity_bucket(features.get(Feature::CyclomaticComplexity)),
            comments: comment_bucket(features.get(Feature::CommentRatio)),
        }
    }

    /// This signature and every signature one bucket away on any axis
    pub fn neighborhood(&self) -> impl Iterator<Item = FeatureSignature> + '_ {
        let span = |v: u8| v.saturating_sub(1)..=v.saturating_add(1);
        span(self.naming).flat_map(move |naming| {
            span(self.complexity).flat_map(move |complexity| {
                span(self.comments).map(move |comments| FeatureSignature {
                    naming,
                    complexity,
                    comments,
                })
            })
        })
    }
}

impl std::fmt::Display for FeatureSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n{}/c{}/k{}",
            self.naming, self.complexity, self.comments
        )
    }
}

/// Signature plus probe vector: what the store is queried with
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub signature: FeatureSignature,
    pub vector: [f64; PROBE_LEN],
}

impl Probe {
    pub fn of(features: &FeatureVector, bounds: &NormalizationBounds) -> Self {
        let mut vector = [0.0; PROBE_LEN];
        for (slot, feature) in vector.iter_mut().zip(PROBE_FEATURES) {
            *slot = bounds.normalize(feature, features.get(feature));
        }
        Self {
            signature: FeatureSignature::of(features),
            vector,
        }
    }

    /// Similarity in [0, 1]: 1 minus Euclidean distance scaled by the
    /// largest possible distance
    pub fn similarity(&self, other: &Probe) -> f64 {
        let dist = self
            .vector
            .iter()
            .zip(other.vector.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        (1.0 - dist / (PROBE_LEN as f64).sqrt()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets() {
        assert_eq!(naming_bucket(1.0), 3);
        assert_eq!(naming_bucket(0.0), 0);
        assert_eq!(complexity_bucket(1.0), 0);
        assert_eq!(complexity_bucket(7.0), 2);
        assert_eq!(complexity_bucket(99.0), 4);
        assert_eq!(comment_bucket(0.0), 0);
        assert_eq!(comment_bucket(0.2), 3);
    }

    #[test]
    fn test_neighborhood_size() {
        let interior = FeatureSignature {
            naming: 2,
            complexity: 2,
            comments: 2,
        };
        assert_eq!(interior.neighborhood().count(), 27);
        let corner = FeatureSignature {
            naming: 0,
            complexity: 0,
            comments: 0,
        };
        assert_eq!(corner.neighborhood().count(), 8);
        assert!(corner.neighborhood().any(|s| s == corner));
    }

    #[test]
    fn test_similarity_bounds() {
        let bounds = NormalizationBounds::default();
        let a = Probe::of(&FeatureVector::neutral(), &bounds);
        assert_eq!(a.similarity(&a), 1.0);

        let mut far = FeatureVector::neutral();
        for f in PROBE_FEATURES {
            far.set(f, 1e6);
        }
        let b = Probe::of(&far, &bounds);
        let s = a.similarity(&b);
        assert!((0.0..1.0).contains(&s));
    }
}
