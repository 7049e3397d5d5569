//! Dataset Pattern Matcher
//!
//! Scores a sample by the company it keeps: the origin classes of its nearest
//! corpus neighbours, weighted by similarity, joined by static fingerprint
//! hits and, when there is enough of it, line-shape overlap with the corpus.

use super::fingerprints;
use super::signature::Probe;
use super::store::PatternStore;
use crate::features::FeatureVector;
use crate::models::{CodeSample, Method, MethodOutcome, MethodResult, PatternMatch};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;
pub const DEFAULT_MAX_NEIGHBORS: usize = 7;

/// A loaded corpus is never empty, so an empty store means none was configured
pub const DISABLED_REASON: &str = "disabled, no corpus configured";

/// Shingle evidence is ignored below this many discriminative hits
const MIN_SHINGLE_HITS: usize = 3;
/// Share of the final score taken from shingle evidence when it applies
const SHINGLE_BLEND: f64 = 0.25;

/// Matcher output: the method outcome plus the closest generator identity
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMatch {
    pub outcome: MethodOutcome,
    pub likely_generator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatasetMatcher {
    store: Arc<PatternStore>,
    threshold: f64,
    max_neighbors: usize,
}

impl DatasetMatcher {
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self {
            store,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = max_neighbors.max(1);
        self
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn match_sample(&self, features: &FeatureVector, sample: &CodeSample) -> DatasetMatch {
        if self.store.is_empty() {
            return DatasetMatch {
                outcome: MethodOutcome::unavailable(Method::Dataset, DISABLED_REASON),
                likely_generator: None,
            };
        }

        let probe = Probe::of(features, self.store.bounds());
        let neighbors = self
            .store
            .lookup(&probe, self.threshold, self.max_neighbors);

        if neighbors.is_empty() {
            tracing::debug!("No corpus neighbours for signature {}", probe.signature);
            let result = MethodResult::new(
                Method::Dataset,
                50.0,
                vec![format!(
                    "no match: no corpus sample within similarity {:.2}",
                    self.threshold
                )],
            );
            return DatasetMatch {
                outcome: MethodOutcome::Present(result),
                likely_generator: None,
            };
        }

        let mut evidence: Vec<PatternMatch> = neighbors;
        evidence.extend(fingerprints::scan(sample.text()));

        let (ai, human) = evidence
            .iter()
            .filter(|m| m.class.votes())
            .fold((0.0, 0.0), |(ai, human), m| {
                if m.class.is_ai() {
                    (ai + m.strength, human)
                } else {
                    (ai, human + m.strength)
                }
            });
        let mut score = if ai + human > 0.0 {
            100.0 * ai / (ai + human)
        } else {
            50.0
        };

        let mut indicators: Vec<String> = evidence.iter().map(|m| m.indicator.clone()).collect();

        let shingles = self.store.shingle_evidence(sample.text(), sample.language());
        if shingles.discriminative() >= MIN_SHINGLE_HITS {
            if let Some(share) = shingles.ai_share() {
                score = (1.0 - SHINGLE_BLEND) * score + SHINGLE_BLEND * 100.0 * share;
                indicators.push(format!(
                    "line shapes: {} of {} seen only in ai samples, {} only in human samples",
                    shingles.ai_only, shingles.total, shingles.human_only
                ));
            }
        }

        let mut by_generator: FxHashMap<&str, f64> = FxHashMap::default();
        for m in &evidence {
            if let Some(name) = m.class.generator() {
                *by_generator.entry(name).or_insert(0.0) += m.strength;
            }
        }
        let mut generators: Vec<(&str, f64)> = by_generator.into_iter().collect();
        generators.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(b.0)));
        if !generators.is_empty() {
            let names: Vec<&str> = generators.iter().map(|(name, _)| *name).collect();
            indicators.push(format!("resembles generators: {}", names.join(", ")));
        }
        let likely_generator = generators.first().map(|(name, _)| name.to_string());

        DatasetMatch {
            outcome: MethodOutcome::Present(MethodResult::new(Method::Dataset, score, indicators)),
            likely_generator,
        }
    }
}
