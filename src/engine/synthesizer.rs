//! Result Synthesizer
//!
//! Merges whatever method outcomes arrived into one verdict:
//!
//! - label: taken from the anchor method (weighted, else external, else
//!   heuristic)
//! - score: weighted mean of the present scores, weights renormalized over
//!   the methods actually present
//! - confidence: `1 - stddev(scores) / 50`, clamped to [0, 1]
//! - indicators: union of method indicators, deduplicated, strongest method
//!   first

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CodeMetrics, DetectionResult, Label, Language, Method, MethodOutcome, MethodResult,
};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Anchor priority for the final label
const ANCHOR_ORDER: [Method; 3] = [Method::Weighted, Method::External, Method::Heuristic];

/// Indicators quoted in the explanation
const EXPLAINED_INDICATORS: usize = 3;

/// Relative method weights in the final score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodWeights {
    pub heuristic: f64,
    pub weighted: f64,
    pub dataset: f64,
    pub external: f64,
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self {
            heuristic: 0.1,
            weighted: 0.4,
            dataset: 0.2,
            external: 0.3,
        }
    }
}

impl MethodWeights {
    pub fn get(&self, method: Method) -> f64 {
        match method {
            Method::Heuristic => self.heuristic,
            Method::Weighted => self.weighted,
            Method::Dataset => self.dataset,
            Method::External => self.external,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        for method in Method::ALL {
            let w = self.get(method);
            if !w.is_finite() || w < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "synthesis weight for {method} must be a finite non-negative number, got {w}"
                )));
            }
        }
        if Method::ALL.iter().all(|m| self.get(*m) == 0.0) {
            return Err(EngineError::InvalidInput(
                "synthesis weights are all zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scores inside `[low, high]` are reported as uncertain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertainBand {
    pub low: f64,
    pub high: f64,
}

impl Default for UncertainBand {
    fn default() -> Self {
        Self {
            low: 40.0,
            high: 60.0,
        }
    }
}

impl UncertainBand {
    pub fn contains(&self, score: f64) -> bool {
        (self.low..=self.high).contains(&score)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=100.0).contains(&self.low)
            || !(0.0..=100.0).contains(&self.high)
            || self.low > self.high
        {
            return Err(EngineError::InvalidInput(format!(
                "uncertain band [{}, {}] must satisfy 0 <= low <= high <= 100",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Per-request facts the synthesizer passes through to the result
#[derive(Debug, Clone)]
pub struct SynthesisContext {
    pub metrics: CodeMetrics,
    pub language: Language,
    pub likely_generator: Option<String>,
    /// Warnings that lead the indicator list (degraded extraction and such)
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    weights: MethodWeights,
    band: UncertainBand,
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

impl Synthesizer {
    pub fn new(weights: MethodWeights, band: UncertainBand) -> EngineResult<Self> {
        weights.validate()?;
        band.validate()?;
        Ok(Self { weights, band })
    }

    pub fn weights(&self) -> &MethodWeights {
        &self.weights
    }

    pub fn synthesize(&self, outcomes: Vec<MethodOutcome>, ctx: SynthesisContext) -> DetectionResult {
        let mut present: Vec<MethodResult> = Vec::new();
        let mut unavailable: Vec<(Method, String)> = Vec::new();
        for outcome in outcomes {
            match outcome {
                MethodOutcome::Present(r) => present.push(r),
                MethodOutcome::Unavailable { method, reason } => unavailable.push((method, reason)),
            }
        }
        present.sort_by_key(|r| r.method);
        unavailable.sort_by_key(|(m, _)| *m);

        let (label, score, confidence) = self.verdict(&present);

        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut indicators: Vec<String> = Vec::new();
        let mut push = |text: String, seen: &mut FxHashSet<String>| {
            if seen.insert(text.clone()) {
                indicators.push(text);
            }
        };

        for w in ctx.warnings {
            push(w, &mut seen);
        }
        let mut by_weight: Vec<&MethodResult> = present.iter().collect();
        // Stable sort keeps canonical order among equal weights
        by_weight.sort_by(|a, b| {
            self.weights
                .get(b.method)
                .total_cmp(&self.weights.get(a.method))
        });
        for r in &by_weight {
            for i in &r.indicators {
                push(i.clone(), &mut seen);
            }
        }
        for (method, reason) in &unavailable {
            push(format!("{method}: unavailable ({reason})"), &mut seen);
        }
        if present.is_empty() {
            push("no scoring method available".to_string(), &mut seen);
        }

        let explanation = self.explain(label, score, confidence, &present, &unavailable, &by_weight);

        DetectionResult {
            label,
            score,
            confidence,
            methods: present,
            indicators,
            metrics: ctx.metrics,
            language: ctx.language,
            likely_generator: ctx.likely_generator,
            explanation,
        }
    }

    fn verdict(&self, present: &[MethodResult]) -> (Label, f64, f64) {
        if present.is_empty() {
            return (Label::Human, 50.0, 0.0);
        }

        let total_weight: f64 = present.iter().map(|r| self.weights.get(r.method)).sum();
        let score = if total_weight > 0.0 {
            present
                .iter()
                .map(|r| self.weights.get(r.method) * r.score)
                .sum::<f64>()
                / total_weight
        } else {
            // Only zero-weighted methods ran: plain mean
            present.iter().map(|r| r.score).sum::<f64>() / present.len() as f64
        };
        let score = score.clamp(0.0, 100.0);

        let scores: Vec<f64> = present.iter().map(|r| r.score).collect();
        let confidence = (1.0 - std_dev(&scores) / 50.0).clamp(0.0, 1.0);

        let label = ANCHOR_ORDER
            .iter()
            .find_map(|m| present.iter().find(|r| r.method == *m))
            .map_or_else(|| Label::from_score(score), |anchor| anchor.label);

        (label, score, confidence)
    }

    fn explain(
        &self,
        label: Label,
        score: f64,
        confidence: f64,
        present: &[MethodResult],
        unavailable: &[(Method, String)],
        by_weight: &[&MethodResult],
    ) -> String {
        if present.is_empty() {
            return "No scoring method produced a result, so no verdict could be reached."
                .to_string();
        }

        let verdict = match label {
            Label::Ai => "AI-generated",
            Label::Human => "human-written",
        };
        let mut text = if self.band.contains(score) {
            format!("Uncertain, leaning {verdict} (score {score:.1}, confidence {confidence:.2}).")
        } else {
            format!("Likely {verdict} (score {score:.1}, confidence {confidence:.2}).")
        };

        let breakdown: Vec<String> = present
            .iter()
            .map(|r| format!("{} {:.1}", r.method, r.score))
            .collect();
        text.push_str(&format!(
            " {} of {} methods contributed: {}",
            present.len(),
            present.len() + unavailable.len(),
            breakdown.join(", ")
        ));
        if !unavailable.is_empty() {
            let names: Vec<&str> = unavailable.iter().map(|(m, _)| m.as_str()).collect();
            text.push_str(&format!("; unavailable: {}", names.join(", ")));
        }
        text.push('.');

        let top: Vec<&str> = by_weight
            .iter()
            .flat_map(|r| r.indicators.iter())
            .take(EXPLAINED_INDICATORS)
            .map(String::as_str)
            .collect();
        if !top.is_empty() {
            text.push_str(&format!(" Main signals: {}.", top.join("; ")));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::models::CodeSample;

    fn ctx() -> SynthesisContext {
        let sample = CodeSample::new("x = 1", Language::Python, true);
        SynthesisContext {
            metrics: CodeMetrics::from_features(&FeatureVector::neutral(), &sample),
            language: Language::Python,
            likely_generator: None,
            warnings: Vec::new(),
        }
    }

    fn present(method: Method, score: f64, indicators: &[&str]) -> MethodOutcome {
        MethodOutcome::Present(MethodResult::new(
            method,
            score,
            indicators.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[test]
    fn test_weighted_anchors_label() {
        let s = Synthesizer::default();
        let r = s.synthesize(
            vec![
                present(Method::Heuristic, 90.0, &[]),
                present(Method::Weighted, 30.0, &[]),
                present(Method::External, 95.0, &[]),
            ],
            ctx(),
        );
        assert_eq!(r.label, Label::Human);
        // (0.1*90 + 0.4*30 + 0.3*95) / 0.8
        assert!((r.score - 61.875).abs() < 1e-9);
    }

    #[test]
    fn test_external_then_heuristic_anchor() {
        let s = Synthesizer::default();
        let r = s.synthesize(
            vec![
                present(Method::Heuristic, 20.0, &[]),
                present(Method::External, 80.0, &[]),
            ],
            ctx(),
        );
        assert_eq!(r.label, Label::Ai);

        let r = s.synthesize(
            vec![
                present(Method::Heuristic, 45.0, &[]),
                present(Method::Dataset, 90.0, &[]),
            ],
            ctx(),
        );
        assert_eq!(r.label, Label::Human);
    }

    #[test]
    fn test_single_method_is_fully_confident() {
        let r = Synthesizer::default().synthesize(vec![present(Method::Dataset, 70.0, &[])], ctx());
        assert_eq!(r.score, 70.0);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.label, Label::Ai);
    }

    #[test]
    fn test_confidence_from_disagreement() {
        let r = Synthesizer::default().synthesize(
            vec![
                present(Method::Heuristic, 0.0, &[]),
                present(Method::Weighted, 100.0, &[]),
            ],
            ctx(),
        );
        assert_eq!(r.confidence, 0.0);

        let r = Synthesizer::default().synthesize(
            vec![
                present(Method::Heuristic, 60.0, &[]),
                present(Method::Weighted, 80.0, &[]),
            ],
            ctx(),
        );
        assert!((r.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_indicator_order_and_dedup() {
        let r = Synthesizer::default().synthesize(
            vec![
                present(Method::Heuristic, 60.0, &["shared", "h-only"]),
                present(Method::Weighted, 70.0, &["w-only", "shared"]),
                MethodOutcome::unavailable(Method::External, "timed out"),
            ],
            SynthesisContext {
                warnings: vec!["degraded".to_string()],
                ..ctx()
            },
        );
        assert_eq!(
            r.indicators,
            vec![
                "degraded",
                "w-only",
                "shared",
                "h-only",
                "external: unavailable (timed out)"
            ]
        );
    }

    #[test]
    fn test_methods_in_canonical_order() {
        let r = Synthesizer::default().synthesize(
            vec![
                present(Method::External, 10.0, &[]),
                present(Method::Heuristic, 10.0, &[]),
                present(Method::Weighted, 10.0, &[]),
            ],
            ctx(),
        );
        let order: Vec<Method> = r.methods.iter().map(|m| m.method).collect();
        assert_eq!(order, vec![Method::Heuristic, Method::Weighted, Method::External]);
    }

    #[test]
    fn test_nothing_present_is_neutral() {
        let r = Synthesizer::default().synthesize(
            vec![MethodOutcome::unavailable(Method::External, "down")],
            ctx(),
        );
        assert_eq!(r.score, 50.0);
        assert_eq!(r.confidence, 0.0);
        assert!(r.methods.is_empty());
        assert!(r.has_indicator("no scoring method available"));
    }

    #[test]
    fn test_explanation_mentions_uncertainty() {
        let r = Synthesizer::default().synthesize(vec![present(Method::Weighted, 55.0, &["x"])], ctx());
        assert!(r.explanation.starts_with("Uncertain, leaning AI-generated"));
        assert!(r.explanation.contains("weighted 55.0"));

        let r = Synthesizer::default().synthesize(vec![present(Method::Weighted, 95.0, &[])], ctx());
        assert!(r.explanation.starts_with("Likely AI-generated"));
    }

    #[test]
    fn test_weight_validation() {
        let zero = MethodWeights {
            heuristic: 0.0,
            weighted: 0.0,
            dataset: 0.0,
            external: 0.0,
        };
        assert!(zero.validate().is_err());
        let negative = MethodWeights {
            heuristic: -1.0,
            ..Default::default()
        };
        assert!(Synthesizer::new(negative, UncertainBand::default()).is_err());
        let band = UncertainBand { low: 70.0, high: 30.0 };
        assert!(Synthesizer::new(MethodWeights::default(), band).is_err());
    }
}
