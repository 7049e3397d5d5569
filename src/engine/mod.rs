//! Multi-method detection engine
//!
//! One `analyze` call:
//!
//! 1. validates the request (`InvalidInput` stops here, before any scorer)
//! 2. resolves the language and extracts the feature vector once
//! 3. starts the external call on its own thread, then runs the in-memory
//!    scorers on rayon
//! 4. waits for the external reply up to its timeout and synthesizes
//!
//! The only shared state is the read-only [`PatternStore`] behind an `Arc`.

mod synthesizer;

pub use synthesizer::{MethodWeights, SynthesisContext, Synthesizer, UncertainBand};

use crate::ai::{AiClient, ExternalAdapter, ExternalClassifier};
use crate::config::EngineConfig;
use crate::corpus::{DatasetMatch, DatasetMatcher, PatternStore};
use crate::error::{EngineError, EngineResult};
use crate::features::{self, language};
use crate::models::{
    AnalysisRequest, CodeMetrics, CodeSample, DetectionResult, Language, Method, MethodOutcome,
};
use crate::scoring::{
    HeuristicScorer, NormalizationBounds, Scorer, ScoringInput, WeightTable, WeightedScorer,
};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct Engine {
    /// Scorers that only need the sample and its features, in method order
    scorers: Vec<Box<dyn Scorer>>,
    /// Kept apart from `scorers`: it also names the closest generator
    dataset: DatasetMatcher,
    weight_table: String,
    external: Option<ExternalAdapter>,
    synthesizer: Synthesizer,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("corpus_samples", &self.dataset.store().len())
            .field("weight_table", &self.weight_table)
            .field("external", &self.external)
            .finish()
    }
}

/// Builder for [`Engine`]. Every dependency is injected explicitly.
pub struct EngineBuilder {
    store: Arc<PatternStore>,
    external: Option<ExternalAdapter>,
    weight_table: WeightTable,
    bounds: NormalizationBounds,
    method_weights: MethodWeights,
    band: UncertainBand,
    similarity_threshold: Option<f64>,
    max_neighbors: Option<usize>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            store: Arc::new(PatternStore::empty()),
            external: None,
            weight_table: WeightTable::builtin(),
            bounds: NormalizationBounds::default(),
            method_weights: MethodWeights::default(),
            band: UncertainBand::default(),
            similarity_threshold: None,
            max_neighbors: None,
        }
    }
}

impl EngineBuilder {
    pub fn with_store(mut self, store: Arc<PatternStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_external(mut self, classifier: Arc<dyn ExternalClassifier>, timeout: Duration) -> Self {
        self.external = Some(ExternalAdapter::new(classifier, timeout));
        self
    }

    pub fn with_weight_table(mut self, table: WeightTable) -> Self {
        self.weight_table = table;
        self
    }

    pub fn with_bounds(mut self, bounds: NormalizationBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_method_weights(mut self, weights: MethodWeights) -> Self {
        self.method_weights = weights;
        self
    }

    pub fn with_uncertain_band(mut self, band: UncertainBand) -> Self {
        self.band = band;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn with_max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = Some(max_neighbors);
        self
    }

    pub fn build(self) -> EngineResult<Engine> {
        let mut dataset = DatasetMatcher::new(self.store);
        if let Some(t) = self.similarity_threshold {
            dataset = dataset.with_threshold(t);
        }
        if let Some(n) = self.max_neighbors {
            dataset = dataset.with_max_neighbors(n);
        }

        let weight_table = self.weight_table.version().to_string();
        let scorers: Vec<Box<dyn Scorer>> = vec![
            Box::new(HeuristicScorer::new(self.bounds.clone())),
            Box::new(WeightedScorer::new(self.weight_table, self.bounds)),
        ];

        Ok(Engine {
            scorers,
            dataset,
            weight_table,
            external: self.external,
            synthesizer: Synthesizer::new(self.method_weights, self.band)?,
        })
    }
}

/// Resolve the request language: declared tag, or sniffed for `auto`/none
fn resolve_language(tag: Option<&str>, code: &str) -> EngineResult<(Language, bool)> {
    match tag {
        None => Ok((language::sniff(code), false)),
        Some(t) if Language::is_auto_tag(t) => Ok((language::sniff(code), false)),
        Some(t) => Language::from_tag(t).map(|l| (l, true)).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "unsupported language '{}' (expected one of: {}, or auto)",
                t.trim(),
                Language::SUPPORTED
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }),
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Build an engine from configuration. A configured corpus that cannot be
    /// loaded fails the whole construction.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Engine> {
        config.validate()?;
        let bounds = config.normalization_bounds()?;

        let mut builder = Engine::builder()
            .with_bounds(bounds.clone())
            .with_method_weights(config.synthesis.weights)
            .with_uncertain_band(config.synthesis.uncertain_band)
            .with_similarity_threshold(config.corpus.similarity_threshold)
            .with_max_neighbors(config.corpus.max_neighbors);

        if let Some(path) = &config.scoring.weight_table {
            let table = WeightTable::load(path)?;
            info!("Using weight table {} from {}", table.version(), path.display());
            builder = builder.with_weight_table(table);
        }

        if config.corpus.enabled {
            let store = PatternStore::load(&config.corpus.paths, bounds)?;
            builder = builder.with_store(Arc::new(store));
        } else {
            info!("Dataset method disabled: no corpus configured");
        }

        if config.external.enabled {
            let timeout = config.external.timeout()?;
            match AiClient::from_env_with_config(config.external.ai_config()?) {
                Ok(client) => {
                    info!(
                        "External classifier: {} ({}), timeout {:?}",
                        client.backend(),
                        client.model(),
                        timeout
                    );
                    builder = builder.with_external(Arc::new(client), timeout);
                }
                // Non-fatal: the method is simply unavailable
                Err(e) => tracing::warn!("External classifier disabled: {}", e),
            }
        }

        builder.build()
    }

    pub fn store(&self) -> &PatternStore {
        self.dataset.store()
    }

    /// Analyze one request
    pub fn analyze(&self, request: &AnalysisRequest) -> EngineResult<DetectionResult> {
        if request.code.trim().is_empty() {
            return Err(EngineError::InvalidInput("code must not be empty".to_string()));
        }
        if request.requested_methods.as_ref().is_some_and(|m| m.is_empty()) {
            return Err(EngineError::InvalidInput(
                "requested_methods must name at least one method".to_string(),
            ));
        }
        let (lang, declared) = resolve_language(request.language.as_deref(), &request.code)?;

        let sample = CodeSample::new(request.code.as_str(), lang, declared);
        let features = features::extract(sample.text(), lang);
        debug!(
            "Analyzing {} lines of {} ({})",
            sample.line_count(),
            lang,
            if declared { "declared" } else { "sniffed" }
        );

        let mut warnings = Vec::new();
        if declared {
            if let Some(suspected) = language::mismatch(sample.text(), lang) {
                warnings.push(
                    EngineError::ExtractionDegraded(format!(
                        "code looks like {suspected}, not the declared {lang}"
                    ))
                    .to_string(),
                );
            }
        }
        if features.is_degraded() {
            debug!("Degraded extraction: {}", features.degraded().join("; "));
            warnings.push(EngineError::ExtractionDegraded(features.degraded().join("; ")).to_string());
        }

        // Start the slow call first so it overlaps the in-memory work
        let pending = match (&self.external, request.wants(Method::External)) {
            (Some(adapter), true) => Some(adapter.spawn(sample.text(), lang)),
            _ => None,
        };

        let input = ScoringInput {
            sample: &sample,
            features: &features,
        };
        let (mut outcomes, dataset) = rayon::join(
            || {
                self.scorers
                    .par_iter()
                    .filter(|scorer| request.wants(scorer.method()))
                    .map(|scorer| scorer.score(&input))
                    .collect::<Vec<MethodOutcome>>()
            },
            || {
                request
                    .wants(Method::Dataset)
                    .then(|| self.dataset.match_sample(&features, &sample))
            },
        );

        let mut likely_generator = None;
        if let Some(DatasetMatch {
            outcome,
            likely_generator: generator,
        }) = dataset
        {
            likely_generator = generator;
            outcomes.push(outcome);
        }

        if request.wants(Method::External) {
            outcomes.push(match pending {
                Some(call) => call.wait(),
                None => MethodOutcome::unavailable(Method::External, "not configured"),
            });
        }

        let ran: Vec<&str> = outcomes
            .iter()
            .filter(|o| o.result().is_some())
            .map(|o| o.method().as_str())
            .collect();
        debug!("Methods with results: {}", ran.join(", "));

        Ok(self.synthesizer.synthesize(
            outcomes,
            SynthesisContext {
                metrics: CodeMetrics::from_features(&features, &sample),
                language: lang,
                likely_generator,
                warnings,
            },
        ))
    }

    /// Analyze many requests in parallel; results keep the input order
    pub fn analyze_batch(&self, requests: &[AnalysisRequest]) -> Vec<EngineResult<DetectionResult>> {
        requests.par_iter().map(|r| self.analyze(r)).collect()
    }
}
