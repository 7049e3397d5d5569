//! Validate command - accuracy on a seeded sample of a labeled corpus

use super::corpus::corpus_paths;
use crate::config::EngineConfig;
use crate::corpus::{loader, CorpusSample};
use crate::engine::Engine;
use crate::models::{AnalysisRequest, Label, Language, Method};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

pub struct Options {
    pub samples: usize,
    pub seed: u64,
    pub include_dataset: bool,
    pub json: bool,
}

/// Counts with AI as the positive class
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Confusion {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl Confusion {
    fn record(&mut self, expected: Label, predicted: Label) {
        match (expected, predicted) {
            (Label::Ai, Label::Ai) => self.true_positive += 1,
            (Label::Human, Label::Ai) => self.false_positive += 1,
            (Label::Human, Label::Human) => self.true_negative += 1,
            (Label::Ai, Label::Human) => self.false_negative += 1,
        }
    }

    fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    fn ratio(num: usize, den: usize) -> f64 {
        if den == 0 {
            0.0
        } else {
            num as f64 / den as f64
        }
    }

    pub fn accuracy(&self) -> f64 {
        Self::ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        Self::ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        Self::ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    sources: Vec<String>,
    seed: u64,
    requested: usize,
    evaluated: usize,
    failed: usize,
    methods: Vec<Method>,
    confusion: Confusion,
    accuracy: f64,
    precision: f64,
    recall: f64,
    mean_confidence: f64,
}

/// Deterministically pick up to `n` samples
fn draw(mut samples: Vec<CorpusSample>, n: usize, seed: u64) -> Vec<CorpusSample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    samples.shuffle(&mut rng);
    samples.truncate(n);
    samples
}

/// Drop rows whose label is unknown; they have no expected answer
fn labeled(mut samples: Vec<CorpusSample>) -> Vec<CorpusSample> {
    let before = samples.len();
    samples.retain(|s| s.class.votes());
    if samples.len() < before {
        tracing::info!("Skipping {} unknown-label samples", before - samples.len());
    }
    samples
}

fn language_tag(language: Language) -> &'static str {
    match language {
        Language::Unknown => "auto",
        other => other.as_str(),
    }
}

fn render_text(report: &ValidationReport) -> String {
    let c = &report.confusion;
    let mut out = String::new();
    out.push_str(&format!(
        "\n{} {} of {} sampled (seed {}), {} failed\n",
        style("Validation").bold(),
        report.evaluated,
        report.requested,
        report.seed,
        report.failed
    ));
    let methods: Vec<&str> = report.methods.iter().map(|m| m.as_str()).collect();
    out.push_str(&format!("Methods: {}\n\n", methods.join(", ")));
    out.push_str(&format!("{:>16} {:>10} {:>10}\n", "", "pred ai", "pred human"));
    out.push_str(&format!(
        "{:>16} {:>10} {:>10}\n",
        "actual ai", c.true_positive, c.false_negative
    ));
    out.push_str(&format!(
        "{:>16} {:>10} {:>10}\n\n",
        "actual human", c.false_positive, c.true_negative
    ));
    out.push_str(&format!(
        "Accuracy: {}  Precision: {:.1}%  Recall: {:.1}%  Mean confidence: {:.2}\n",
        style(format!("{:.1}%", report.accuracy * 100.0)).bold(),
        report.precision * 100.0,
        report.recall * 100.0,
        report.mean_confidence
    ));
    out
}

/// Run the validate command
pub fn run(config: &EngineConfig, corpus: &[PathBuf], options: Options) -> Result<()> {
    let start = Instant::now();
    let paths = corpus_paths(config, corpus)?;

    let mut all = Vec::new();
    for path in &paths {
        let loaded = loader::load_file(path)
            .with_context(|| format!("Failed to load corpus {}", path.display()))?;
        all.extend(loaded.samples);
    }
    let picked = draw(labeled(all), options.samples, options.seed);

    // The external model is never consulted here; runs must be repeatable
    let mut engine_config = config.clone();
    engine_config.external.enabled = false;
    engine_config.corpus.enabled = options.include_dataset;
    engine_config.corpus.paths = paths.clone();
    let engine = Engine::from_config(&engine_config).context("Failed to initialize engine")?;

    let mut methods = vec![Method::Heuristic, Method::Weighted];
    if options.include_dataset {
        methods.push(Method::Dataset);
    }

    let bar = ProgressBar::new(picked.len() as u64);
    if options.json {
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("█▓▒░  "),
    );
    bar.set_message("Classifying samples...");

    let outcomes: Vec<Option<(Label, Label, f64)>> = picked
        .par_iter()
        .map(|sample| {
            let request = AnalysisRequest::new(sample.code.clone())
                .with_language(language_tag(sample.language))
                .with_methods(methods.iter().copied());
            let expected = if sample.class.is_ai() { Label::Ai } else { Label::Human };
            let outcome = match engine.analyze(&request) {
                Ok(result) => Some((expected, result.label, result.confidence)),
                Err(e) => {
                    tracing::debug!("Sample skipped: {}", e);
                    None
                }
            };
            bar.inc(1);
            outcome
        })
        .collect();
    bar.finish_and_clear();

    let mut confusion = Confusion::default();
    let mut confidence_sum = 0.0;
    let mut failed = 0;
    for outcome in &outcomes {
        match outcome {
            Some((expected, predicted, confidence)) => {
                confusion.record(*expected, *predicted);
                confidence_sum += confidence;
            }
            None => failed += 1,
        }
    }
    let evaluated = confusion.total();

    let report = ValidationReport {
        sources: paths.iter().map(|p| p.display().to_string()).collect(),
        seed: options.seed,
        requested: options.samples,
        evaluated,
        failed,
        methods,
        confusion,
        accuracy: confusion.accuracy(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        mean_confidence: if evaluated == 0 {
            0.0
        } else {
            confidence_sum / evaluated as f64
        },
    };
    tracing::info!("Validated {} samples in {:.2?}", evaluated, start.elapsed());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}
