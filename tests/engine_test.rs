//! Engine-level tests
//!
//! Exercise the public library API end to end:
//! - Human-style and AI-style snippets land on the right side
//! - Degradation when methods are missing or fail
//! - Determinism, range and error behavior
//! - Corpus-backed dataset matching

use aicodechecker::ai::{AiError, AiResult, ExternalClassifier, ExternalVerdict};
use aicodechecker::config::EngineConfig;
use aicodechecker::corpus::PatternStore;
use aicodechecker::scoring::NormalizationBounds;
use aicodechecker::{AnalysisRequest, Engine, EngineError, Label, Language, Method};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("fixture exists")
}

fn python(code: impl Into<String>) -> AnalysisRequest {
    AnalysisRequest::new(code).with_language("python")
}

/// External model stub with a canned opinion
struct Fixed(f64);

impl ExternalClassifier for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    fn classify(&self, _code: &str, _language: Language) -> AiResult<ExternalVerdict> {
        Ok(ExternalVerdict {
            label: Label::from_score(self.0),
            score: self.0,
            explanation: "canned verdict".to_string(),
            fallback: false,
        })
    }
}

struct Down;

impl ExternalClassifier for Down {
    fn name(&self) -> &str {
        "down"
    }

    fn classify(&self, _code: &str, _language: Language) -> AiResult<ExternalVerdict> {
        Err(AiError::RequestFailed("connection refused".to_string()))
    }
}

struct Sleepy;

impl ExternalClassifier for Sleepy {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn classify(&self, code: &str, language: Language) -> AiResult<ExternalVerdict> {
        thread::sleep(Duration::from_secs(3));
        Fixed(99.0).classify(code, language)
    }
}

fn engine_with(classifier: Arc<dyn ExternalClassifier>, timeout: Duration) -> Engine {
    Engine::builder()
        .with_external(classifier, timeout)
        .build()
        .expect("engine builds")
}

fn corpus_engine() -> Engine {
    let store = PatternStore::load(&[fixture("corpus.jsonl")], NormalizationBounds::default())
        .expect("fixture corpus loads");
    Engine::builder()
        .with_store(Arc::new(store))
        .build()
        .expect("engine builds")
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scrappy_code_scores_human() {
    let engine = Engine::builder().build().unwrap();
    let result = engine.analyze(&python(read_fixture("scrappy.py"))).unwrap();

    let heuristic = result.method(Method::Heuristic).unwrap();
    let weighted = result.method(Method::Weighted).unwrap();
    assert!(heuristic.score < 40.0, "heuristic {}", heuristic.score);
    assert!(weighted.score < 40.0, "weighted {}", weighted.score);
    assert_eq!(result.label, Label::Human);
    assert!(result.has_indicator("duplicate lines"));
}

#[test]
fn test_documented_code_scores_ai() {
    let engine = Engine::builder().build().unwrap();
    let result = engine.analyze(&python(read_fixture("documented.py"))).unwrap();

    assert!(result.score > 70.0, "score {}", result.score);
    assert_eq!(result.label, Label::Ai);
    assert_eq!(result.metrics.function_count, 3);
    assert_eq!(result.metrics.doc_coverage, 1.0);
    assert_eq!(result.metrics.indent_width, 4);
}

#[test]
fn test_unavailable_external_and_empty_store() {
    let engine = engine_with(Arc::new(Down), Duration::from_secs(5));
    let result = engine.analyze(&python(read_fixture("documented.py"))).unwrap();

    assert_eq!(result.methods.len(), 2);
    let h = result.method(Method::Heuristic).unwrap().score;
    let w = result.method(Method::Weighted).unwrap().score;
    let expected = (1.0 - (h - w).abs() / 2.0 / 50.0).clamp(0.0, 1.0);
    assert!((result.confidence - expected).abs() < 1e-9);
    let expected_score = (0.1 * h + 0.4 * w) / 0.5;
    assert!((result.score - expected_score).abs() < 1e-9);
    assert!(result.has_indicator("external: unavailable"));
    assert!(result.has_indicator("dataset: unavailable (disabled, no corpus configured)"));
}

#[test]
fn test_renamed_variables_score_alike() {
    let original = read_fixture("documented.py");
    let renamed = original
        .replace("file_path", "source_path")
        .replace("config_file", "settings_file")
        .replace("entry_list", "line_items")
        .replace("total_count", "running_total")
        .replace("entry_line", "line_text")
        .replace("base_dir", "root_folder")
        .replace("file_name", "leaf_name");
    assert_ne!(original, renamed);

    let engine = Engine::builder().build().unwrap();
    let a = engine.analyze(&python(original)).unwrap();
    let b = engine.analyze(&python(renamed)).unwrap();
    assert!((a.score - b.score).abs() <= 2.0, "{} vs {}", a.score, b.score);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_scores_stay_in_range() {
    let engine = Engine::builder().build().unwrap();
    let inputs = [
        "x",
        "}}}}",
        "\t\t\tfoo()   \n\n\n",
        "/* never closed",
        "SELECT * FROM users;",
        "fn main() { println!(\"hi\"); }",
    ];
    for code in inputs {
        let result = engine.analyze(&AnalysisRequest::new(code)).unwrap();
        assert!((0.0..=100.0).contains(&result.score), "{code:?}");
        assert!((0.0..=1.0).contains(&result.confidence), "{code:?}");
        for m in &result.methods {
            assert!((0.0..=100.0).contains(&m.score));
        }
    }
}

#[test]
fn test_repeated_calls_are_identical() {
    let engine = engine_with(Arc::new(Fixed(70.0)), Duration::from_secs(5));
    let request = python(read_fixture("scrappy.py"));
    let first = engine.analyze(&request).unwrap();
    let second = engine.analyze(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_external_never_overrides_weighted_label() {
    let request = python(read_fixture("scrappy.py"));
    let without = Engine::builder().build().unwrap().analyze(&request).unwrap();
    let with = engine_with(Arc::new(Fixed(99.0)), Duration::from_secs(5))
        .analyze(&request)
        .unwrap();

    assert_eq!(with.method(Method::External).unwrap().label, Label::Ai);
    assert_eq!(without.label, with.label);
    assert!(with.score > without.score);
}

#[test]
fn test_external_anchors_without_weighted() {
    let engine = engine_with(Arc::new(Fixed(95.0)), Duration::from_secs(5));
    let request = python(read_fixture("scrappy.py"))
        .with_methods([Method::Heuristic, Method::External]);
    let result = engine.analyze(&request).unwrap();
    assert_eq!(result.label, Label::Ai);
    assert!(result.has_indicator("fixed: canned verdict"));
}

#[test]
fn test_empty_code_is_invalid_input() {
    let engine = Engine::builder().build().unwrap();
    for code in ["", "   \n\t\n"] {
        match engine.analyze(&AnalysisRequest::new(code)) {
            Err(e @ EngineError::InvalidInput(_)) => {
                assert_eq!(e.report().message, "invalid input: code must not be empty");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}

#[test]
fn test_unsupported_language_is_invalid_input() {
    let engine = Engine::builder().build().unwrap();
    let request = AnalysisRequest::new("IDENTIFICATION DIVISION.").with_language("cobol");
    assert!(matches!(
        engine.analyze(&request),
        Err(EngineError::InvalidInput(_))
    ));
}

#[test]
fn test_broken_code_completes_with_warning() {
    let engine = Engine::builder().build().unwrap();
    let result = engine.analyze(&python(read_fixture("broken.py"))).unwrap();
    assert!(result.has_indicator("extraction degraded"));
    assert_eq!(result.methods.len(), 2);
    assert!(result.indicators[0].starts_with("extraction degraded"));
}

#[test]
fn test_missing_corpus_is_fatal() {
    let mut config = EngineConfig::default();
    config.corpus.enabled = true;
    config.corpus.paths = vec![fixture("does-not-exist.jsonl")];
    match Engine::from_config(&config) {
        Err(EngineError::CorpusLoad { path, .. }) => {
            assert!(path.ends_with("does-not-exist.jsonl"));
        }
        other => panic!("expected CorpusLoad, got {other:?}"),
    }
}

#[test]
fn test_huge_external_timeout_is_config_error() {
    let mut config = EngineConfig::default();
    config.external.enabled = true;
    config.external.timeout_secs = 1e30;
    match Engine::from_config(&config) {
        Err(e @ EngineError::InvalidInput(_)) => {
            assert!(e.to_string().contains("timeout_secs"));
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_slow_external_is_cut_off() {
    let engine = engine_with(Arc::new(Sleepy), Duration::from_millis(200));
    let start = Instant::now();
    let result = engine.analyze(&python("def f():\n    return 1\n")).unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(result.method(Method::External).is_none());
    assert!(result.has_indicator("timed out"));
}

// ============================================================================
// Corpus
// ============================================================================

#[test]
fn test_corpus_match_names_generator() {
    let engine = corpus_engine();
    assert_eq!(engine.store().len(), 6);

    let result = engine.analyze(&python(read_fixture("documented.py"))).unwrap();
    let dataset = result.method(Method::Dataset).unwrap();
    assert_eq!(dataset.label, Label::Ai);
    assert_eq!(result.likely_generator.as_deref(), Some("gemini"));
    assert!(result.has_indicator("resembles corpus sample"));
}

#[test]
fn test_from_config_loads_corpus() {
    let mut config = EngineConfig::default();
    config.corpus.enabled = true;
    config.corpus.paths = vec![fixture("corpus.jsonl")];
    let engine = Engine::from_config(&config).unwrap();
    assert_eq!(engine.store().len(), 6);
    assert_eq!(engine.store().digest().len(), 64);
}

#[test]
fn test_csv_corpus_matches_like_jsonl() {
    let store = PatternStore::load(&[fixture("corpus.csv")], NormalizationBounds::default())
        .expect("csv corpus loads");
    assert_eq!(store.len(), 7);
    assert_eq!(store.summary().by_class["unknown"], 1);
    let csv_engine = Engine::builder().with_store(Arc::new(store)).build().unwrap();

    let request = python(read_fixture("documented.py"));
    let from_csv = csv_engine.analyze(&request).unwrap();
    let from_jsonl = corpus_engine().analyze(&request).unwrap();
    assert_eq!(from_csv.likely_generator.as_deref(), Some("gemini"));
    assert_eq!(
        from_csv.method(Method::Dataset),
        from_jsonl.method(Method::Dataset)
    );
}

#[test]
fn test_batch_keeps_order_and_errors() {
    let engine = Engine::builder().build().unwrap();
    let requests = vec![
        python(read_fixture("documented.py")),
        AnalysisRequest::new(""),
        python(read_fixture("scrappy.py")),
    ];
    let outcomes = engine.analyze_batch(&requests);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].as_ref().unwrap().label, Label::Ai);
    assert!(matches!(outcomes[1], Err(EngineError::InvalidInput(_))));
    assert_eq!(outcomes[2].as_ref().unwrap().label, Label::Human);
}
