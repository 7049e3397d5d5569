//! Engine configuration
//!
//! Loads configuration from `aicodechecker.toml` or `.aicodecheckerrc.json`
//! in the working directory, else from the user config at
//! `~/.config/aicodechecker/config.toml`, else defaults. Environment
//! variables override whatever was loaded.
//!
//! # Configuration Format
//!
//! ```toml
//! # aicodechecker.toml
//!
//! [corpus]
//! enabled = true
//! paths = ["data/corpus.jsonl"]
//! similarity_threshold = 0.75
//! max_neighbors = 7
//!
//! [external]
//! enabled = true
//! backend = "lmstudio"   # lmstudio | openai | anthropic | ollama
//! timeout_secs = 20
//!
//! [synthesis]
//! weights = { heuristic = 0.1, weighted = 0.4, dataset = 0.2, external = 0.3 }
//! uncertain_band = { low = 40.0, high = 60.0 }
//!
//! [scoring]
//! weight_table = "weights/tuned.json"
//!
//! [normalization]
//! line_count = { min = 1.0, max = 800.0 }
//! ```

use crate::ai::{AiConfig, LlmBackend};
use crate::corpus::{DEFAULT_MAX_NEIGHBORS, DEFAULT_SIMILARITY_THRESHOLD};
use crate::engine::{MethodWeights, UncertainBand};
use crate::error::{EngineError, EngineResult};
use crate::scoring::{Bounds, NormalizationBounds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const TOML_CONFIG: &str = "aicodechecker.toml";
pub const JSON_CONFIG: &str = ".aicodecheckerrc.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub corpus: CorpusConfig,
    pub external: ExternalConfig,
    pub synthesis: SynthesisConfig,
    pub scoring: ScoringConfig,
    /// Per-feature normalization overrides, keyed by feature name
    pub normalization: BTreeMap<String, Bounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub enabled: bool,
    pub paths: Vec<PathBuf>,
    pub similarity_threshold: f64,
    pub max_neighbors: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            paths: Vec::new(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub enabled: bool,
    pub backend: LlmBackend,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: f64,
    pub max_tokens: u32,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: LlmBackend::default(),
            base_url: None,
            model: None,
            timeout_secs: 60.0,
            max_tokens: 256,
        }
    }
}

/// Longest external deadline accepted, in seconds
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

impl ExternalConfig {
    pub fn timeout(&self) -> EngineResult<Duration> {
        Duration::try_from_secs_f64(self.timeout_secs).map_err(|e| {
            EngineError::InvalidInput(format!(
                "external.timeout_secs {} is not a valid duration: {e}",
                self.timeout_secs
            ))
        })
    }

    pub fn ai_config(&self) -> EngineResult<AiConfig> {
        Ok(AiConfig {
            backend: self.backend,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            max_tokens: self.max_tokens,
            timeout: self.timeout()?,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub weights: MethodWeights,
    pub uncertain_band: UncertainBand,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight table JSON replacing the built-in one
    pub weight_table: Option<PathBuf>,
}

/// Commented starting point written by `aicodechecker init`
pub const EXAMPLE_CONFIG: &str = r#"# aicodechecker configuration

[corpus]
# Labeled reference samples (JSON Lines or JSON array). Loading fails hard
# when enabled and a file is missing or malformed.
enabled = false
paths = []
similarity_threshold = 0.75
max_neighbors = 7

[external]
# Optional second opinion from a language model.
enabled = false
backend = "lmstudio"   # lmstudio | openai | anthropic | ollama
# base_url = "http://localhost:1234/v1"
# model = "codellama-7b-instruct"
timeout_secs = 60
max_tokens = 256

[synthesis]
weights = { heuristic = 0.1, weighted = 0.4, dataset = 0.2, external = 0.3 }
uncertain_band = { low = 40.0, high = 60.0 }

[scoring]
# weight_table = "weights/tuned.json"

[normalization]
# line_count = { min = 1.0, max = 800.0 }
"#;

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON file
fn load_json_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    Ok(config)
}

fn load_any(path: &Path) -> anyhow::Result<EngineConfig> {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    {
        load_json_config(path)
    } else {
        load_toml_config(path)
    }
}

impl EngineConfig {
    /// Get the user config path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aicodechecker").join("config.toml"))
    }

    /// Discover a config for `dir`. Unreadable files are skipped with a
    /// warning; environment overrides are applied last.
    pub fn discover(dir: &Path) -> Self {
        let candidates = [dir.join(TOML_CONFIG), dir.join(JSON_CONFIG)]
            .into_iter()
            .chain(Self::user_config_path());

        let mut config = None;
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match load_any(&path) {
                Ok(c) => {
                    debug!("Loaded config from {}", path.display());
                    config = Some(c);
                    break;
                }
                Err(e) => warn!("Failed to load {}: {}", path.display(), e),
            }
        }

        let mut config = config.unwrap_or_else(|| {
            debug!("No config found, using defaults");
            EngineConfig::default()
        });
        config.apply_env();
        config
    }

    /// Load an explicitly named config file. Failure is an error here.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let mut config = load_any(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (process environment in practice)
    pub fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if self.external.backend == LlmBackend::LmStudio {
            if let Some(url) = get("LM_STUDIO_BASE_URL") {
                self.external.base_url = Some(url);
            }
            if let Some(model) = get("LM_STUDIO_MODEL") {
                self.external.model = Some(model);
            }
        }
        if let Some(timeout) = get("LM_STUDIO_TIMEOUT") {
            match timeout.trim().parse::<f64>() {
                Ok(secs) => self.external.timeout_secs = secs,
                Err(_) => warn!("Ignoring LM_STUDIO_TIMEOUT={}: not a number", timeout),
            }
        }
        if let Some(paths) = get("AICODECHECKER_CORPUS") {
            self.corpus.paths = std::env::split_paths(&paths).collect();
            self.corpus.enabled = true;
        }
    }

    /// Check every calibration value. Errors are `InvalidInput`.
    pub fn validate(&self) -> EngineResult<()> {
        self.synthesis.weights.validate()?;
        self.synthesis.uncertain_band.validate()?;
        self.normalization_bounds()?;

        let t = self.external.timeout_secs;
        if !t.is_finite() || t <= 0.0 || t > MAX_TIMEOUT_SECS {
            return Err(EngineError::InvalidInput(format!(
                "external.timeout_secs must be within (0, {MAX_TIMEOUT_SECS}], got {t}"
            )));
        }
        if !(0.0..=1.0).contains(&self.corpus.similarity_threshold) {
            return Err(EngineError::InvalidInput(format!(
                "corpus.similarity_threshold must be within [0, 1], got {}",
                self.corpus.similarity_threshold
            )));
        }
        if self.corpus.max_neighbors == 0 {
            return Err(EngineError::InvalidInput(
                "corpus.max_neighbors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn normalization_bounds(&self) -> EngineResult<NormalizationBounds> {
        NormalizationBounds::with_overrides(&self.normalization)
    }
}
