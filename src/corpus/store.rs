//! Dataset Pattern Store
//!
//! Built once from one or more corpus files and read-only afterwards, so it
//! can be shared between requests behind an `Arc` without locking.
//!
//! Two indexes are kept:
//! - signature index: `FeatureSignature` bucket -> sample ids, for
//!   near-constant neighbour lookup as the corpus grows
//! - shingle table: xxh3 hash of an abstracted code line -> how many human and
//!   AI samples contain that line shape

use super::loader::{self, CorpusSample};
use super::signature::{FeatureSignature, Probe};
use crate::error::{EngineError, EngineResult};
use crate::features::{self, source::SourceView, tokens};
use crate::models::{Language, OriginClass, PatternMatch};
use crate::scoring::NormalizationBounds;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use xxhash_rust::xxh3::xxh3_64;

/// Code lines with fewer tokens are too generic to fingerprint
const MIN_SHINGLE_TOKENS: usize = 5;

#[derive(Debug, Clone)]
struct Entry {
    class: OriginClass,
    language: Language,
    probe: Probe,
    chars: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShingleCounts {
    pub human: u32,
    pub ai: u32,
}

/// How a query's line shapes overlap the corpus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShingleEvidence {
    /// Query shingles considered
    pub total: usize,
    /// Seen only in AI samples
    pub ai_only: usize,
    /// Seen only in human samples
    pub human_only: usize,
}

impl ShingleEvidence {
    pub fn discriminative(&self) -> usize {
        self.ai_only + self.human_only
    }

    /// AI share of the discriminative hits, in [0, 1]
    pub fn ai_share(&self) -> Option<f64> {
        let hits = self.discriminative();
        (hits > 0).then(|| self.ai_only as f64 / hits as f64)
    }
}

/// Corpus statistics
#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub samples: usize,
    pub by_class: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
    pub mean_code_chars: f64,
    pub signatures: usize,
    pub shingles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<usize>,
    pub digest: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Default)]
pub struct PatternStore {
    entries: Vec<Entry>,
    index: FxHashMap<FeatureSignature, Vec<u32>>,
    shingles: FxHashMap<u64, ShingleCounts>,
    bounds: NormalizationBounds,
    digest: String,
    embedding_dim: Option<usize>,
    sources: Vec<PathBuf>,
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hashes of the abstracted code lines of a snippet, deduplicated
pub fn shingle_hashes(code: &str, language: Language) -> FxHashSet<u64> {
    let view = SourceView::scan(code, language);
    view.code_lines()
        .filter_map(|(_, line)| {
            let toks = tokens::tokenize_line(&line.code);
            if toks.len() < MIN_SHINGLE_TOKENS {
                return None;
            }
            let shape: Vec<&str> = toks.iter().map(|t| t.abstract_form()).collect();
            Some(xxh3_64(shape.join(" ").as_bytes()))
        })
        .collect()
}

impl PatternStore {
    /// A store with no samples. The dataset method treats it as unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and index corpus files. Any unreadable or invalid file fails the
    /// whole load.
    pub fn load(paths: &[PathBuf], bounds: NormalizationBounds) -> EngineResult<Self> {
        let start = Instant::now();
        if paths.is_empty() {
            return Err(EngineError::corpus(
                PathBuf::new(),
                "no corpus paths configured",
            ));
        }

        let mut samples = Vec::new();
        let mut digests = Vec::with_capacity(paths.len());
        let mut embedding_dim: Option<usize> = None;
        for path in paths {
            let loaded = loader::load_file(path)?;
            if let Some(dim) = loader::embedding_dimension(path, &loaded.samples)? {
                match embedding_dim {
                    Some(existing) if existing != dim => {
                        return Err(EngineError::corpus(
                            path,
                            format!("embedding dimension {dim} differs from {existing} in earlier files"),
                        ))
                    }
                    _ => embedding_dim = Some(dim),
                }
            }
            digests.push(loaded.digest);
            samples.extend(loaded.samples);
        }

        let digest = if digests.len() == 1 {
            hex(&digests[0])
        } else {
            let mut hasher = Sha256::new();
            for d in &digests {
                hasher.update(d);
            }
            hex(&hasher.finalize())
        };

        let mut store = Self::from_samples(&samples, bounds);
        store.digest = digest;
        store.embedding_dim = embedding_dim;
        store.sources = paths.to_vec();

        tracing::info!(
            "Loaded corpus: {} samples, {} signatures, {} shingles in {:.2?} (sha256 {})",
            store.len(),
            store.index.len(),
            store.shingles.len(),
            start.elapsed(),
            &store.digest[..12.min(store.digest.len())]
        );
        Ok(store)
    }

    /// Index already-validated samples. Feature extraction runs in parallel.
    pub fn from_samples(samples: &[CorpusSample], bounds: NormalizationBounds) -> Self {
        let built: Vec<(Entry, FxHashSet<u64>)> = samples
            .par_iter()
            .map(|s| {
                let fv = features::extract(&s.code, s.language);
                let entry = Entry {
                    class: s.class.clone(),
                    language: s.language,
                    probe: Probe::of(&fv, &bounds),
                    chars: s.code.chars().count(),
                };
                (entry, shingle_hashes(&s.code, s.language))
            })
            .collect();

        let mut index: FxHashMap<FeatureSignature, Vec<u32>> = FxHashMap::default();
        let mut shingles: FxHashMap<u64, ShingleCounts> = FxHashMap::default();
        let mut entries = Vec::with_capacity(built.len());
        for (id, (entry, hashes)) in built.into_iter().enumerate() {
            // Unknown rows only count towards the summary
            if !entry.class.votes() {
                entries.push(entry);
                continue;
            }
            index
                .entry(entry.probe.signature)
                .or_default()
                .push(id as u32);
            for h in hashes {
                let counts = shingles.entry(h).or_default();
                if entry.class.is_ai() {
                    counts.ai += 1;
                } else {
                    counts.human += 1;
                }
            }
            entries.push(entry);
        }

        let mut hasher = Sha256::new();
        for s in samples {
            hasher.update(s.code.as_bytes());
            hasher.update(s.class.as_str().as_bytes());
        }

        Self {
            entries,
            index,
            shingles,
            bounds,
            digest: hex(&hasher.finalize()),
            embedding_dim: None,
            sources: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hex SHA-256 identifying the corpus version
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn bounds(&self) -> &NormalizationBounds {
        &self.bounds
    }

    /// Nearest stored samples in the probe's signature neighbourhood, at or
    /// above `threshold` similarity, strongest first
    pub fn lookup(&self, probe: &Probe, threshold: f64, max_neighbors: usize) -> Vec<PatternMatch> {
        let mut candidates: Vec<(u32, f64)> = probe
            .signature
            .neighborhood()
            .filter_map(|sig| self.index.get(&sig))
            .flatten()
            .map(|&id| (id, probe.similarity(&self.entries[id as usize].probe)))
            .filter(|&(_, sim)| sim >= threshold)
            .collect();

        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        candidates.truncate(max_neighbors);

        candidates
            .into_iter()
            .map(|(id, sim)| {
                let entry = &self.entries[id as usize];
                PatternMatch {
                    class: entry.class.clone(),
                    indicator: format!(
                        "resembles corpus sample #{id} ({}, {}, similarity {:.2})",
                        entry.class, entry.language, sim
                    ),
                    strength: sim,
                }
            })
            .collect()
    }

    /// Overlap between the query's line shapes and the corpus
    pub fn shingle_evidence(&self, code: &str, language: Language) -> ShingleEvidence {
        let hashes = shingle_hashes(code, language);
        let mut evidence = ShingleEvidence {
            total: hashes.len(),
            ..Default::default()
        };
        for h in hashes {
            match self.shingles.get(&h) {
                Some(c) if c.ai > 0 && c.human == 0 => evidence.ai_only += 1,
                Some(c) if c.human > 0 && c.ai == 0 => evidence.human_only += 1,
                _ => {}
            }
        }
        evidence
    }

    pub fn summary(&self) -> CorpusSummary {
        let mut by_class = BTreeMap::new();
        let mut by_language = BTreeMap::new();
        for e in &self.entries {
            *by_class.entry(e.class.to_string()).or_insert(0) += 1;
            *by_language.entry(e.language.to_string()).or_insert(0) += 1;
        }
        let total_chars: usize = self.entries.iter().map(|e| e.chars).sum();
        CorpusSummary {
            samples: self.len(),
            by_class,
            by_language,
            mean_code_chars: if self.is_empty() {
                0.0
            } else {
                total_chars as f64 / self.len() as f64
            },
            signatures: self.index.len(),
            shingles: self.shingles.len(),
            embedding_dim: self.embedding_dim,
            digest: self.digest.clone(),
            sources: self
                .sources
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }
    }
}
