//! Labeled reference corpus: loading, indexing and matching
//!
//! The [`PatternStore`] is built once (fails fast on a bad corpus) and shared
//! read-only between requests. The [`DatasetMatcher`] queries it per request.

pub mod fingerprints;
pub mod loader;
mod matcher;
pub mod signature;
mod store;

pub use loader::{coerce_label, CorpusSample};
pub use matcher::{DatasetMatch, DatasetMatcher, DEFAULT_MAX_NEIGHBORS, DEFAULT_SIMILARITY_THRESHOLD};
pub use signature::{FeatureSignature, Probe};
pub use store::{CorpusSummary, PatternStore, ShingleEvidence};
