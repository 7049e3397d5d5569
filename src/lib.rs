//! aicodechecker - code provenance classification
//!
//! Decides whether a snippet was AI-generated or human-written. Several
//! independent methods score the snippet (a heuristic table, a weighted
//! feature model, a labeled corpus and an optional external language model)
//! and a synthesizer merges their opinions into one verdict.
//!
//! ```no_run
//! use aicodechecker::{AnalysisRequest, Engine};
//!
//! let engine = Engine::builder().build()?;
//! let result = engine.analyze(&AnalysisRequest::new("def f(x):\n    return x\n"))?;
//! println!("{} ({:.1})", result.label, result.score);
//! # Ok::<(), aicodechecker::EngineError>(())
//! ```

pub mod ai;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod features;
pub mod models;
pub mod reporters;
pub mod scoring;

pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use models::{AnalysisRequest, DetectionResult, Label, Language, Method};
