//! External language-model classifier
//!
//! Asks an LLM for a second opinion on a code sample. Supports LM Studio
//! (default, OpenAI-compatible local server), OpenAI, Anthropic and Ollama
//! backends. Uses BYOK (bring your own key): API keys come from environment
//! variables.
//!
//! # Environment Variables
//!
//! - `LM_STUDIO_BASE_URL`, `LM_STUDIO_MODEL`, `LM_STUDIO_TIMEOUT`: LM Studio
//! - `OPENAI_API_KEY`: Required for OpenAI backend
//! - `ANTHROPIC_API_KEY`: Required for Anthropic backend
//!
//! The engine never calls a backend directly. It goes through the
//! [`ExternalAdapter`], which bounds the call by a timeout and turns every
//! failure into an unavailable method.

mod adapter;
mod client;
mod prompts;

pub use adapter::{ExternalAdapter, PendingCall};
pub use client::{AiClient, AiConfig, LlmBackend, Message, Role};
pub use prompts::{parse_verdict, ExternalVerdict, PromptTemplate};

use crate::models::Language;
use thiserror::Error;

/// Errors that can occur when talking to an external model
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type AiResult<T> = Result<T, AiError>;

/// Anything that can classify a code sample out of process.
///
/// Implementations may block; the adapter runs them on their own thread.
pub trait ExternalClassifier: Send + Sync {
    /// Short name for logs and indicators
    fn name(&self) -> &str;

    fn classify(&self, code: &str, language: Language) -> AiResult<ExternalVerdict>;
}
