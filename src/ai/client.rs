//! LLM API client supporting LM Studio, OpenAI, Anthropic and Ollama
//!
//! Provides a unified interface for making chat calls to different LLM
//! providers. Uses ureq (sync HTTP), no async runtime needed.

use super::prompts::{parse_verdict, ExternalVerdict, PromptTemplate};
use super::{AiError, AiResult, ExternalClassifier};
use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    #[default]
    #[serde(alias = "lm-studio", alias = "lm_studio")]
    LmStudio,
    #[serde(alias = "open-ai")]
    OpenAi,
    Anthropic,
    Ollama,
}

impl LlmBackend {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "lmstudio" | "lm-studio" | "lm_studio" => Some(LlmBackend::LmStudio),
            "openai" | "open-ai" => Some(LlmBackend::OpenAi),
            "anthropic" => Some(LlmBackend::Anthropic),
            "ollama" => Some(LlmBackend::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::LmStudio => "lmstudio",
            LlmBackend::OpenAi => "openai",
            LlmBackend::Anthropic => "anthropic",
            LlmBackend::Ollama => "ollama",
        }
    }

    pub fn env_key(&self) -> Option<&'static str> {
        match self {
            LlmBackend::OpenAi => Some("OPENAI_API_KEY"),
            LlmBackend::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmBackend::LmStudio | LlmBackend::Ollama => None,
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::LmStudio => "https://lmstudio.ai (no key needed, just run locally)",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
            LlmBackend::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::LmStudio => {
                "TheBloke/CodeLlama-7B-Instruct-GGUF/codellama-7b-instruct.Q4_K_S.gguf"
            }
            LlmBackend::OpenAi => "gpt-4o-mini",
            LlmBackend::Anthropic => "claude-3-5-haiku-latest",
            LlmBackend::Ollama => "codellama:7b-instruct",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmBackend::LmStudio => "http://localhost:1234/v1",
            LlmBackend::OpenAi => "https://api.openai.com/v1",
            LlmBackend::Anthropic => "https://api.anthropic.com/v1",
            LlmBackend::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self, LlmBackend::Anthropic)
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            base_url: None,
            max_tokens: 256,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
            .trim_end_matches('/')
    }

    pub fn endpoint(&self) -> String {
        if self.backend.is_openai_compatible() {
            format!("{}/chat/completions", self.base_url())
        } else {
            format!("{}/messages", self.base_url())
        }
    }
}

/// Unified LLM client: sync HTTP via ureq
pub struct AiClient {
    config: AiConfig,
    api_key: Option<String>,
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl AiClient {
    pub fn new(config: AiConfig, api_key: Option<String>) -> Self {
        let agent = make_agent(config.timeout);
        Self {
            config,
            api_key,
            agent,
        }
    }

    pub fn from_env_with_config(config: AiConfig) -> AiResult<Self> {
        let Some(env_key) = config.backend.env_key() else {
            return Ok(Self::new(config, None));
        };
        let api_key = env::var(env_key)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::MissingApiKey {
                env_var: env_key.to_string(),
                signup_url: config.backend.signup_url().to_string(),
            })?;
        Ok(Self::new(config, Some(api_key)))
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// Generate a response (sync)
    pub fn generate(&self, messages: Vec<Message>, system: Option<&str>) -> AiResult<String> {
        if self.config.backend.is_openai_compatible() {
            self.generate_openai(messages, system)
        } else {
            self.generate_anthropic(messages, system)
        }
    }

    fn generate_openai(&self, mut messages: Vec<Message>, system: Option<&str>) -> AiResult<String> {
        if let Some(sys) = system {
            messages.insert(0, Message::system(sys));
        }

        let body = OpenAiRequest {
            model: self.config.model().to_string(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let mut req = self
            .agent
            .post(&self.config.endpoint())
            .header("Content-Type", "application/json");

        if let Some(key) = &self.api_key {
            req = req.header("Authorization", &format!("Bearer {key}"));
        }

        let response = req
            .send_json(&body)
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: OpenAiResponse = response
            .into_body()
            .read_json()
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AiError::ParseError("No response choices".to_string()))
    }

    fn generate_anthropic(&self, messages: Vec<Message>, system: Option<&str>) -> AiResult<String> {
        let messages: Vec<_> = messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();

        let body = AnthropicRequest {
            model: self.config.model().to_string(),
            max_tokens: self.config.max_tokens,
            messages,
            system: system.map(|s| s.to_string()),
            temperature: Some(self.config.temperature),
        };

        let response = self
            .agent
            .post(&self.config.endpoint())
            .header("Content-Type", "application/json")
            .header("x-api-key", self.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", "2023-06-01")
            .send_json(&body)
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: AnthropicResponse = response
            .into_body()
            .read_json()
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        resp.content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or_else(|| AiError::ParseError("No text content in response".to_string()))
    }
}

impl ExternalClassifier for AiClient {
    fn name(&self) -> &str {
        self.config.backend.as_str()
    }

    fn classify(&self, code: &str, language: Language) -> AiResult<ExternalVerdict> {
        let reply = self.generate(
            vec![Message::user(PromptTemplate::user_prompt(code, language))],
            Some(PromptTemplate::system_prompt()),
        )?;
        Ok(parse_verdict(&reply))
    }
}

// OpenAI-compatible API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}

// Anthropic API types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults() {
        assert_eq!(LlmBackend::default(), LlmBackend::LmStudio);
        assert_eq!(
            LlmBackend::LmStudio.default_base_url(),
            "http://localhost:1234/v1"
        );
        assert!(LlmBackend::Ollama.is_openai_compatible());
        assert!(!LlmBackend::Anthropic.is_openai_compatible());
        assert_eq!(LlmBackend::from_name("LM-Studio"), Some(LlmBackend::LmStudio));
        assert_eq!(LlmBackend::from_name("bard"), None);
    }

    #[test]
    fn test_config_endpoint() {
        let config = AiConfig {
            base_url: Some("http://127.0.0.1:9000/v1/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "http://127.0.0.1:9000/v1/chat/completions");

        let config = AiConfig {
            backend: LlmBackend::Anthropic,
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_config_model() {
        let config = AiConfig {
            model: Some("custom-model".to_string()),
            ..Default::default()
        };
        assert_eq!(config.model(), "custom-model");
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_local_backends_need_no_key() {
        let client = AiClient::from_env_with_config(AiConfig::default()).unwrap();
        assert_eq!(client.name(), "lmstudio");
    }
}
