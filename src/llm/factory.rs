//! Oracle construction from configuration

use super::openai::{Endpoint, OpenAIService};
use super::{LlmService, LoggingService};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_AZURE_API_VERSION: &str = "2023-07-01-preview";
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported API type: {0} (expected 'openai' or 'azure')")]
    UnsupportedApiType(String),
    #[error("Missing configuration: {0}")]
    Missing(&'static str),
    #[error("Failed to build LLM client: {0}")]
    Client(String),
}

/// Which flavour of chat-completions API the credentials belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiType {
    #[default]
    OpenAI,
    Azure,
}

impl ApiType {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiType::OpenAI => "openai",
            ApiType::Azure => "azure",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "openai" => Ok(ApiType::OpenAI),
            "azure" => Ok(ApiType::Azure),
            other => Err(ConfigError::UnsupportedApiType(other.to_string())),
        }
    }
}

/// Credentials and sampling settings for the oracle.
///
/// The values are passed through to the HTTP client untouched; nothing in the
/// game logic looks at them.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub api_type: ApiType,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub api_version: Option<String>,
    pub deployment_name: Option<String>,
    /// Model name for the direct `OpenAI` API
    pub model: Option<String>,
    pub temperature: f32,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let api_type = non_empty("OPENAI_API_TYPE")
            .map(|v| v.parse::<ApiType>())
            .transpose()?
            .unwrap_or_default();

        let temperature = non_empty("LLM_TEMPERATURE")
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.0);

        Ok(Self {
            api_type,
            api_key: non_empty("OPENAI_API_KEY"),
            api_base: non_empty("OPENAI_API_BASE"),
            api_version: non_empty("OPENAI_API_VERSION"),
            deployment_name: non_empty("DEPLOYMENT_NAME"),
            model: non_empty("OPENAI_MODEL"),
            temperature: clamp_temperature(temperature),
        })
    }

    fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        match self.api_type {
            ApiType::OpenAI => Ok(Endpoint::OpenAI {
                base_url: self.api_base.clone(),
                model: self
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            }),
            ApiType::Azure => Ok(Endpoint::Azure {
                api_base: self
                    .api_base
                    .clone()
                    .ok_or(ConfigError::Missing("OPENAI_API_BASE"))?,
                deployment: self
                    .deployment_name
                    .clone()
                    .ok_or(ConfigError::Missing("DEPLOYMENT_NAME"))?,
                api_version: self
                    .api_version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            }),
        }
    }
}

/// Temperatures outside [0, 1] are clamped; NaN falls back to 0
pub fn clamp_temperature(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Build the oracle described by `config`, wrapped with request logging
pub fn create_service(config: &LlmConfig) -> Result<Arc<dyn LlmService>, ConfigError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
    let endpoint = config.endpoint()?;

    let service = OpenAIService::new(api_key, endpoint, HTTP_TIMEOUT)
        .map_err(|e| ConfigError::Client(e.message))?;

    Ok(Arc::new(LoggingService::new(Arc::new(service))))
}
