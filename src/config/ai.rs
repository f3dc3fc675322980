//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// OpenAI chat completions endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenRouter's OpenAI-compatible endpoint.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Key prefix that identifies an OpenRouter API key.
const OPENROUTER_KEY_PREFIX: &str = "sk-or-";

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// AI provider configuration
///
/// Any OpenAI-compatible chat completions service works. When no base URL
/// or model is configured they are derived from the key: OpenRouter keys
/// route to OpenRouter with its vendor-prefixed model name.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key for the completions service
    pub api_key: Option<String>,

    /// Override for the API base URL
    pub base_url: Option<String>,

    /// Override for the model name
    pub model: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Check if the key belongs to OpenRouter
    pub fn is_openrouter(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| k.starts_with(OPENROUTER_KEY_PREFIX))
    }

    /// Short name of the upstream service, for logs
    pub fn provider_name(&self) -> &'static str {
        if self.is_openrouter() {
            "openrouter"
        } else {
            "openai"
        }
    }

    /// Base URL to send requests to
    pub fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ if self.is_openrouter() => OPENROUTER_BASE_URL.to_string(),
            _ => OPENAI_BASE_URL.to_string(),
        }
    }

    /// Model name to request
    pub fn resolved_model(&self) -> String {
        match &self.model {
            Some(model) if !model.trim().is_empty() => model.clone(),
            _ if self.is_openrouter() => format!("openai/{}", DEFAULT_MODEL),
            _ => DEFAULT_MODEL.to_string(),
        }
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("PROJECT_INTAKE__AI__API_KEY"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout);
        }
        let base_url = self.resolved_base_url();
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(ValidationError::InvalidBaseUrl(base_url));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}
