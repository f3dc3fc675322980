//! Project chat configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::streaming::EmissionGranularity;

/// Project chat configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Replaces the default assistant persona
    pub system_prompt: Option<String>,

    /// Replaces the default field guidance block
    pub guidance: Option<String>,

    /// Sampling temperature passed upstream
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// How reply text is cut into content events
    #[serde(default)]
    pub granularity: EmissionGranularity,

    /// Longest accepted user message, in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

impl ChatConfig {
    /// Validate chat configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }
        if self.max_message_chars == 0 {
            return Err(ValidationError::InvalidMessageLimit);
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            guidance: None,
            temperature: default_temperature(),
            granularity: EmissionGranularity::default(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_message_chars() -> usize {
    10_000
}
