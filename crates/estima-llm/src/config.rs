//! Provider selection and model settings

use crate::ollama;
use crate::openai;
use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which backend serves embeddings and chat completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Hosted OpenAI-compatible API
    OpenAi,
}

impl ProviderKind {
    /// Configuration name of the provider
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
        }
    }

    fn default_embeddings_model(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "oscardp96/medcpt-article",
            ProviderKind::OpenAi => "text-embedding-3-small",
        }
    }

    fn default_gen_model(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "gpt-oss",
            ProviderKind::OpenAi => "gpt-4o-mini",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(LlmError::Configuration(format!(
                "Unsupported provider '{}' (expected 'ollama' or 'openai')",
                other
            ))),
        }
    }
}

/// Provider configuration
///
/// Model names left unset resolve to provider-specific defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Selected backend
    pub provider: ProviderKind,

    /// Embedding model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings_model: Option<String>,

    /// Requested embedding dimension (OpenAI only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings_dimension: Option<usize>,

    /// Chat model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gen_model: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token budget
    pub max_tokens: u32,

    /// Ollama endpoint
    pub ollama_url: String,

    /// OpenAI API key (required for the OpenAI provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible base URL
    pub openai_base_url: String,

    /// Per-request HTTP timeout (seconds)
    pub request_timeout_secs: u64,

    /// Attempts per request before giving up
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            embeddings_model: None,
            embeddings_dimension: None,
            gen_model: None,
            temperature: 0.1,
            max_tokens: 2000,
            ollama_url: "localhost:11434".to_string(),
            openai_api_key: None,
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: ollama::DEFAULT_TIMEOUT_SECS,
            max_retries: ollama::DEFAULT_MAX_RETRIES,
        }
    }
}

impl ProviderConfig {
    /// Embedding model, falling back to the provider default
    pub fn embeddings_model(&self) -> &str {
        non_blank(&self.embeddings_model).unwrap_or(self.provider.default_embeddings_model())
    }

    /// Chat model, falling back to the provider default
    pub fn gen_model(&self) -> &str {
        non_blank(&self.gen_model).unwrap_or(self.provider.default_gen_model())
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// `LlmError::Configuration` naming the offending setting
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.provider == ProviderKind::OpenAi && non_blank(&self.openai_api_key).is_none() {
            return Err(LlmError::Configuration(
                "OPENAI_API_KEY is required when using the OpenAI provider".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(LlmError::Configuration(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::Configuration(format!(
                "temperature {} out of range [0.0, 2.0]",
                self.temperature
            )));
        }
        if self.embeddings_dimension == Some(0) {
            return Err(LlmError::Configuration(
                "EMBEDDINGS_DIMENSION must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ProviderConfig {
    /// Human-readable summary with the API key masked
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Provider:          {}", self.provider.as_str())?;
        writeln!(f, "Embeddings model:  {}", self.embeddings_model())?;
        writeln!(f, "Generation model:  {}", self.gen_model())?;
        match self.provider {
            ProviderKind::Ollama => writeln!(f, "Ollama URL:        {}", self.ollama_url)?,
            ProviderKind::OpenAi => {
                writeln!(f, "Base URL:          {}", self.openai_base_url)?;
                let key = if non_blank(&self.openai_api_key).is_some() {
                    "set"
                } else {
                    "missing"
                };
                writeln!(f, "API key:           {}", key)?;
            }
        }
        writeln!(f, "Temperature:       {}", self.temperature)?;
        write!(f, "Max tokens:        {}", self.max_tokens)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ProviderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embeddings_model(), "oscardp96/medcpt-article");
        assert_eq!(config.gen_model(), "gpt-oss");
    }

    #[test]
    fn test_openai_defaults() {
        let config = ProviderConfig {
            provider: ProviderKind::OpenAi,
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.embeddings_model(), "text-embedding-3-small");
        assert_eq!(config.gen_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = ProviderConfig {
            provider: ProviderKind::OpenAi,
            openai_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_explicit_models_override_defaults() {
        let config = ProviderConfig {
            embeddings_model: Some("nomic-embed-text".to_string()),
            gen_model: Some("llama3".to_string()),
            ..Default::default()
        };
        assert_eq!(config.embeddings_model(), "nomic-embed-text");
        assert_eq!(config.gen_model(), "llama3");
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("anthropic".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_display_masks_api_key() {
        let config = ProviderConfig {
            provider: ProviderKind::OpenAi,
            openai_api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let summary = config.to_string();
        assert!(!summary.contains("sk-secret"));
        assert!(summary.contains("API key:           set"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ProviderConfig {
            provider: ProviderKind::OpenAi,
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("provider = \"openai\""));

        let parsed: ProviderConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, ProviderKind::OpenAi);
        assert_eq!(parsed.max_tokens, config.max_tokens);
    }
}
