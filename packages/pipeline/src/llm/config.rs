use std::time::Duration;

use strum::{Display, EnumString};

use crate::error::{PipelineError, Result};

/// Supported chat-completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-5-20250929",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
        }
    }

    /// Vendor-specific API key variable consulted after the `LLM_*` ones.
    fn vendor_key_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Connection settings for one LLM-backed service.
///
/// NOTE: Do NOT derive `Debug` here, `api_key` would be exposed in logs.
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub api_base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl LlmConfig {
    /// Load configuration for the service identified by `prefix`.
    ///
    /// Every setting is read from `{prefix}_LLM_<NAME>` first and then from
    /// the shared `LLM_<NAME>`, e.g. `CLASSIFIER_LLM_MODEL` then `LLM_MODEL`.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_env_with_temperature(prefix, 0.0)
    }

    /// Like [`LlmConfig::from_env`], with a service-specific temperature
    /// used when neither temperature variable is set.
    pub fn from_env_with_temperature(prefix: &str, default_temperature: f64) -> Result<Self> {
        let provider = match lookup(prefix, "PROVIDER") {
            Some(name) => name.parse().map_err(|_| {
                PipelineError::Config(format!("unknown LLM provider '{name}' for {prefix}"))
            })?,
            None => LlmProvider::OpenAi,
        };

        let api_key = lookup(prefix, "API_KEY")
            .or_else(|| std::env::var(provider.vendor_key_var()).ok())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "{prefix}_LLM_API_KEY, LLM_API_KEY or {} not set",
                    provider.vendor_key_var()
                ))
            })?;

        let model = lookup(prefix, "MODEL").unwrap_or_else(|| provider.default_model().into());

        let api_base_url =
            lookup(prefix, "API_BASE_URL").unwrap_or_else(|| provider.default_base_url().into());

        let temperature = lookup(prefix, "TEMPERATURE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_temperature);

        let max_tokens = lookup(prefix, "MAX_TOKENS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024);

        let timeout_secs = lookup(prefix, "TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let max_retries = lookup(prefix, "MAX_RETRIES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        Ok(Self {
            provider,
            model,
            api_key,
            api_base_url,
            temperature,
            max_tokens,
            timeout_secs,
            max_retries,
            retry_base_delay: Duration::from_secs(1),
        })
    }

    /// Create a config builder for testing.
    pub fn builder(provider: LlmProvider, api_key: impl Into<String>) -> LlmConfigBuilder {
        LlmConfigBuilder {
            config: Self {
                provider,
                model: provider.default_model().into(),
                api_key: api_key.into(),
                api_base_url: provider.default_base_url().into(),
                temperature: 0.0,
                max_tokens: 1024,
                timeout_secs: 30,
                max_retries: 2,
                retry_base_delay: Duration::from_secs(1),
            },
        }
    }
}

fn lookup(prefix: &str, name: &str) -> Option<String> {
    std::env::var(format!("{prefix}_LLM_{name}"))
        .or_else(|_| std::env::var(format!("LLM_{name}")))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Builder for constructing `LlmConfig` in tests.
pub struct LlmConfigBuilder {
    config: LlmConfig,
}

impl LlmConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.config.api_base_url = api_base_url.into();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn retry_base_delay(mut self, retry_base_delay: Duration) -> Self {
        self.config.retry_base_delay = retry_base_delay;
        self
    }

    pub fn build(self) -> LlmConfig {
        self.config
    }
}
