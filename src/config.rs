//! Configuration types for photo-to-listing extraction.
//!
//! All model-facing behaviour is controlled through [`ExtractionConfig`],
//! built via its [`ExtractionConfigBuilder`]. Credentials never appear here:
//! the provider reads its API key from the environment (`OPENAI_API_KEY`,
//! `ANTHROPIC_API_KEY`, …) when it is resolved.

use crate::error::ListingError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for an [`crate::Extractor`].
///
/// # Example
/// ```rust
/// use listing_vision::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o-mini")
///     .attempts(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.attempts, 3);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Kept low so repeated calls on the same photo produce the same record.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 256.
    ///
    /// The eight-key object fits comfortably; a model that rambles past this
    /// bound produces truncated JSON, which fails parsing and is retried.
    pub max_tokens: usize,

    /// Total model calls allowed per photo, including the first. Default: 2.
    pub attempts: u32,

    /// Deadline for a single model call. Default: 60 s.
    ///
    /// An elapsed deadline counts as a failed attempt.
    pub api_timeout: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 256,
            attempts: 2,
            api_timeout: Duration::from_secs(60),
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("attempts", &self.attempts)
            .field("api_timeout", &self.api_timeout)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn attempts(mut self, n: u32) -> Self {
        self.config.attempts = n;
        self
    }

    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.config.api_timeout = timeout;
        self
    }

    pub fn api_timeout_secs(self, secs: u64) -> Self {
        self.api_timeout(Duration::from_secs(secs))
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ListingError> {
        let c = &self.config;
        if c.attempts == 0 {
            return Err(ListingError::InvalidConfig("attempts must be ≥ 1".into()));
        }
        if c.max_tokens == 0 {
            return Err(ListingError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout.is_zero() {
            return Err(ListingError::InvalidConfig(
                "api_timeout must be greater than zero".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(ListingError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.model, "gpt-4o");
        assert_eq!(c.temperature, 0.2);
        assert_eq!(c.max_tokens, 256);
        assert_eq!(c.attempts, 2);
        assert_eq!(c.api_timeout, Duration::from_secs(60));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = ExtractionConfig::builder().attempts(0).build().unwrap_err();
        assert!(err.to_string().contains("attempts"));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(ExtractionConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ExtractionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_hides_provider() {
        let s = format!("{:?}", ExtractionConfig::default());
        assert!(s.contains("gpt-4o"));
        assert!(s.contains("provider: None"));
    }
}
