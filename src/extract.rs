//! Extraction entry points.
//!
//! An [`Extractor`] resolves its model once and is then shared (behind an
//! `Arc`) by every request. Each call encodes the photo once and runs up to
//! `attempts` sequential model calls, returning the first record that parses
//! and validates.

use crate::config::ExtractionConfig;
use crate::error::{AttemptError, ExtractionError, ListingError};
use crate::pipeline::encode;
use crate::pipeline::llm::{self, ProviderModel, VisionModel};
use crate::prompts::SYSTEM_INSTRUCTION;
use crate::schema::ProductRecord;
use edgequake_llm::{ImageData, LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Turns product photos into validated [`ProductRecord`]s.
pub struct Extractor {
    model: Arc<dyn VisionModel>,
    instruction: &'static str,
    config: ExtractionConfig,
}

impl Extractor {
    /// Build an extractor, resolving the provider from `config`.
    ///
    /// # Errors
    /// [`ListingError::ProviderNotConfigured`] when no provider can be built
    /// (typically a missing API key).
    pub fn from_config(config: ExtractionConfig) -> Result<Self, ListingError> {
        let provider = resolve_provider(&config)?;
        Ok(Self::with_model(Arc::new(ProviderModel::new(provider)), config))
    }

    /// Build an extractor around an explicit model.
    pub fn with_model(model: Arc<dyn VisionModel>, config: ExtractionConfig) -> Self {
        Self {
            model,
            instruction: SYSTEM_INSTRUCTION.as_str(),
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Read the photo at `path` and extract a record from it.
    ///
    /// The file is read exactly once, before the first attempt.
    pub async fn extract_file(&self, path: &Path) -> Result<ProductRecord, ExtractionError> {
        let image = encode::encode_image_file(path).await?;
        self.extract_image(image).await
    }

    /// Extract a record from an already-encoded photo.
    ///
    /// # Errors
    /// [`ExtractionError::Exhausted`] when every attempt failed; it carries the
    /// last attempt's cause.
    pub async fn extract_image(&self, image: ImageData) -> Result<ProductRecord, ExtractionError> {
        let start = Instant::now();
        let messages = llm::build_messages(self.instruction, image);
        let options = llm::build_options(&self.config);
        let attempts = self.config.attempts;

        let mut last: Option<AttemptError> = None;

        for attempt in 1..=attempts {
            match llm::run_attempt(self.model.as_ref(), &messages, &options, &self.config).await {
                Ok(record) => {
                    info!(
                        attempt,
                        brand = record.brand().unwrap_or(""),
                        condition = record.condition().map(|c| c.slug()).unwrap_or("unknown"),
                        "Extraction succeeded in {}ms",
                        start.elapsed().as_millis()
                    );
                    return Ok(record);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        kind = e.kind(),
                        "Attempt {}/{} failed: {}",
                        attempt,
                        attempts,
                        e
                    );
                    last = Some(e);
                }
            }
        }

        // `attempts >= 1` is enforced by the config builder, but a config
        // assembled by hand may still carry zero.
        let last = last.unwrap_or(AttemptError::Invocation {
            message: "no attempts were made".to_string(),
        });
        warn!(
            attempts,
            "Extraction failed after {}ms: {}",
            start.elapsed().as_millis(),
            last
        );
        Err(ExtractionError::Exhausted { attempts, last })
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ListingError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ListingError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set, with `config.model`.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, ListingError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, &config.model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", &config.model);
        }
    }

    ProviderFactory::from_env()
        .map(|(llm, _)| llm)
        .map_err(|e| ListingError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: auto_detect_hint(&e.to_string()),
        })
}

fn auto_detect_hint(cause: &str) -> String {
    format!(
        "No vision model found in the environment ({cause}). \
         Export OPENAI_API_KEY, or pass --provider and --model."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_provider_failure_keeps_provider_name() {
        let config = ExtractionConfig::builder()
            .provider_name("no-such-provider")
            .build()
            .unwrap();
        match resolve_provider(&config) {
            Err(ListingError::ProviderNotConfigured { provider, .. }) => {
                assert_eq!(provider, "no-such-provider")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("unknown provider must not resolve"),
        }
    }

    #[test]
    fn auto_detect_hint_points_at_cli_flags() {
        let hint = auto_detect_hint("no API key");
        assert!(hint.contains("no API key"));
        assert!(hint.contains("--provider"));
        assert!(!hint.contains("configure a provider"));
    }
}
