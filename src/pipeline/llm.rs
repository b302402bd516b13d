//! VLM interaction: build the vision request and run one attempt.
//!
//! This module is intentionally thin. Prompt text lives in [`crate::prompts`],
//! the loop that decides whether to try again lives in [`crate::extract`].
//! Here we only turn one model call into a tagged outcome:
//!
//! ```text
//! call ──▶ Err / deadline ──▶ AttemptError::Invocation / Timeout
//!   │
//!   └──▶ text ──▶ parse ──▶ Err ──▶ AttemptError::Parse
//!                   │
//!                   └──▶ validate ──▶ Err ──▶ AttemptError::Validation
//!                            │
//!                            └──▶ Ok(ProductRecord)
//! ```

use crate::config::ExtractionConfig;
use crate::error::AttemptError;
use crate::pipeline::parse::parse_candidate;
use crate::schema::ProductRecord;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Text returned by a model call, with token accounting when available.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// A provider-side failure, already rendered to text.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct InvocationError(pub String);

/// Anything that can answer a vision chat request.
///
/// [`ProviderModel`] adapts an `edgequake_llm` provider; tests plug in stubs.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ModelReply, InvocationError>;
}

/// [`VisionModel`] backed by an `edgequake_llm` provider.
#[derive(Clone)]
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl VisionModel for ProviderModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ModelReply, InvocationError> {
        let response = self
            .provider
            .chat(messages, Some(options))
            .await
            .map_err(|e| InvocationError(e.to_string()))?;

        Ok(ModelReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
        })
    }
}

/// Build the two-message exchange for one photo.
///
/// 1. **System message**: the rendered instruction
/// 2. **User message**: the photo as an image attachment, with empty text
pub fn build_messages(instruction: &str, image: ImageData) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(instruction),
        ChatMessage::user_with_images("", vec![image]),
    ]
}

/// Build `CompletionOptions` from the extraction config.
pub fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Run a single attempt: call, parse, validate.
///
/// Never retries; the caller owns the attempt budget.
pub async fn run_attempt(
    model: &dyn VisionModel,
    messages: &[ChatMessage],
    options: &CompletionOptions,
    config: &ExtractionConfig,
) -> Result<ProductRecord, AttemptError> {
    let start = Instant::now();

    let reply = match tokio::time::timeout(config.api_timeout, model.complete(messages, options))
        .await
    {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => return Err(AttemptError::Invocation { message: e.0 }),
        Err(_) => {
            return Err(AttemptError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    };

    debug!(
        "Model replied: {} input tokens, {} output tokens, {:?}",
        reply.prompt_tokens,
        reply.completion_tokens,
        start.elapsed()
    );

    let candidate = parse_candidate(&reply.content)?;
    ProductRecord::from_candidate(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Fixed(Result<&'static str, &'static str>);

    #[async_trait]
    impl VisionModel for Fixed {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<ModelReply, InvocationError> {
            self.0
                .map(ModelReply::text)
                .map_err(|e| InvocationError(e.to_string()))
        }
    }

    struct Hang;

    #[async_trait]
    impl VisionModel for Hang {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<ModelReply, InvocationError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ModelReply::text("{}"))
        }
    }

    const VALID: &str = r#"{"condition":"perfecto estado","brand":"Canon","model":"EOS 250D","damage":"","title":"Canon EOS 250D","description":"Como nueva.","in_focus":true,"finger_obstruction":false}"#;

    fn messages() -> Vec<ChatMessage> {
        build_messages("instr", ImageData::new("aGVsbG8=".to_string(), "image/png"))
    }

    async fn attempt(
        model: &dyn VisionModel,
        config: &ExtractionConfig,
    ) -> Result<ProductRecord, AttemptError> {
        let messages = messages();
        run_attempt(model, &messages, &build_options(config), config).await
    }

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(256));
    }

    #[test]
    fn build_messages_is_system_then_user() {
        assert_eq!(messages().len(), 2);
    }

    #[tokio::test]
    async fn valid_reply_is_record() {
        let record = attempt(&Fixed(Ok(VALID)), &ExtractionConfig::default())
            .await
            .expect("valid");
        assert_eq!(record.brand(), Some("Canon"));
    }

    #[tokio::test]
    async fn provider_error_is_invocation() {
        let err = attempt(&Fixed(Err("429 quota exceeded")), &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AttemptError::Invocation {
                message: "429 quota exceeded".into()
            }
        );
    }

    #[tokio::test]
    async fn prose_reply_is_parse_error() {
        let err = attempt(&Fixed(Ok("No puedo ver la imagen.")), &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn partial_object_is_validation_error() {
        let err = attempt(&Fixed(Ok(r#"{"brand":"Canon"}"#)), &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn provider_model_forwards_reply() {
        let mock = edgequake_llm::MockProvider::new();
        mock.add_response(VALID).await;
        let model = ProviderModel::new(Arc::new(mock));

        let reply = model
            .complete(&messages(), &build_options(&ExtractionConfig::default()))
            .await
            .expect("mock reply");
        assert_eq!(reply.content, VALID);
        assert_eq!(reply.prompt_tokens + reply.completion_tokens, 0);

        let record = attempt(&model, &ExtractionConfig::default()).await;
        assert!(matches!(record, Err(AttemptError::Parse { .. })));
    }

    #[tokio::test]
    async fn slow_model_is_timeout() {
        let config = ExtractionConfig::builder()
            .api_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let err = attempt(&Hang, &config).await.unwrap_err();
        assert!(matches!(err, AttemptError::Timeout { .. }));
    }
}
