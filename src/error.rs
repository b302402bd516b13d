//! Error types for the listing-vision library.
//!
//! Three types reflect three distinct failure scopes:
//!
//! * [`ListingError`]: **Fatal** for a single request. The image could not
//!   be read, the upload could not be staged, or the model provider is not
//!   configured. Never retried.
//!
//! * [`AttemptError`]: **Recoverable**. One model call failed, timed out, or
//!   produced output that did not parse or validate. The extraction loop
//!   records it and moves on to the next attempt.
//!
//! * [`ExtractionError`]: what a caller of [`crate::Extractor`] sees, either a
//!   fatal [`ListingError`] or the aggregate failure carrying the last
//!   [`AttemptError`] once the attempt budget is spent.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the listing-vision library.
#[derive(Debug, Error)]
pub enum ListingError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The image file could not be read from disk.
    #[error("Failed to read image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The uploaded bytes could not be staged in the upload directory.
    #[error("Failed to store upload in '{dir}': {source}")]
    UploadFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single extraction attempt did not yield a valid record.
///
/// Every variant is retried the same way; the distinction exists for logging
/// and for choosing the HTTP status once the budget is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The provider call itself failed (network, auth, quota).
    #[error("Model invocation failed: {message}")]
    Invocation { message: String },

    /// The provider did not answer within the per-attempt deadline.
    #[error("Model call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The model answered, but not with a single well-formed JSON document.
    #[error("Invalid JSON output: {message}")]
    Parse { message: String },

    /// Well-formed JSON that is not an object or lacks required keys.
    #[error("Output is missing required keys: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },
}

impl AttemptError {
    /// Short machine-friendly label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Invocation { .. } => "invocation",
            AttemptError::Timeout { .. } => "timeout",
            AttemptError::Parse { .. } => "parse",
            AttemptError::Validation { .. } => "validation",
        }
    }
}

/// Error returned by [`crate::Extractor`].
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The image could not be prepared; no model call was made.
    #[error(transparent)]
    Image(#[from] ListingError),

    /// Every attempt failed; `last` is the cause of the final one.
    #[error("{last}")]
    Exhausted { attempts: u32, last: AttemptError },
}
