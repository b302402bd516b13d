//! # listing-vision
//!
//! Describe a second-hand product from a single photo using a Vision Language
//! Model (VLM), and get back a fixed, validated JSON record ready to publish as
//! a marketplace listing.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo
//!  │
//!  ├─ 1. Encode    raw bytes → base64 ImageData (read once per request)
//!  ├─ 2. Prompt    fixed Spanish instruction + JSON schema (rendered once)
//!  ├─ 3. VLM       one call under a deadline
//!  ├─ 4. Parse     model text → JSON candidate
//!  ├─ 5. Validate  all eight keys present → ProductRecord
//!  └─ 6. Retry     steps 3–5 until valid or the attempt budget is spent
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use listing_vision::{ExtractionConfig, Extractor};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let extractor = Extractor::from_config(ExtractionConfig::default())?;
//!     let record = extractor.extract_file(Path::new("camera.jpg")).await?;
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Record
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `condition` | perfecto estado / con marcas de uso / para reparar / para piezas |
//! | `brand`, `model` | as read from the product |
//! | `damage` | visible damage or signs of use, may be empty |
//! | `title`, `description` | marketing copy, in Spanish |
//! | `in_focus` | the photo is sharp |
//! | `finger_obstruction` | a finger hides part of the product |
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum router exposing `POST /analyze_image` |
//! | `cli`    | on      | the `listing-vision` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{AttemptError, ExtractionError, ListingError};
pub use extract::Extractor;
pub use pipeline::llm::{InvocationError, ModelReply, ProviderModel, VisionModel};
pub use schema::{is_valid, Condition, ProductRecord, REQUIRED_KEYS};
#[cfg(feature = "server")]
pub use server::{build_app, ServerConfig};
