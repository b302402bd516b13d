//! Pipeline stages for photo-to-listing extraction.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! the others and without a live model.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ llm ──▶ parse ──▶ schema
//! (base64)   (VLM)   (JSON)    (required keys)
//! ```
//!
//! 1. [`encode`]: read the photo and base64-wrap it for the multimodal request
//! 2. [`llm`]   : drive the model call with a per-attempt deadline; the only
//!    stage with network I/O
//! 3. [`parse`] : turn the model's text into a JSON candidate
//!
//! Validation lives in [`crate::schema`] because the record type is part of
//! the public API.

pub mod encode;
pub mod llm;
pub mod parse;
