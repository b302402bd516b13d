//! Output parsing: raw model text → JSON candidate.
//!
//! The model is told to answer with a bare JSON object. Models still wrap the
//! object in a ```` ```json ```` fence now and then, so a single outer fence is
//! stripped first. Anything else around the object (a preamble, a trailing
//! remark) is a parse failure and triggers a retry.

use crate::error::AttemptError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// Decode the model's reply into a JSON value.
///
/// Shape is not checked here; see [`crate::schema::ProductRecord::from_candidate`].
pub fn parse_candidate(raw: &str) -> Result<Value, AttemptError> {
    let body = strip_outer_fence(raw.trim());
    serde_json::from_str(body).map_err(|e| AttemptError::Parse {
        message: e.to_string(),
    })
}

fn strip_outer_fence(input: &str) -> &str {
    match RE_OUTER_FENCE.captures(input).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => input,
    }
}
