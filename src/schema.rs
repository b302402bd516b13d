//! The product record the model must produce, and the check that it did.
//!
//! Validation is deliberately shallow: a candidate passes when it is a JSON
//! object containing every key in [`REQUIRED_KEYS`]. Value types are not
//! inspected, so `"in_focus": "sí"` is accepted just like `"in_focus": true`.
//! Callers that need typed values use the accessor methods on
//! [`ProductRecord`], which return `None` on a type mismatch.

use crate::error::AttemptError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys every record must contain, in the order the prompt lists them.
pub const REQUIRED_KEYS: [&str; 8] = [
    "condition",
    "brand",
    "model",
    "damage",
    "title",
    "description",
    "in_focus",
    "finger_obstruction",
];

/// Returns `true` when `candidate` is an object holding every required key.
pub fn is_valid(candidate: &Value) -> bool {
    match candidate.as_object() {
        Some(map) => REQUIRED_KEYS.iter().all(|k| map.contains_key(*k)),
        None => false,
    }
}

/// Required keys absent from `candidate`, in schema order.
///
/// A non-object candidate is missing all of them.
pub fn missing_keys(candidate: &Value) -> Vec<&'static str> {
    match candidate.as_object() {
        Some(map) => REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|k| !map.contains_key(*k))
            .collect(),
        None => REQUIRED_KEYS.to_vec(),
    }
}

/// A validated product description.
///
/// Holds the object exactly as the model produced it (extra keys included).
/// The only constructor is [`ProductRecord::from_candidate`], so every value
/// of this type carries all eight required keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProductRecord(Map<String, Value>);

impl ProductRecord {
    /// Validate a parsed candidate and wrap it.
    pub fn from_candidate(candidate: Value) -> Result<Self, AttemptError> {
        let missing = missing_keys(&candidate);
        match candidate {
            Value::Object(map) if missing.is_empty() => Ok(Self(map)),
            _ => Err(AttemptError::Validation { missing }),
        }
    }

    /// Raw value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn brand(&self) -> Option<&str> {
        self.get("brand").and_then(Value::as_str)
    }

    pub fn model(&self) -> Option<&str> {
        self.get("model").and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    /// Condition parsed from the free-text value; `None` when unrecognised.
    pub fn condition(&self) -> Option<Condition> {
        self.get("condition")
            .and_then(Value::as_str)
            .and_then(Condition::parse)
    }

    pub fn in_focus(&self) -> Option<bool> {
        self.get("in_focus").and_then(Value::as_bool)
    }

    pub fn finger_obstruction(&self) -> Option<bool> {
        self.get("finger_obstruction").and_then(Value::as_bool)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Product condition, as described to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Perfect,
    UsedMarks,
    NeedsRepair,
    PartsOnly,
}

impl Condition {
    /// All conditions, in the order the prompt offers them.
    pub const ALL: [Condition; 4] = [
        Condition::Perfect,
        Condition::UsedMarks,
        Condition::NeedsRepair,
        Condition::PartsOnly,
    ];

    /// The Spanish label the model is asked to use.
    pub fn label(self) -> &'static str {
        match self {
            Condition::Perfect => "perfecto estado",
            Condition::UsedMarks => "con marcas de uso",
            Condition::NeedsRepair => "para reparar",
            Condition::PartsOnly => "para piezas",
        }
    }

    /// Canonical slug (`perfect`, `used-marks`, …).
    pub fn slug(self) -> &'static str {
        match self {
            Condition::Perfect => "perfect",
            Condition::UsedMarks => "used-marks",
            Condition::NeedsRepair => "needs-repair",
            Condition::PartsOnly => "parts-only",
        }
    }

    /// Lenient parse: accepts the Spanish label or the slug, ignoring case
    /// and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| s == c.label() || s == c.slug())
    }
}
