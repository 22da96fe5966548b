//! Node identifier normalization.
//!
//! Upstream feeds emit the same numeric identifier either as an integer
//! (`1520001`) or as a float (`1520001.0`, `1.520001E6`). Every identifier that
//! enters the graph goes through [`normalize_id`] so both spellings collapse to
//! one key.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized node identifier.
///
/// Ordering is lexicographic on the normalized text; the shortest-path engine
/// relies on it for deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Normalize `raw` and wrap it.
    pub fn new(raw: &str) -> Self {
        Self(normalize_id(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for NodeId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

/// Canonicalize an identifier coming from the network catalog.
///
/// - surrounding whitespace is dropped;
/// - `digits.0…0` loses the zero fraction;
/// - any other dotted value that parses as a finite float with an integral
///   value is rendered as that integer;
/// - everything else is returned unchanged.
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some((whole, fraction)) = trimmed.split_once('.') {
        if !whole.is_empty()
            && whole.bytes().all(|b| b.is_ascii_digit())
            && !fraction.is_empty()
            && fraction.bytes().all(|b| b == b'0')
        {
            return whole.to_string();
        }

        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                return (value as i64).to_string();
            }
        }
    }

    trimmed.to_string()
}
