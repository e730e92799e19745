use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    /// Platform label, e.g. `doordash`.
    pub source: String,
    pub app_type: String,
    pub timestamp: String,
    pub comment: String,
    pub rating: i32,
}

impl Review {
    pub fn platform(&self) -> Option<&str> {
        let source = self.source.trim();
        (!source.is_empty()).then_some(source)
    }
}

/// Coerce a raw rating cell to an integer. Decimals truncate toward zero and
/// anything unparseable falls back to [`DEFAULT_RATING`].
pub fn coerce_rating(raw: &str) -> i32 {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i32>() {
        return value;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i32,
        _ => DEFAULT_RATING,
    }
}
