//! Request DTOs for the cache server API
//!
//! Every endpoint takes its input from the query string.

use serde::Deserialize;

/// Query of `GET /cache/get`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyQuery {
    #[serde(default)]
    pub key: String,
}

impl KeyQuery {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Missing required query parameter: key".to_string());
        }
        None
    }
}

/// Query of `PUT|POST /cache/set`.
///
/// Length limits are enforced by the manager.
#[derive(Debug, Clone, Deserialize)]
pub struct SetQuery {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl SetQuery {
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() || self.value.is_empty() {
            return Some("Missing required query parameters: key and value".to_string());
        }
        None
    }
}

/// Query of `DELETE /cache/invalidate`: exactly one of `key` or `value`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// What an invalidate request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidateTarget {
    Key(String),
    Value(String),
}

impl InvalidateQuery {
    pub fn target(self) -> Result<InvalidateTarget, String> {
        match (self.key, self.value) {
            (Some(key), None) if !key.is_empty() => Ok(InvalidateTarget::Key(key)),
            (None, Some(value)) if !value.is_empty() => Ok(InvalidateTarget::Value(value)),
            _ => Err("Provide exactly one non-empty query parameter: key or value".to_string()),
        }
    }
}
