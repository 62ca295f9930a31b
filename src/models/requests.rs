//! Request DTOs for the frontend API
//!
//! Query strings accepted by the `/api` endpoints.

use serde::Deserialize;

/// Query for `GET /api` and `DELETE /api/delete`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    /// The cache key
    #[serde(default)]
    pub key: Option<String>,
}

impl KeyQuery {
    /// Returns the key if present and non-empty.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.is_empty())
    }
}

/// Query for `GET /api/batch`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchQuery {
    /// Comma-separated keys
    #[serde(default)]
    pub keys: Option<String>,
}

impl BatchQuery {
    /// Splits the keys on `,`, trimming whitespace and dropping blanks.
    pub fn keys(&self) -> Vec<String> {
        self.keys
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect()
    }
}
