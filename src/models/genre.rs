//! Genre models

use serde::{Deserialize, Serialize};

/// A cached artist -> genres mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCacheEntry {
    pub artist: String,
    pub genres: Vec<String>,
}

/// Body of a successful `/genres` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenresResponse {
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Body of a failed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
