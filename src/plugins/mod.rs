//! External service integrations
//!
//! The music catalog used for genre lookups, and a client for a remote
//! genre resolver service.

pub mod genre_service;
pub mod spotify;

pub use genre_service::RemoteGenreService;
pub use spotify::SpotifyCatalog;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::utils::retry::RetryableError;

/// Catalog client errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Rate limited by catalog")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog server error {0}")]
    Server(u16),

    #[error("Catalog rejected the access token")]
    Unauthorized,

    #[error("Token request failed: {0}")]
    Auth(String),

    #[error("Catalog API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed catalog response: {0}")]
    Malformed(String),

    #[error("Catalog credentials are not configured")]
    NotConfigured,
}

impl RetryableError for CatalogError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::RateLimited { .. }
                | CatalogError::Network(_)
                | CatalogError::Server(_)
                | CatalogError::Unauthorized
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Artist hit from a catalog search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
}

/// Music catalog able to find an artist and list its genres
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Best match for `name`, `None` when the search is empty
    async fn search_artist(&self, name: &str) -> Result<Option<CatalogArtist>, CatalogError>;

    /// Genres of the artist with catalog id `id`
    async fn artist_genres(&self, id: &str) -> Result<Vec<String>, CatalogError>;
}
