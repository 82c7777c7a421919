//! Client for a running genre service
//!
//! Lets the stats CLI reuse another instance's cache instead of talking to
//! the catalog itself.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::core::genre_source::GenreSource;
use crate::core::resolver::ResolveError;
use crate::models::{ErrorResponse, GenresResponse};

/// `GET /genres` over HTTP
pub struct RemoteGenreService {
    client: Client,
    base_url: String,
}

impl RemoteGenreService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GenreSource for RemoteGenreService {
    async fn genres_for(&self, artist: &str) -> Result<Vec<String>, ResolveError> {
        let url = format!("{}/genres", self.base_url);
        debug!("Requesting genres for '{}' from {}", artist, url);

        let response = self
            .client
            .get(&url)
            .query(&[("artist", artist)])
            .send()
            .await
            .map_err(|e| ResolveError::UpstreamUnavailable {
                attempts: 1,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResolveError::ArtistNotFound(artist.to_string()));
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ResolveError::UpstreamError(format!(
                "genre service returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: GenresResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::UpstreamError(format!("bad genre response: {}", e)))?;

        Ok(body.genres)
    }
}
