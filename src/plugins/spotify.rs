//! Spotify Web API catalog client
//!
//! Client-credentials token with expiry tracking, artist search and artist
//! details. Retrying is left to the caller; this module only classifies failures.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CatalogApi, CatalogArtist, CatalogError};
use crate::config::UserConfig;

/// Refresh the token when it has less than this left
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Option<ArtistPage>,
}

#[derive(Debug, Deserialize)]
struct ArtistPage {
    #[serde(default)]
    items: Vec<ArtistItem>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArtistDetails {
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN
    }
}

/// Spotify catalog client
pub struct SpotifyCatalog {
    client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base_url: String,
    token: RwLock<Option<AccessToken>>,
}

impl SpotifyCatalog {
    pub fn new(config: &UserConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            client,
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            token_url: config.token_url.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Current bearer token, fetching a new one when missing or close to expiry
    async fn access_token(&self) -> Result<String, CatalogError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let fetched = self.fetch_token().await?;
        let value = fetched.value.clone();
        *guard = Some(fetched);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<AccessToken, CatalogError> {
        if !self.is_configured() {
            return Err(CatalogError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Auth(e.to_string()))?;

        let lifetime = payload.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        info!("Fetched catalog access token (expires in {}s)", lifetime);

        Ok(AccessToken {
            value: payload.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    /// Authenticated GET returning a decoded JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(CatalogError::RateLimited { retry_after });
        }

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            return Err(CatalogError::Unauthorized);
        }

        if status.is_server_error() {
            return Err(CatalogError::Server(status.as_u16()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| CatalogError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CatalogApi for SpotifyCatalog {
    async fn search_artist(&self, name: &str) -> Result<Option<CatalogArtist>, CatalogError> {
        debug!("Searching catalog for artist '{}'", name);
        let url = format!("{}/search", self.api_base_url);
        let response: SearchResponse = self
            .get_json(&url, &[("q", name), ("type", "artist"), ("limit", "1")])
            .await?;

        Ok(response
            .artists
            .and_then(|page| page.items.into_iter().next())
            .map(|item| CatalogArtist {
                id: item.id,
                name: item.name,
            }))
    }

    async fn artist_genres(&self, id: &str) -> Result<Vec<String>, CatalogError> {
        let url = format!("{}/artists/{}", self.api_base_url, id);
        let details: ArtistDetails = self.get_json(&url, &[]).await?;
        Ok(details.genres)
    }
}
