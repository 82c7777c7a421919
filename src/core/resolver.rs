//! Artist genre resolution
//!
//! Cache first, then catalog search and details with bounded retries. Fresh
//! results are written back so the next lookup for the same name is free.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, Semaphore};
use tracing::{debug, info};

use crate::config::UserConfig;
use crate::core::genre_source::{lookup_all, GenreSource};
use crate::db::{DbEngine, GenreTable};
use crate::plugins::{CatalogApi, CatalogError, SpotifyCatalog};
use crate::utils::retry::{RetryError, RetryPolicy};

/// Genre resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Artist not found: {0}")]
    ArtistNotFound(String),

    #[error("Catalog unavailable after {attempts} attempts: {reason}")]
    UpstreamUnavailable { attempts: u32, reason: String },

    #[error("Catalog error: {0}")]
    UpstreamError(String),

    #[error("Catalog authentication failed: {0}")]
    Auth(String),

    #[error("Genre cache error: {0}")]
    Cache(String),
}

impl From<RetryError<CatalogError>> for ResolveError {
    fn from(err: RetryError<CatalogError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => ResolveError::UpstreamUnavailable {
                attempts,
                reason: last.to_string(),
            },
            RetryError::Fatal(e @ (CatalogError::Auth(_) | CatalogError::NotConfigured)) => {
                ResolveError::Auth(e.to_string())
            }
            RetryError::Fatal(e) => ResolveError::UpstreamError(e.to_string()),
        }
    }
}

fn cache_error(err: anyhow::Error) -> ResolveError {
    ResolveError::Cache(format!("{:#}", err))
}

type InFlightMap = DashMap<String, Arc<Mutex<()>>>;

/// Membership in the per-artist in-flight map
///
/// Dropping it removes the entry once no other caller shares it, including
/// when the owning future is cancelled mid-lookup.
struct InFlight<'a> {
    map: &'a InFlightMap,
    artist: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn join(map: &'a InFlightMap, artist: &'a str) -> Self {
        let lock = map
            .entry(artist.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { map, artist, lock }
    }

    async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // the map's reference plus ours
        self.map
            .remove_if(self.artist, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

/// Resolver context: catalog client, cache table and retry strategy
pub struct GenreResolver {
    catalog: Arc<dyn CatalogApi>,
    cache: GenreTable,
    retry: RetryPolicy,
    /// one lock per artist currently being fetched
    in_flight: InFlightMap,
    permits: Semaphore,
    max_concurrent: usize,
}

impl GenreResolver {
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        cache: GenreTable,
        retry: RetryPolicy,
        max_concurrent: usize,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            catalog,
            cache,
            retry,
            in_flight: DashMap::new(),
            permits: Semaphore::new(max_concurrent),
            max_concurrent,
        }
    }

    /// Build the resolver used by the service: Spotify catalog over the given cache
    pub fn from_config(config: &UserConfig, engine: DbEngine) -> Result<Self> {
        let catalog = SpotifyCatalog::new(config)?;
        if !config.has_catalog_credentials() {
            tracing::warn!(
                "Catalog credentials missing; only cached genres will resolve. \
                 Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET."
            );
        }

        Ok(Self::new(
            Arc::new(catalog),
            GenreTable::new(engine),
            RetryPolicy::from_config(config),
            config.max_concurrent_lookups,
        ))
    }

    pub fn cache(&self) -> &GenreTable {
        &self.cache
    }

    /// Upper bound on concurrent catalog lookups
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Genres for `artist`, exact-name cache key
    pub async fn resolve_genres(&self, artist: &str) -> Result<Vec<String>, ResolveError> {
        if let Some(genres) = self.cache.get(artist).await.map_err(cache_error)? {
            debug!("Genres for '{}' found in cache", artist);
            return Ok(genres);
        }

        let in_flight = InFlight::join(&self.in_flight, artist);
        let _guard = in_flight.acquire().await;

        // a concurrent caller may have stored it while we waited
        match self.cache.get(artist).await.map_err(cache_error)? {
            Some(genres) => Ok(genres),
            None => self.fetch_and_store(artist).await,
        }
    }

    async fn fetch_and_store(&self, artist: &str) -> Result<Vec<String>, ResolveError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ResolveError::UpstreamError("resolver is shutting down".to_string()))?;

        info!("Fetching genres for artist: {}", artist);

        let found = self
            .retry
            .run("artist search", || self.catalog.search_artist(artist))
            .await?;

        let Some(found) = found else {
            return Err(ResolveError::ArtistNotFound(artist.to_string()));
        };

        let genres = self
            .retry
            .run("artist details", || self.catalog.artist_genres(&found.id))
            .await?;

        self.cache
            .upsert(artist, &genres)
            .await
            .map_err(cache_error)?;

        info!("Genres fetched and stored for '{}': {:?}", artist, genres);
        Ok(genres)
    }

    /// Resolve a batch of artists concurrently, duplicates collapsed
    ///
    /// Failures resolve to an empty list so one artist never sinks the batch.
    pub async fn resolve_many(&self, artists: &[String]) -> Vec<(String, Vec<String>)> {
        let mut seen = std::collections::HashSet::new();
        let distinct: Vec<String> = artists
            .iter()
            .filter(|a| seen.insert(a.as_str()))
            .cloned()
            .collect();

        lookup_all(self, &distinct, self.max_concurrent).await
    }
}

#[async_trait]
impl GenreSource for GenreResolver {
    async fn genres_for(&self, artist: &str) -> Result<Vec<String>, ResolveError> {
        self.resolve_genres(artist).await
    }

    /// Batches go through `resolve_many`; the resolver's own permits bound
    /// catalog traffic, so the caller's concurrency hint is not used.
    async fn genres_for_many(
        &self,
        artists: &[String],
        _concurrency: usize,
    ) -> Vec<(String, Vec<String>)> {
        self.resolve_many(artists).await
    }
}
