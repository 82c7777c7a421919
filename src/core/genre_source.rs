//! Anything that can map an artist name to genres

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::core::resolver::ResolveError;

/// Source of artist genres, either the in-process resolver or a remote service
#[async_trait]
pub trait GenreSource: Send + Sync {
    /// Genres for one artist
    async fn genres_for(&self, artist: &str) -> Result<Vec<String>, ResolveError>;

    /// Resolve many artists with at most `concurrency` lookups in flight.
    ///
    /// Output follows input order. A failed lookup yields an empty list.
    async fn genres_for_many(
        &self,
        artists: &[String],
        concurrency: usize,
    ) -> Vec<(String, Vec<String>)> {
        lookup_all(self, artists, concurrency).await
    }
}

/// Look up every artist through `source`, at most `concurrency` at a time
///
/// Output follows input order. A failed lookup yields an empty list.
pub async fn lookup_all<S>(
    source: &S,
    artists: &[String],
    concurrency: usize,
) -> Vec<(String, Vec<String>)>
where
    S: GenreSource + ?Sized,
{
    stream::iter(artists.iter().cloned())
        .map(|artist| async move {
            let genres = match source.genres_for(&artist).await {
                Ok(genres) => genres,
                Err(ResolveError::ArtistNotFound(_)) => {
                    debug!("No catalog entry for '{}'", artist);
                    Vec::new()
                }
                Err(e) => {
                    warn!("Genre lookup failed for '{}': {}", artist, e);
                    Vec::new()
                }
            };
            (artist, genres)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
