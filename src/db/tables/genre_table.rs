//! Genre cache table operations
//!
//! One row per artist name, genres stored as a JSON array.

use anyhow::Result;

use crate::db::DbEngine;
use crate::models::GenreCacheEntry;

/// genre cache table operations
#[derive(Clone)]
pub struct GenreTable {
    engine: DbEngine,
}

impl GenreTable {
    pub fn new(engine: DbEngine) -> Self {
        Self { engine }
    }

    /// get cached genres for an exact artist name
    pub async fn get(&self, artist: &str) -> Result<Option<Vec<String>>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT genres FROM genres WHERE artist = ?")
            .bind(artist)
            .fetch_optional(self.engine.pool())
            .await?;

        match row {
            Some((json_str,)) => Ok(Some(serde_json::from_str(&json_str)?)),
            None => Ok(None),
        }
    }

    /// store genres for an artist, replacing any previous entry
    pub async fn upsert(&self, artist: &str, genres: &[String]) -> Result<()> {
        let json_str = serde_json::to_string(genres)?;

        sqlx::query("INSERT OR REPLACE INTO genres (artist, genres, updated_at) VALUES (?, ?, ?)")
            .bind(artist)
            .bind(&json_str)
            .bind(chrono::Utc::now().timestamp())
            .execute(self.engine.pool())
            .await?;

        Ok(())
    }

    /// all cached entries, ordered by artist
    pub async fn all(&self) -> Result<Vec<GenreCacheEntry>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT artist, genres FROM genres ORDER BY artist")
                .fetch_all(self.engine.pool())
                .await?;

        rows.into_iter()
            .map(|(artist, json_str)| {
                Ok(GenreCacheEntry {
                    artist,
                    genres: serde_json::from_str(&json_str)?,
                })
            })
            .collect()
    }

    pub async fn close(&self) {
        self.engine.close().await;
    }

    /// number of cached artists
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM genres")
            .fetch_one(self.engine.pool())
            .await?;
        Ok(count)
    }
}
