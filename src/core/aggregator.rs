//! Listening statistics aggregation
//!
//! One pass over the decoded rows fills the tallies; genres are merged in
//! afterwards once the distinct artists have been resolved.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use tracing::info;

use crate::core::genre_source::GenreSource;
use crate::core::history::{read_history, HistoryError};
use crate::core::tally::{format_plays, Tally};
use crate::models::stats::NOT_AVAILABLE;
use crate::models::{PlayRecord, StatsSummary};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Counters and tallies for one history file
#[derive(Debug, Clone, Default)]
pub struct AggregateStats {
    pub total_songs: u64,
    pub total_listen_ms: u64,
    pub total_podcast_ms: u64,
    pub podcast_plays: u64,
    pub skipped_rows: u64,
    pub new_songs: u64,
    pub tracks: Tally,
    pub artists: Tally,
    pub albums: Tally,
    pub genres: Tally,
    pub podcasts: Tally,
    seen_tracks: HashSet<String>,
}

/// Run the aggregation pass over `rows`
pub fn aggregate(rows: &[PlayRecord]) -> AggregateStats {
    let mut stats = AggregateStats::default();
    for row in rows {
        stats.record(row);
    }
    stats
}

impl AggregateStats {
    /// Count one row
    pub fn record(&mut self, row: &PlayRecord) {
        if row.is_song_play() {
            // both present by the predicate
            let (Some(track), Some(artist)) = (row.track.as_deref(), row.artist.as_deref()) else {
                return;
            };

            self.total_songs += 1;
            self.total_listen_ms += row.duration_ms;
            self.tracks.increment(track);
            self.artists.increment(artist);
            if let Some(album) = row.album.as_deref() {
                self.albums.increment(album);
            }
            if self.seen_tracks.insert(track.to_string()) {
                self.new_songs += 1;
            }
        } else if row.is_podcast_play() {
            if let Some(show) = row.podcast_name.as_deref() {
                self.podcast_plays += 1;
                self.total_podcast_ms += row.duration_ms;
                self.podcasts.increment(show);
            }
        }
    }

    /// Distinct artists in encounter order
    pub fn distinct_artists(&self) -> Vec<String> {
        self.artists.keys().map(str::to_string).collect()
    }

    /// Add each artist's genres once per song play of that artist
    ///
    /// Walks artists in encounter order, so genre order matches a row-by-row merge.
    pub fn merge_genres(&mut self, resolved: &HashMap<String, Vec<String>>) {
        for (artist, plays) in self.artists.iter() {
            if let Some(genres) = resolved.get(artist) {
                for genre in genres {
                    self.genres.add(genre, plays);
                }
            }
        }
    }

    pub fn total_minutes(&self) -> u64 {
        ms_to_minutes(self.total_listen_ms)
    }

    pub fn total_podcast_minutes(&self) -> u64 {
        ms_to_minutes(self.total_podcast_ms)
    }

    /// Share of plays that were a track's first play, 0 with no songs
    pub fn new_songs_percentage(&self) -> f64 {
        if self.total_songs == 0 {
            return 0.0;
        }
        self.new_songs as f64 / self.total_songs as f64 * 100.0
    }

    /// `"N/A"` when no podcast was played
    pub fn most_played_podcast(&self) -> String {
        self.podcasts
            .max()
            .map(|(show, count)| format_plays(show, count))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Render with `top_n` entries per list
    pub fn summary(&self, top_n: usize) -> StatsSummary {
        StatsSummary {
            total_songs: self.total_songs,
            total_minutes: self.total_minutes(),
            total_podcast_minutes: self.total_podcast_minutes(),
            podcast_plays: self.podcast_plays,
            top_songs: self.tracks.top_formatted(top_n),
            top_artists: self.artists.top_formatted(top_n),
            top_albums: self.albums.top_formatted(top_n),
            top_genres: self.genres.top_formatted(top_n),
            top_podcasts: self.podcasts.top_formatted(top_n),
            most_played_podcast: self.most_played_podcast(),
            unique_artists: self.artists.len(),
            unique_albums: self.albums.len(),
            unique_genres: self.genres.len(),
            new_songs_percentage: round2(self.new_songs_percentage()),
            skipped_rows: self.skipped_rows,
        }
    }
}

/// Resolve every distinct artist through `source` and merge the genres
///
/// Lookups that fail contribute nothing. Returns how many artists got genres.
pub async fn enrich<S>(stats: &mut AggregateStats, source: &S, concurrency: usize) -> usize
where
    S: GenreSource + ?Sized,
{
    let artists = stats.distinct_artists();
    if artists.is_empty() {
        return 0;
    }

    info!("Resolving genres for {} artists", artists.len());
    let resolved: HashMap<String, Vec<String>> = source
        .genres_for_many(&artists, concurrency)
        .await
        .into_iter()
        .collect();

    let with_genres = resolved.values().filter(|g| !g.is_empty()).count();
    stats.merge_genres(&resolved);
    info!(
        "Genres found for {}/{} artists ({} distinct genres)",
        with_genres,
        artists.len(),
        stats.genres.len()
    );

    with_genres
}

/// Decode, aggregate and enrich a history file, then render it
pub async fn summarize<R, S>(
    input: R,
    source: &S,
    concurrency: usize,
    top_n: usize,
) -> Result<StatsSummary, HistoryError>
where
    R: Read,
    S: GenreSource + ?Sized,
{
    let import = read_history(input)?;
    info!(
        "Read {} rows ({} skipped)",
        import.records.len(),
        import.skipped
    );

    let mut stats = aggregate(&import.records);
    stats.skipped_rows = import.skipped;
    enrich(&mut stats, source, concurrency).await;

    Ok(stats.summary(top_n))
}

/// Milliseconds to whole minutes, half rounds up
pub fn ms_to_minutes(ms: u64) -> u64 {
    (ms as f64 / MS_PER_MINUTE).round() as u64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
