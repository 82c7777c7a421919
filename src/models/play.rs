//! Play record models

use serde::Deserialize;

/// One row of a listening-history export, as read from the CSV header
///
/// Every column is optional; the display header of the classic export and the
/// extended streaming history key are both accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayRow {
    #[serde(default, rename = "Track Name", alias = "master_metadata_track_name")]
    pub track: Option<String>,
    #[serde(default, rename = "Artist Name", alias = "master_metadata_album_artist_name")]
    pub artist: Option<String>,
    #[serde(default, rename = "Album Name", alias = "master_metadata_album_album_name")]
    pub album: Option<String>,
    #[serde(default, rename = "Milliseconds Played", alias = "ms_played")]
    pub ms_played: Option<String>,
    #[serde(default, rename = "Podcast Name", alias = "episode_show_name")]
    pub podcast_name: Option<String>,
    #[serde(default, rename = "Episode Name", alias = "episode_name")]
    pub podcast_episode: Option<String>,
}

/// A decoded play
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayRecord {
    pub track: Option<String>,
    pub artist: Option<String>,
    pub duration_ms: u64,
    pub podcast_name: Option<String>,
    pub podcast_episode: Option<String>,
    pub album: Option<String>,
}

#[cfg(test)]
impl PlayRecord {
    /// Build a song play
    pub fn song(track: &str, artist: &str, duration_ms: u64) -> Self {
        Self {
            track: clean(Some(track)),
            artist: clean(Some(artist)),
            duration_ms,
            ..Self::default()
        }
    }

    /// Build a podcast play
    pub fn podcast(show: &str, episode: &str, duration_ms: u64) -> Self {
        Self {
            podcast_name: clean(Some(show)),
            podcast_episode: clean(Some(episode)),
            duration_ms,
            ..Self::default()
        }
    }

    pub fn with_album(mut self, album: &str) -> Self {
        self.album = clean(Some(album));
        self
    }
}

impl PlayRecord {
    /// A song play has track, artist and a positive duration, and no podcast name
    pub fn is_song_play(&self) -> bool {
        self.track.is_some()
            && self.artist.is_some()
            && self.duration_ms > 0
            && self.podcast_name.is_none()
    }

    /// A podcast play has a show name and a positive duration
    pub fn is_podcast_play(&self) -> bool {
        self.podcast_name.is_some() && self.duration_ms > 0
    }
}

/// Trim a cell, mapping blank to None
pub fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_predicate() {
        assert!(PlayRecord::song("Karma Police", "Radiohead", 264000).is_song_play());
        assert!(!PlayRecord::song("Karma Police", "Radiohead", 0).is_song_play());
        assert!(!PlayRecord::song("", "Radiohead", 1000).is_song_play());
        assert!(!PlayRecord::song("Karma Police", "  ", 1000).is_song_play());
    }

    #[test]
    fn test_podcast_row_is_never_a_song() {
        let mut record = PlayRecord::song("Intro", "Host", 60000);
        record.podcast_name = Some("Daily Show".to_string());

        assert!(!record.is_song_play());
        assert!(record.is_podcast_play());
    }

    #[test]
    fn test_podcast_episode_is_optional() {
        assert!(PlayRecord::podcast("Show", "", 1000).is_podcast_play());
        assert!(!PlayRecord::podcast("Show", "Ep 1", 0).is_podcast_play());
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Some("  Air ")), Some("Air".to_string()));
        assert_eq!(clean(Some("   ")), None);
        assert_eq!(clean(None), None);
    }
}
