//! Statistics models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown when no podcast was played
pub const NOT_AVAILABLE: &str = "N/A";

/// Rendered listening statistics for one history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_songs: u64,
    pub total_minutes: u64,
    pub total_podcast_minutes: u64,
    pub podcast_plays: u64,
    pub top_songs: Vec<String>,
    pub top_artists: Vec<String>,
    pub top_albums: Vec<String>,
    pub top_genres: Vec<String>,
    pub top_podcasts: Vec<String>,
    pub most_played_podcast: String,
    pub unique_artists: usize,
    pub unique_albums: usize,
    pub unique_genres: usize,
    pub new_songs_percentage: f64,
    pub skipped_rows: u64,
}

fn write_list(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    if items.is_empty() {
        writeln!(f, "  -")?;
    }
    for (i, item) in items.iter().enumerate() {
        writeln!(f, "  {}. {}", i + 1, item)?;
    }
    Ok(())
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total songs played:    {}", self.total_songs)?;
        writeln!(f, "Total minutes:         {}", self.total_minutes)?;
        writeln!(f, "Podcast minutes:       {}", self.total_podcast_minutes)?;
        writeln!(f, "Podcast plays:         {}", self.podcast_plays)?;
        writeln!(f, "Unique artists:        {}", self.unique_artists)?;
        writeln!(f, "Unique albums:         {}", self.unique_albums)?;
        writeln!(f, "Unique genres:         {}", self.unique_genres)?;
        writeln!(f, "New songs:             {:.2}%", self.new_songs_percentage)?;
        writeln!(f, "Most played podcast:   {}", self.most_played_podcast)?;
        if self.skipped_rows > 0 {
            writeln!(f, "Skipped rows:          {}", self.skipped_rows)?;
        }
        write_list(f, "Top songs", &self.top_songs)?;
        write_list(f, "Top artists", &self.top_artists)?;
        write_list(f, "Top albums", &self.top_albums)?;
        write_list(f, "Top genres", &self.top_genres)?;
        write_list(f, "Top podcasts", &self.top_podcasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> StatsSummary {
        StatsSummary {
            total_songs: 3,
            total_minutes: 8,
            total_podcast_minutes: 0,
            podcast_plays: 0,
            top_songs: vec!["A (2 plays)".into(), "B (1 plays)".into()],
            top_artists: vec![],
            top_albums: vec![],
            top_genres: vec![],
            top_podcasts: vec![],
            most_played_podcast: NOT_AVAILABLE.into(),
            unique_artists: 2,
            unique_albums: 0,
            unique_genres: 0,
            new_songs_percentage: 66.67,
            skipped_rows: 0,
        }
    }

    #[test]
    fn test_display() {
        let text = summary().to_string();
        assert!(text.contains("Total songs played:    3"));
        assert!(text.contains("New songs:             66.67%"));
        assert!(text.contains("  1. A (2 plays)"));
        assert!(!text.contains("Skipped rows"));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(summary()).unwrap();
        assert_eq!(json["totalSongs"], 3);
        assert_eq!(json["mostPlayedPodcast"], "N/A");
        assert_eq!(json["topSongs"][0], "A (2 plays)");
    }
}
