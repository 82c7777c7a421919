//! Listening-history CSV decoding

use std::io::Read;
use thiserror::Error;
use tracing::debug;

use crate::models::play::clean;
use crate::models::{PlayRecord, RawPlayRow};

/// History decoding errors
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Malformed row {row}: {reason}")]
    MalformedInput { row: u64, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Decoded history file
#[derive(Debug, Default)]
pub struct HistoryImport {
    pub records: Vec<PlayRecord>,
    /// Rows dropped as malformed
    pub skipped: u64,
}

/// Decode a history file with a header row
///
/// Only an unreadable header is fatal. Bad rows are skipped and counted.
pub fn read_history<R: Read>(input: R) -> Result<HistoryImport, HistoryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    reader.headers()?;

    let mut import = HistoryImport::default();

    for (i, result) in reader.deserialize::<RawPlayRow>().enumerate() {
        // header is row 1
        let row = i as u64 + 2;
        let parsed = result
            .map_err(HistoryError::from)
            .and_then(|raw| parse_row(raw, row));

        match parsed {
            Ok(record) => import.records.push(record),
            Err(e) => {
                debug!("Skipping row: {}", e);
                import.skipped += 1;
            }
        }
    }

    Ok(import)
}

/// Convert a raw CSV row into a play record
pub fn parse_row(raw: RawPlayRow, row: u64) -> Result<PlayRecord, HistoryError> {
    let duration_ms = match clean(raw.ms_played.as_deref()) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| HistoryError::MalformedInput {
                row,
                reason: format!("invalid duration '{}'", value),
            })?,
        None => 0,
    };

    Ok(PlayRecord {
        track: clean(raw.track.as_deref()),
        artist: clean(raw.artist.as_deref()),
        duration_ms,
        podcast_name: clean(raw.podcast_name.as_deref()),
        podcast_episode: clean(raw.podcast_episode.as_deref()),
        album: clean(raw.album.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_display_headers() {
        let csv = "Track Name,Artist Name,Milliseconds Played\n\
                   A,X,200000\n\
                   B, Y ,100000\n";

        let import = read_history(csv.as_bytes()).unwrap();
        assert_eq!(import.skipped, 0);
        assert_eq!(
            import.records,
            vec![
                PlayRecord::song("A", "X", 200000),
                PlayRecord::song("B", "Y", 100000),
            ]
        );
    }

    #[test]
    fn test_reads_extended_history_keys() {
        let csv = "ms_played,master_metadata_track_name,master_metadata_album_artist_name,master_metadata_album_album_name,episode_name,episode_show_name\n\
                   180000,Teardrop,Massive Attack,Mezzanine,,\n\
                   900000,,,,Episode 12,Some Show\n";

        let import = read_history(csv.as_bytes()).unwrap();
        assert_eq!(import.records.len(), 2);
        assert_eq!(
            import.records[0],
            PlayRecord::song("Teardrop", "Massive Attack", 180000).with_album("Mezzanine")
        );
        assert_eq!(import.records[1], PlayRecord::podcast("Some Show", "Episode 12", 900000));
    }

    #[test]
    fn test_bad_duration_is_skipped() {
        let csv = "Track Name,Artist Name,Milliseconds Played\n\
                   A,X,abc\n\
                   B,Y,-5\n\
                   C,Z,1000\n";

        let import = read_history(csv.as_bytes()).unwrap();
        assert_eq!(import.skipped, 2);
        assert_eq!(import.records, vec![PlayRecord::song("C", "Z", 1000)]);
    }

    #[test]
    fn test_missing_columns_and_blank_lines() {
        let csv = "Track Name,Artist Name\n\nA,X\n\n";

        let import = read_history(csv.as_bytes()).unwrap();
        assert_eq!(import.skipped, 0);
        assert_eq!(import.records, vec![PlayRecord::song("A", "X", 0)]);
    }

    #[test]
    fn test_short_row_is_not_fatal() {
        let csv = "Track Name,Artist Name,Milliseconds Played\nA,X\nB,Y,5000\n";

        let import = read_history(csv.as_bytes()).unwrap();
        assert_eq!(import.records.len(), 2);
        assert_eq!(import.records[0].duration_ms, 0);
    }

    #[test]
    fn test_parse_row_reports_row_number() {
        let raw = RawPlayRow {
            ms_played: Some("12.5".to_string()),
            ..RawPlayRow::default()
        };

        match parse_row(raw, 7) {
            Err(HistoryError::MalformedInput { row, .. }) => assert_eq!(row, 7),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
