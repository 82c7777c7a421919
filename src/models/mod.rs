//! Data models for playstats

pub mod genre;
pub mod play;
pub mod stats;

pub use genre::{ErrorResponse, GenreCacheEntry, GenresResponse};
pub use play::{PlayRecord, RawPlayRow};
pub use stats::StatsSummary;
