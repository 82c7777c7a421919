//! Core library functions for playstats

pub mod aggregator;
pub mod genre_source;
pub mod history;
pub mod resolver;
pub mod tally;

pub use resolver::{GenreResolver, ResolveError};
