//! Database table operations

mod genre_table;

pub use genre_table::GenreTable;
