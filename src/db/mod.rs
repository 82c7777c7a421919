//! Database module for playstats
//!
//! This module handles the genre cache using SQLx with SQLite.

mod engine;
pub mod tables;

pub use engine::DbEngine;
pub use tables::*;
