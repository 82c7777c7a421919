//! Utility modules for playstats

pub mod retry;
