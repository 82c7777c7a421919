//! Configuration module for playstats
//!
//! This module contains the application configuration structures and path management.

mod paths;
mod user_config;

pub use paths::Paths;
pub use user_config::UserConfig;

/// Number of entries in every top-N list
pub const DEFAULT_TOP_N: usize = 5;

/// Default resolver service port
pub const DEFAULT_PORT: u16 = 3000;
