//! Configuration management.
//!
//! This module handles loading and saving application configuration from
//! TOML files, as well as storage of the grading-server access token.
//! Configuration is stored in the user's config directory, while the token
//! is stored with restricted permissions in the user's local data directory.

pub mod credentials;
pub mod file;

pub use credentials::{clear_token, load_token, save_token, StoredTokenProvider};
pub use file::{config_path, LingoConfig};
