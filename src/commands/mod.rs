//! Application command handlers.
//!
//! This module organizes command handling into separate submodules, each
//! responsible for a specific application command.
//!
//! # Commands
//! - `record`: Record speech against a prompt and submit it for grading
//! - `list`: List past recordings with their grades
//! - `show`: Full grading detail for one recording
//! - `replay`: Play back a recording's audio
//! - `delete`: Delete a recording after server confirmation
//! - `auth`: Configure server URL and access token
//! - `config`: Open configuration file in the user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod auth;
pub mod config;
pub mod delete;
pub mod list;
pub mod list_devices;
pub mod logs;
pub mod record;
pub mod replay;
pub mod show;

pub use auth::handle_auth;
pub use config::handle_config;
pub use delete::handle_delete;
pub use list::handle_list;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use record::handle_record;
pub use replay::handle_replay;
pub use show::handle_show;

use std::time::Duration;

use crate::api::ApiClient;
use crate::config::{LingoConfig, StoredTokenProvider};
use crate::pipeline::PracticePipeline;

/// The concrete pipeline used by every command.
pub type AppPipeline = PracticePipeline<ApiClient<StoredTokenProvider>>;

/// Builds the pipeline against the configured server.
pub fn build_pipeline(config: &LingoConfig) -> anyhow::Result<AppPipeline> {
    let client = ApiClient::new(
        &config.server.base_url,
        StoredTokenProvider,
        Duration::from_secs(config.server.timeout_secs),
    )?;
    Ok(PracticePipeline::new(client))
}

/// Loads configuration, turning failures into a user-facing message.
pub fn load_config() -> anyhow::Result<LingoConfig> {
    LingoConfig::load().map_err(|err| {
        anyhow::anyhow!(
            "Configuration error: {err}. Check your ~/.config/lingo/lingo.toml file and try again."
        )
    })
}

/// Prints the pipeline's connection-channel error, if set.
pub fn report_connection_error(pipeline: &AppPipeline) {
    if let Some(message) = pipeline.connection_error() {
        eprintln!(
            "{} {message}",
            console::style("Connection error:").red().bold()
        );
    }
}

/// Prints the pipeline's capture-channel error, if set.
pub fn report_capture_error(pipeline: &AppPipeline) {
    if let Some(message) = pipeline.capture_error() {
        eprintln!(
            "{} {message}",
            console::style("Recording error:").yellow().bold()
        );
    }
}
