//! First-run setup.
//!
//! Creates the config file from the embedded template when it is missing or
//! was written by an older version of the application.

pub mod version;

use anyhow::anyhow;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/lingo.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes the default config file, prefixed with the version header.
///
/// Existing content is replaced; callers gate this behind
/// [`version::check_setup_needed`].
///
/// # Errors
/// Returns an error if any file operation fails.
pub fn run_setup() -> anyhow::Result<()> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("lingo");
    std::fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("lingo.toml");
    let header = format!(r#"config_version = "{CURRENT_VERSION}""#);
    std::fs::write(&config_path, format!("{header}\n{DEFAULT_CONFIG}"))?;

    tracing::info!("Default configuration written to {}", config_path.display());
    Ok(())
}
