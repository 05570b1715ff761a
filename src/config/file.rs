//! Configuration file management.
//!
//! Application configuration lives in a TOML file in the user's config
//! directory (`~/.config/lingo/lingo.toml`) and is created by the first-run
//! setup. The access token is deliberately not part of this file; see the
//! credentials module.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio capture configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for the system default device
    /// - numeric index (0, 1, 2, etc.) from `lingo list-devices`
    /// - device name from `lingo list-devices`
    pub device: String,
    /// Requested sample rate in Hz; the device's native rate wins.
    pub sample_rate: u32,
}

/// Grading server configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the grading API, including the `/api` path.
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Speaking-practice configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// Speaking prompt shown before recording when none is given on the
    /// command line.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "Describe your ideal vacation destination and explain why you would choose to visit that place."
        .to_string()
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct LingoConfig {
    pub audio: AudioConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub practice: PracticeConfig,
}

impl LingoConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_path()?;
        let content = fs::read_to_string(&config_path)?;
        let config: LingoConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory, preserving the
    /// `config_version` header line when one is present.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = config_path()?;
        let version_header = fs::read_to_string(&config_path)
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .next()
                    .filter(|line| line.trim_start().starts_with("config_version"))
                    .map(|line| line.to_string())
            });

        let body = toml::to_string_pretty(self)?;
        let content = match version_header {
            Some(header) => format!("{header}\n{body}"),
            None => body,
        };
        fs::write(&config_path, content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Returns default configuration values.
    pub fn default() -> Self {
        LingoConfig {
            audio: AudioConfig {
                device: "default".to_string(),
                sample_rate: 16000,
            },
            server: ServerConfig {
                base_url: "http://localhost:8000/api".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            practice: PracticeConfig::default(),
        }
    }
}

/// Path of the config file, creating the config directory if needed.
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_path = home.join(".config").join("lingo").join("lingo.toml");

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let toml = r#"
            [audio]
            device = "default"
            sample_rate = 16000

            [server]
            base_url = "http://localhost:8000/api"
        "#;
        let config: LingoConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.timeout_secs, 30);
        assert!(config.practice.prompt.contains("vacation"));
    }

    #[test]
    fn default_config_round_trips() {
        let config = LingoConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: LingoConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.server.base_url, config.server.base_url);
        assert_eq!(parsed.audio.device, "default");
    }
}
