//! Config version gating.
//!
//! The first line of the config file records which application version wrote
//! it. Setup re-runs when the file is missing, predates version headers, or
//! was written by an older release.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::path::Path;

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A parsed major.minor.patch version.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct AppVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl AppVersion {
    fn parse(text: &str) -> anyhow::Result<Self> {
        let mut parts = text.trim().split('.');
        let mut next = |label: &str| {
            parts
                .next()
                .ok_or_else(|| anyhow!("version '{text}' is missing its {label} component"))?
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid {label} component in version '{text}'"))
        };

        let version = AppVersion {
            major: next("major")?,
            minor: next("minor")?,
            patch: next("patch")?,
        };
        if parts.next().is_some() {
            return Err(anyhow!("version '{text}' has too many components"));
        }
        Ok(version)
    }
}

/// Reads the `config_version = "X.Y.Z"` header from the file's first line.
fn read_version_header(config_path: &Path) -> anyhow::Result<Option<String>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path)?;
    let Some(first_line) = content.lines().next() else {
        return Ok(None);
    };

    let pattern = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?;
    Ok(pattern
        .captures(first_line)
        .map(|caps| caps[1].to_string()))
}

/// Determines whether setup must run.
///
/// Returns the version the config file was written at when setup is needed
/// (`"unknown"` for a header-less legacy file), or None when the file is
/// current. A config newer than the binary is tolerated with a warning
/// rather than blocking startup.
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<Option<String>> {
    if !config_path.exists() {
        return Ok(Some("none (missing config)".to_string()));
    }

    let Some(file_version) = read_version_header(config_path)? else {
        return Ok(Some("unknown (legacy config)".to_string()));
    };

    let written_at = AppVersion::parse(&file_version)?;
    let current = AppVersion::parse(CURRENT_VERSION)?;

    match written_at.cmp(&current) {
        Ordering::Less => Ok(Some(file_version)),
        Ordering::Equal => Ok(None),
        Ordering::Greater => {
            tracing::warn!(
                "Config version {file_version} is newer than app version {CURRENT_VERSION}"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_well_formed_versions() {
        let v = AppVersion::parse("1.2.3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
    }

    #[test]
    fn orders_versions_numerically() {
        let older = AppVersion::parse("0.1.9").unwrap();
        let newer = AppVersion::parse("0.2.0").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!(AppVersion::parse("1.2").is_err());
        assert!(AppVersion::parse("1.2.3.4").is_err());
        assert!(AppVersion::parse("one.two.three").is_err());
    }

    #[test]
    fn missing_config_requires_setup() {
        let dir = tempfile::tempdir().unwrap();
        let needed = check_setup_needed(&dir.path().join("lingo.toml")).unwrap();
        assert!(needed.is_some());
    }

    #[test]
    fn current_version_header_skips_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lingo.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"config_version = "{CURRENT_VERSION}""#).unwrap();

        assert_eq!(check_setup_needed(&path).unwrap(), None);
    }

    #[test]
    fn older_version_header_requires_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lingo.toml");
        std::fs::write(&path, "config_version = \"0.0.1\"\n").unwrap();

        assert_eq!(check_setup_needed(&path).unwrap().as_deref(), Some("0.0.1"));
    }

    #[test]
    fn header_less_config_counts_as_legacy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lingo.toml");
        std::fs::write(&path, "[audio]\ndevice = \"default\"\n").unwrap();

        let needed = check_setup_needed(&path).unwrap().unwrap();
        assert!(needed.contains("legacy"));
    }
}
