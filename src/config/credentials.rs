//! Access token storage.
//!
//! The bearer token for the grading server is stored on its own in a
//! restricted-permission file under the user's local data directory, apart
//! from the editable config file. The [`StoredTokenProvider`] re-reads the
//! file on every call so a token refreshed by `lingo auth` takes effect
//! without restarting anything.

use std::fs;
use std::path::{Path, PathBuf};

use crate::api::TokenProvider;

const TOKEN_FILE: &str = "credentials";

/// Token provider backed by the credentials file.
///
/// Reads current state at call time rather than caching.
pub struct StoredTokenProvider;

impl TokenProvider for StoredTokenProvider {
    fn token(&self) -> anyhow::Result<Option<String>> {
        read_token_from(&token_path()?)
    }
}

/// Saves the access token, restricting the file to the current user.
pub fn save_token(token: &str) -> anyhow::Result<()> {
    let path = token_path()?;
    write_token_to(&path, token)?;
    tracing::info!("Access token saved");
    Ok(())
}

/// Removes the stored access token, if any.
pub fn clear_token() -> anyhow::Result<()> {
    let path = token_path()?;
    if path.exists() {
        fs::remove_file(&path)?;
        tracing::info!("Access token cleared");
    }
    Ok(())
}

/// Returns the currently stored token, or None when not logged in.
pub fn load_token() -> anyhow::Result<Option<String>> {
    read_token_from(&token_path()?)
}

fn token_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let data_dir = home.join(".local").join("share").join("lingo");
    fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join(TOKEN_FILE))
}

fn read_token_from(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let token = content.trim();
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some(token.to_string()))
}

fn write_token_to(path: &Path, token: &str) -> anyhow::Result<()> {
    fs::write(path, format!("{}\n", token.trim()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_token_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");

        write_token_to(&path, "secret-token").unwrap();
        assert_eq!(
            read_token_from(&path).unwrap().as_deref(),
            Some("secret-token")
        );
    }

    #[test]
    fn missing_and_empty_files_mean_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");

        assert_eq!(read_token_from(&path).unwrap(), None);

        fs::write(&path, "  \n").unwrap();
        assert_eq!(read_token_from(&path).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_user_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        write_token_to(&path, "t").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
