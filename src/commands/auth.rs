//! Server authentication.
//!
//! Unified flow: set the grading server URL and the bearer access token in
//! one pass. Pressing Enter without typing keeps the current value, so the
//! flow doubles as a token refresh.

use cliclack::{input, intro, note, outro, password};
use console::style;

use crate::config::{self, LingoConfig};

/// Handles server URL and access-token configuration, or clears the stored
/// token when `logout` is set.
pub async fn handle_auth(logout: bool) -> Result<(), anyhow::Error> {
    tracing::info!("=== lingo Authentication ===");

    if logout {
        config::clear_token()?;
        println!("Access token cleared. Run 'lingo auth' to log in again.");
        return Ok(());
    }

    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    intro(style(" auth ").on_white().black())?;

    let mut config = LingoConfig::load().unwrap_or_else(|_| LingoConfig::default());
    note("current server", &config.server.base_url)?;

    let base_url: String = input("Grading server URL (including /api):")
        .default_input(&config.server.base_url)
        .interact()
        .map_err(|e| anyhow::anyhow!("Input cancelled: {e}"))?;
    config.server.base_url = base_url.trim().trim_end_matches('/').to_string();

    let current_token = config::load_token().ok().flatten();
    let token = if current_token.is_some() {
        password("Access token (press Enter to keep current):")
            .mask('▪')
            .allow_empty()
            .interact()
            .map_err(|e| anyhow::anyhow!("Token input cancelled: {e}"))?
    } else {
        password("Access token:")
            .mask('▪')
            .interact()
            .map_err(|e| anyhow::anyhow!("Token input cancelled: {e}"))?
    };

    let token_to_save = if token.trim().is_empty() {
        match current_token {
            Some(existing) => existing,
            None => return Err(anyhow::anyhow!("Access token cannot be empty")),
        }
    } else {
        token.trim().to_string()
    };

    config.save()?;
    config::save_token(&token_to_save)?;

    outro("✅ Configuration saved.")?;

    tracing::info!("Authentication completed: server={}", config.server.base_url);
    Ok(())
}
