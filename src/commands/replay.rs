//! Play back a recording's audio with the system audio player.
//!
//! The audio is fetched from the server on first playback and cached by the
//! pipeline, so replaying the same recording again does not re-download it.

use std::path::Path;
use std::process::Command;

use super::{build_pipeline, load_config, report_connection_error};

/// Fetches and plays a recording by display index (1 = most recent).
pub async fn handle_replay(index: Option<usize>) -> Result<(), anyhow::Error> {
    tracing::info!("=== lingo Replay Command ===");

    let config = load_config()?;
    let mut pipeline = build_pipeline(&config)?;

    if !pipeline.refresh().await {
        report_connection_error(&pipeline);
        return Err(anyhow::anyhow!("Could not load recordings"));
    }

    if pipeline.store().is_empty() {
        return Err(anyhow::anyhow!("No recordings found"));
    }

    let index = index.unwrap_or(1);
    let filename = pipeline
        .store()
        .by_index(index)
        .map(|r| r.filename.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Recording index out of range. Available recordings: 1-{}",
                pipeline.store().len()
            )
        })?;

    let bytes = match pipeline.audio(&filename).await.map(<[u8]>::to_vec) {
        Ok(bytes) => bytes,
        Err(err) => {
            report_connection_error(&pipeline);
            return Err(err.into());
        }
    };

    let audio_path = std::env::temp_dir().join(format!("lingo-replay-{filename}"));
    std::fs::write(&audio_path, &bytes)?;
    tracing::info!(
        "Playing recording #{index} ({} bytes) from {}",
        bytes.len(),
        audio_path.display()
    );

    let play_result = play_audio(&audio_path);

    if let Err(e) = std::fs::remove_file(&audio_path) {
        tracing::debug!("Failed to remove temp audio file: {e}");
    }

    play_result?;
    tracing::info!("Playback finished for recording #{index}");
    Ok(())
}

/// Platform-specific audio player invocation.
///
/// On macOS: `afplay`. On Linux: tries common audio players in order.
fn play_audio(audio_path: &Path) -> anyhow::Result<()> {
    #[cfg(target_os = "macos")]
    {
        Command::new("afplay")
            .arg(audio_path)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to start audio player: {e}"))?
            .wait()
            .map_err(|e| anyhow::anyhow!("Audio player error: {e}"))?;
        Ok(())
    }

    #[cfg(not(target_os = "macos"))]
    {
        let players = ["mpv", "ffplay", "paplay", "aplay", "vlc"];
        for player in players {
            if let Ok(mut child) = Command::new(player).arg(audio_path).spawn() {
                child
                    .wait()
                    .map_err(|e| anyhow::anyhow!("Audio player error: {e}"))?;
                return Ok(());
            }
        }
        Err(anyhow::anyhow!(
            "No audio player found. Install mpv, ffplay, paplay, or vlc"
        ))
    }
}
