//! Recording deletion.
//!
//! The entry leaves the local listing only after the server confirms the
//! delete; a failed delete is reported and leaves everything in place.

use cliclack::confirm;
use console::style;

use super::{build_pipeline, load_config, report_connection_error};

/// Deletes a recording by display index (1 = most recent).
pub async fn handle_delete(index: usize, assume_yes: bool) -> Result<(), anyhow::Error> {
    tracing::info!("=== lingo Delete Command ===");

    let config = load_config()?;
    let mut pipeline = build_pipeline(&config)?;

    if !pipeline.refresh().await {
        report_connection_error(&pipeline);
        return Err(anyhow::anyhow!("Could not load recordings"));
    }

    let (id, label) = pipeline
        .store()
        .by_index(index)
        .map(|r| {
            let recorded = r
                .recorded_at()
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown time".to_string());
            (r.id, format!("recording #{index} from {recorded}"))
        })
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Recording index out of range. Available recordings: 1-{}",
                pipeline.store().len()
            )
        })?;

    if !assume_yes {
        let confirmed = confirm(format!("Delete {label}?"))
            .initial_value(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Confirmation cancelled: {e}"))?;
        if !confirmed {
            println!("Nothing deleted.");
            return Ok(());
        }
    }

    match pipeline.delete_recording(id).await {
        Ok(true) => {
            println!(
                "{} {label} deleted. {} recording(s) remain.",
                style("✓").green(),
                pipeline.store().len()
            );
            Ok(())
        }
        Ok(false) => {
            println!("Delete already in progress for {label}.");
            Ok(())
        }
        Err(err) => {
            report_connection_error(&pipeline);
            Err(err.into())
        }
    }
}
