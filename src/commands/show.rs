//! Full grading detail for one recording.

use crate::ui::report;

use super::{build_pipeline, load_config, report_connection_error};

/// Shows the grading report for a recording by display index
/// (1 = most recent; default 1).
pub async fn handle_show(index: Option<usize>) -> Result<(), anyhow::Error> {
    tracing::info!("=== lingo Recording Detail ===");

    let config = load_config()?;
    let mut pipeline = build_pipeline(&config)?;

    if !pipeline.refresh().await {
        report_connection_error(&pipeline);
        return Err(anyhow::anyhow!("Could not load recordings"));
    }

    if pipeline.store().is_empty() {
        println!("No recordings yet. Run 'lingo record' to make your first one.");
        return Ok(());
    }

    let index = index.unwrap_or(1);
    let recording = pipeline.store().by_index(index).ok_or_else(|| {
        anyhow::anyhow!(
            "Recording index out of range. Available recordings: 1-{}",
            pipeline.store().len()
        )
    })?;

    println!();
    println!("{}", report::format_recording_detail(recording));
    println!();

    Ok(())
}
