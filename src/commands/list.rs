//! Recording listing.

use console::style;

use crate::ui::report;

use super::{build_pipeline, load_config, report_connection_error};

/// Lists all recordings, most recent first, with their overall grades.
pub async fn handle_list() -> Result<(), anyhow::Error> {
    tracing::info!("=== lingo Recording List ===");

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

    println!();
    println!(
        "{}",
        style(format!(
            "{:>3}  {:<16}  {:>6}  {:>4}  prompt",
            "#", "recorded", "dur", "avg"
        ))
        .dim()
    );
    for (i, recording) in pipeline.store().iter().enumerate() {
        println!("{}", report::format_recording_row(i + 1, recording));
    }
    println!();
    println!(
        "{}",
        style("Use 'lingo show <#>' for the full grading report.").dim()
    );

    Ok(())
}
