//! Speech recording and submission.
//!
//! Records audio against a speaking prompt, submits it for grading, and
//! prints the grading report. Supports an external submit trigger via
//! SIGUSR1 in addition to Enter on the terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use console::style;

use crate::capture::SpeechRecorder;
use crate::ui::report;

use super::{build_pipeline, load_config, report_capture_error, report_connection_error};

/// Records one practice session and submits it for grading.
///
/// The microphone stream is released on every exit path: submit, discard,
/// and error.
pub async fn handle_record(prompt_override: Option<String>) -> Result<(), anyhow::Error> {
    tracing::info!("=== lingo Recorder Started ===");

    let config = load_config()?;
    let prompt = prompt_override.unwrap_or_else(|| config.practice.prompt.clone());
    let mut pipeline = build_pipeline(&config)?;

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, server={}",
        config.audio.device,
        config.audio.sample_rate,
        config.server.base_url
    );

    let mut recorder =
        SpeechRecorder::new(config.audio.sample_rate, config.audio.device.clone());
    if let Err(err) = recorder.start() {
        pipeline.record_capture_failure(&err);
        report_capture_error(&pipeline);
        return Err(err.into());
    }

    println!();
    println!("  {}", style("Speaking prompt").bold());
    println!("  {}", style(&prompt).cyan());
    println!();
    println!(
        "  {} Press Enter to submit, Ctrl-C to discard.",
        style("● Recording").red().bold()
    );

    let submitted = wait_for_stop(&recorder).await?;

    // Leaving the Recording state always releases the stream, whether the
    // take is submitted or discarded.
    let clip = match recorder.stop() {
        Ok(Some(clip)) => clip,
        Ok(None) => {
            println!("No audio was captured.");
            return Ok(());
        }
        Err(err) => {
            pipeline.record_capture_failure(&err);
            report_capture_error(&pipeline);
            return Err(err.into());
        }
    };

    if !submitted {
        println!("Recording discarded.");
        tracing::info!("Recording discarded by user");
        return Ok(());
    }

    tracing::info!(
        "Submitting {:.1}s recording at {}Hz for prompt '{prompt}'",
        clip.duration_secs(),
        clip.sample_rate()
    );

    let spinner = cliclack::spinner();
    spinner.start("Submitting recording for grading...");

    match pipeline.submit_recording(&clip, &prompt).await {
        Ok(result) => {
            spinner.stop("Grading complete.");
            println!();
            match result {
                Some(result) => {
                    if let Some(performance) = report::format_performance(&result.grades) {
                        println!("{performance}");
                        println!();
                    }
                    if let Some(analysis) = report::format_analysis(&result) {
                        println!("{analysis}");
                        println!();
                    }
                    if let Some(transcription) = &result.transcription {
                        println!("Transcription: {transcription}");
                        println!();
                    }
                }
                None => {
                    println!("The server accepted the recording but returned no structured result.");
                }
            }

            // A refresh failure after a successful analyze surfaces on the
            // connection channel without voiding the grading result.
            report_connection_error(&pipeline);
            if pipeline.connection_error().is_none() {
                println!(
                    "Saved. You now have {} recording(s); see 'lingo list'.",
                    pipeline.store().len()
                );
            }
            Ok(())
        }
        Err(err) => {
            spinner.error("Grading failed.");
            report_capture_error(&pipeline);
            Err(err.into())
        }
    }
}

/// Waits until the user submits (Enter or SIGUSR1) or discards (Ctrl-C).
///
/// Returns true to submit, false to discard.
async fn wait_for_stop(recorder: &SpeechRecorder) -> anyhow::Result<bool> {
    let discard = Arc::new(AtomicBool::new(false));
    {
        let discard = Arc::clone(&discard);
        ctrlc::set_handler(move || discard.store(true, Ordering::SeqCst))
            .map_err(|e| anyhow::anyhow!("Failed to set Ctrl-C handler: {e}"))?;
    }

    let external_submit = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&external_submit))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let enter = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
    });

    let mut ticks = 0u64;
    let submitted = loop {
        if discard.load(Ordering::SeqCst) {
            break false;
        }
        if external_submit.load(Ordering::SeqCst) {
            tracing::info!("Received SIGUSR1: submitting via external trigger");
            break true;
        }
        if enter.is_finished() {
            break true;
        }

        ticks += 1;
        if ticks % 60 == 0 && recorder.is_recording() {
            let buffered_secs =
                recorder.sample_count() as f32 / recorder.sample_rate() as f32;
            tracing::debug!("Recording: {buffered_secs:.1}s buffered");
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    };
    enter.abort();

    Ok(submitted)
}
