//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the appropriate
//! command handlers.

use std::io;
use std::process;

use anyhow::anyhow;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use crate::commands;
use crate::logging;

/// Checks if setup is needed (version mismatch or missing config) and runs
/// setup if required. Called early in the startup sequence, before command
/// handling.
fn check_and_run_setup() -> Result<(), anyhow::Error> {
    let config_path = crate::config::config_path()?;

    match crate::setup::version::check_setup_needed(&config_path)? {
        Some(old_version) => {
            tracing::info!(
                "Setup needed - migrating from version {} to {}",
                old_version,
                env!("CARGO_PKG_VERSION")
            );
            crate::setup::run_setup().map_err(|e| {
                tracing::error!("Setup failed: {e}");
                anyhow!("Setup failed: {e}")
            })?;
            tracing::info!(
                "Setup completed successfully - config at version {}",
                env!("CARGO_PKG_VERSION")
            );
        }
        None => {
            tracing::debug!("Config version up to date ({})", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Record speech, have it graded, and browse your past recordings
#[derive(Parser)]
#[command(name = "lingo")]
#[command(version)]
#[command(about = "Record speech, have it graded, and browse your past recordings")]
#[command(
    long_about = "A terminal language-practice recorder with AI speech grading.\n\nRecord speech against a speaking prompt, submit it to your grading server,\nand browse past recordings with transcriptions and five-axis grades.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Record against the configured default prompt\n    $ lingo\n\n    # Record against a custom prompt\n    $ lingo record --prompt \"Describe your day\"\n\n    # Browse your recordings and their grades\n    $ lingo list\n    $ lingo show 2\n\n    # Replay or delete a recording\n    $ lingo replay 2\n    $ lingo delete 2\n\n    # Configure the grading server and access token\n    $ lingo auth"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/lingo/lingo.toml\n    Logs:               ~/.local/state/lingo/lingo.log.*"
)]
struct Cli {
    /// Speaking prompt to record against (record default command)
    #[arg(short, long)]
    prompt: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record speech and submit it for grading (default)
    ///
    /// Press Enter to submit the recording, Ctrl-C to discard it.
    #[command(visible_alias = "r")]
    Record {
        /// Speaking prompt to record against
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// List your recordings with their grades
    #[command(visible_alias = "l")]
    List,

    /// Show the full grading report for a recording
    ///
    /// Includes transcription, the five-axis performance breakdown, the
    /// model's feedback, and any grading notes.
    #[command(visible_alias = "s")]
    Show {
        /// Recording index (1 = most recent, 2 = second most recent, etc.)
        #[arg(value_name = "N")]
        index: Option<usize>,
    },

    /// Replay a recording using the system audio player
    #[command(visible_alias = "rp")]
    Replay {
        /// Recording index (1 = most recent, 2 = second most recent, etc.)
        #[arg(value_name = "N")]
        index: Option<usize>,
    },

    /// Delete a recording from the server
    ///
    /// The recording disappears from the listing only after the server
    /// confirms the delete.
    #[command(visible_alias = "d")]
    Delete {
        /// Recording index (1 = most recent, 2 = second most recent, etc.)
        #[arg(value_name = "N")]
        index: usize,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Configure the grading server URL and access token
    #[command(visible_alias = "a")]
    Auth {
        /// Clear the stored access token instead of configuring
        #[arg(long)]
        logout: bool,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in lingo.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   lingo completions bash > lingo.bash
    ///   lingo completions zsh > _lingo
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "lingo", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    match cli.command {
        None | Some(Commands::Record { .. }) => {
            // Default command is record. Explicit record options take
            // precedence over the top-level ones.
            let prompt = match cli.command {
                Some(Commands::Record { prompt }) => prompt.or(cli.prompt),
                None => cli.prompt,
                _ => unreachable!(),
            };
            commands::handle_record(prompt).await?;
        }
        Some(Commands::List) => {
            commands::handle_list().await?;
        }
        Some(Commands::Show { index }) => {
            commands::handle_show(index).await?;
        }
        Some(Commands::Replay { index }) => {
            commands::handle_replay(index).await?;
        }
        Some(Commands::Delete { index, yes }) => {
            commands::handle_delete(index, yes).await?;
        }
        Some(Commands::Auth { logout }) => {
            if let Err(e) = commands::handle_auth(logout).await {
                // cliclack already displayed the cancellation message
                let err_msg = e.to_string();
                if err_msg.contains("cancelled") || err_msg.contains("interrupted") {
                    process::exit(0);
                } else {
                    return Err(e);
                }
            }
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
