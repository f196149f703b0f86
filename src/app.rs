//! Application orchestration and command routing.
//!
//! Parses the command line and hands off to the command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// An interactive terminal video recorder
#[derive(Parser)]
#[command(name = "vidrec")]
#[command(version)]
#[command(about = "Record video from your camera, preview it and save it as webm or mp4")]
#[command(long_about = "Record video from your camera, preview it and save it as webm or mp4.\n\nOne control drives the session: Start Recording, Stop Recording, Download\nRecording, then Record Again. With transcoding enabled the recording is saved\nas MyRecording.mp4 together with a MyThumbnail.jpg taken one second in.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n    Record options (--no-transcode, -o) can be used without saying 'record'.\n\nEXAMPLES:\n    # Record and save mp4 + thumbnail to ~/Downloads\n    $ vidrec\n\n    # Save the raw webm instead\n    $ vidrec --no-transcode\n\n    # Save into another directory\n    $ vidrec -o ~/Videos\n\n    # Play the newest saved recording and count a view\n    $ vidrec play --video-id 42\n\n    # Start or stop recording from another terminal\n    $ pkill -USR1 vidrec")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/vidrec/vidrec.toml\n    Logs:               ~/.local/state/vidrec/vidrec.log.*"
)]
struct Cli {
    #[command(flatten)]
    record: RecordArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Debug, Clone, Default)]
struct RecordArgs {
    /// Save the raw recording instead of an mp4 and thumbnail
    #[arg(long, global = true, conflicts_with = "transcode")]
    no_transcode: bool,

    /// Transcode to mp4 and extract a thumbnail even if disabled in the config
    #[arg(long, global = true)]
    transcode: bool,

    /// Directory to save recordings into
    #[arg(short, long = "output-dir", value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,
}

impl RecordArgs {
    /// `Some` only when a flag overrides the config.
    fn transcode_override(&self) -> Option<bool> {
        match (self.transcode, self.no_transcode) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record video with live preview (default)
    ///
    /// Space or Enter activates the control, q or Esc quits. Paths of saved
    /// files are printed to stdout when the recorder exits.
    #[command(visible_alias = "r")]
    Record,

    /// Play a recording with ffplay
    ///
    /// Plays FILE, or a saved recording from the history. With --video-id the
    /// server is told about the view once playback reaches the end.
    #[command(visible_alias = "p")]
    Play {
        /// Video file to play
        #[arg(value_name = "FILE", conflicts_with = "index")]
        file: Option<PathBuf>,

        /// Saved recording to play (1 = most recent)
        #[arg(short = 'n', long, value_name = "N")]
        index: Option<usize>,

        /// Server-side id of the video, for the view counter
        #[arg(long, value_name = "ID")]
        video_id: Option<String>,
    },

    /// List saved recordings
    #[command(visible_alias = "h")]
    History,

    /// List available cameras and microphones
    ///
    /// Shows the names to put in the [capture] section of vidrec.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Open configuration file in your preferred editor
    #[command(visible_alias = "c")]
    Config,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   vidrec completions bash > vidrec.bash
    ///   vidrec completions zsh > _vidrec
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging or setup fails
/// - If the selected command fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor config
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "vidrec", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return exit_on_error(commands::handle_list_devices()),
        Some(Commands::Logs) => return exit_on_error(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;

    crate::setup::ensure_config().map_err(|e| {
        tracing::error!("Setup failed: {e}");
        anyhow::anyhow!("Setup failed: {e}")
    })?;

    match cli.command {
        None | Some(Commands::Record) => {
            commands::handle_record(cli.record.transcode_override(), cli.record.output_dir).await?;
        }
        Some(Commands::Play {
            file,
            index,
            video_id,
        }) => {
            commands::handle_play(file, index, video_id).await?;
        }
        Some(Commands::History) => commands::handle_history()?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: Result<(), anyhow::Error>) -> Result<(), anyhow::Error> {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_record_is_default_with_global_flags() {
        let cli = Cli::try_parse_from(["vidrec", "--no-transcode", "-o", "/tmp/out"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.record.transcode_override(), Some(false));
        assert_eq!(cli.record.output_dir, Some(PathBuf::from("/tmp/out")));

        let cli = Cli::try_parse_from(["vidrec", "record", "--transcode"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Record)));
        assert_eq!(cli.record.transcode_override(), Some(true));

        let cli = Cli::try_parse_from(["vidrec"]).unwrap();
        assert_eq!(cli.record.transcode_override(), None);
    }

    #[test]
    fn test_transcode_flags_conflict() {
        assert!(Cli::try_parse_from(["vidrec", "--transcode", "--no-transcode"]).is_err());
    }

    #[test]
    fn test_play_arguments() {
        let cli = Cli::try_parse_from(["vidrec", "play", "-n", "2", "--video-id", "abc"]).unwrap();
        match cli.command {
            Some(Commands::Play {
                file,
                index,
                video_id,
            }) => {
                assert_eq!(file, None);
                assert_eq!(index, Some(2));
                assert_eq!(video_id.as_deref(), Some("abc"));
            }
            _ => panic!("expected play"),
        }
    }
}
