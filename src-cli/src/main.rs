//! LedFx Audio Command Line Interface
//!
//! Controls macOS audio routing for LedFx: enables/disables the stacked
//! multi-output aggregate that clones system audio to the loopback driver,
//! and gets/sets the system volume and mute state.

mod aggregation;
mod command;
mod dispatch;
mod platform;
mod query;
mod volume;

use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ledfx_audio_common::{AudioError, FileVolumeStash, Settings};
use tracing_subscriber::EnvFilter;

use command::{MuteCommand, VolumeCommand, USAGE};
use dispatch::{Dispatcher, OutputFormat, Request};

#[derive(Parser)]
#[command(name = "ledfx-audio")]
#[command(author = "LedFx")]
#[command(version)]
#[command(about = "macOS audio routing and volume control for LedFx", long_about = None)]
struct Cli {
    /// Output format for `devices` and `status`
    #[arg(long, default_value = "text", global = true)]
    format: FormatArg,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the stacked aggregate and make it the default output
    Enable {
        /// Substring of the loopback driver's device name
        driver: Option<String>,
    },

    /// Remove the aggregate and fall back to a physical output
    Disable,

    /// Volume of the default output: get | set <0-100> | up [amount] | down [amount]
    Volume {
        action: Option<String>,
        #[arg(allow_negative_numbers = true)]
        value: Option<String>,
    },

    /// Mute state of the default output: toggle | get | set <on|off>
    Mute { action: Option<String>, value: Option<String> },

    /// List audio devices
    #[command(alias = "ls")]
    Devices,

    /// Show whether the aggregate is active
    Status,
}

impl Commands {
    fn into_request(self) -> Result<Request, AudioError> {
        Ok(match self {
            Commands::Enable { driver } => Request::Enable(driver),
            Commands::Disable => Request::Disable,
            Commands::Volume { action, value } => Request::Volume(VolumeCommand::parse(
                action.as_deref(),
                value.as_deref(),
            )?),
            Commands::Mute { action, value } => {
                Request::Mute(MuteCommand::parse(action.as_deref(), value.as_deref())?)
            }
            Commands::Devices => Request::Devices,
            Commands::Status => Request::Status,
        })
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => exit_with_parse_error(e),
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) if e.is_usage() => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String, AudioError> {
    // Bad arguments are reported before any hardware is touched
    let request = cli.command.into_request()?;
    let settings = Settings::load(cli.config.as_deref())?;
    let format = match cli.format {
        FormatArg::Text => OutputFormat::Text,
        FormatArg::Json => OutputFormat::Json,
    };

    let hardware = platform::open()?;
    let stash = FileVolumeStash::new(settings.stash_dir());
    tracing::debug!("Volume stash in {:?}", stash.dir());

    Dispatcher::new(hardware.as_ref(), &stash, &settings, format).execute(request)
}

/// Logs go to stderr; stdout carries only command results.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Report a command line parse error and exit with status 1.
fn exit_with_parse_error(err: clap::Error) -> ! {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        ErrorKind::InvalidSubcommand => {
            let value = match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(s)) => s.clone(),
                _ => String::new(),
            };
            eprintln!(
                "{}",
                AudioError::Unknown {
                    kind: "command",
                    value
                }
            );
        }
        ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            eprintln!("{}", USAGE);
        }
        _ => {
            let _ = err.print();
        }
    }
    std::process::exit(1);
}
