//! Command-line interface for cainiao-tracker.
//!
//! Scriptable access to the parcel lists plus the interactive TUI:
//! - `add`, `list`: create and show parcels
//! - `archive`, `unarchive`, `delete`: move parcels between lists
//! - `open`, `url`: tracking page for a parcel or code
//! - `update`: release check and package download
//! - `tui`: interactive mode (the default)

mod commands;

pub use commands::*;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Result, TrackerError};

/// Track Cainiao parcels from the terminal.
#[derive(Debug, Parser)]
#[command(name = "cainiao")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run (defaults to the TUI).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "CAINIAO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the store file (overrides the configured location).
    #[arg(long, global = true, env = "CAINIAO_STORE")]
    pub store: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long, global = true, env = "CAINIAO_JSON")]
    pub json: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "CAINIAO_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "CAINIAO_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Log output file (default: stderr).
    #[arg(long, global = true, env = "CAINIAO_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Cli {
    /// Whether this invocation runs the full-screen TUI.
    #[must_use]
    pub fn is_tui(&self) -> bool {
        matches!(self.command, None | Some(Commands::Tui(_)))
    }

    /// Load the configuration named by `--config`, or the default one.
    ///
    /// A `--config` path that does not exist yet yields defaults, so
    /// `config init` can create it.
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) if path.exists() => Config::load_from(path),
            Some(_) => Ok(Config::default()),
            None => Config::load(),
        }
    }

    /// Store location: `--store`, else the configured one.
    pub fn store_path(&self, config: &Config) -> Result<PathBuf> {
        match &self.store {
            Some(path) => Ok(path.clone()),
            None => config.store_path(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a parcel to the active list.
    #[command(alias = "new")]
    Add(AddArgs),

    /// List parcels.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Move an active parcel to the archive.
    Archive(SelectArgs),

    /// Move an archived parcel back to the active list.
    Unarchive(SelectArgs),

    /// Delete a parcel.
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Open the tracking page of an active parcel.
    Open(SelectArgs),

    /// Print the tracking page URL for a code.
    Url(UrlArgs),

    /// Launch interactive TUI.
    #[command(alias = "ui")]
    Tui(TuiArgs),

    /// Check for and download new releases.
    Update(UpdateArgs),

    /// View and initialize configuration.
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the add command.
#[derive(Debug, Clone, clap::Args)]
pub struct AddArgs {
    /// Display name of the parcel.
    pub name: String,

    /// Cainiao tracking code.
    pub code: String,
}

/// Arguments for the list command.
#[derive(Debug, Clone, clap::Args)]
pub struct ListArgs {
    /// Show the archived list instead of the active one.
    #[arg(short = 'a', long)]
    pub archived: bool,

    /// Only show parcels whose name or code contains this text.
    #[arg(short = 'q', long)]
    pub query: Option<String>,

    /// Show full ids instead of short ones.
    #[arg(long)]
    pub full_ids: bool,
}

/// A single-parcel selector.
#[derive(Debug, Clone, clap::Args)]
pub struct SelectArgs {
    /// 1-based position (as shown by `list`) or id prefix.
    pub selector: String,
}

/// Arguments for the delete command.
#[derive(Debug, Clone, clap::Args)]
pub struct DeleteArgs {
    /// 1-based position (as shown by `list`) or id prefix.
    pub selector: String,

    /// Select from the archived list.
    #[arg(short = 'a', long)]
    pub archived: bool,
}

/// Arguments for the url command.
#[derive(Debug, Clone, clap::Args)]
pub struct UrlArgs {
    /// Cainiao tracking code.
    pub code: String,

    /// Also open the page in the default browser.
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the TUI command.
#[derive(Debug, Clone, clap::Args)]
pub struct TuiArgs {
    /// Theme override (dark, light).
    #[arg(short = 't', long)]
    pub theme: Option<String>,
}

/// Arguments for the update command.
#[derive(Debug, Clone, clap::Args)]
pub struct UpdateArgs {
    /// Update action.
    #[command(subcommand)]
    pub action: UpdateAction,
}

/// Update actions.
#[derive(Debug, Clone, Subcommand)]
pub enum UpdateAction {
    /// Compare the latest release with this version.
    Check,
    /// Download the latest release package.
    Download {
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,

        /// Directory to store the package in.
        #[arg(short = 'O', long = "out")]
        dir: Option<PathBuf>,

        /// Open the package with the system handler after downloading.
        #[arg(long)]
        open: bool,
    },
}

/// Arguments for the config command.
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Config action.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the configuration file path.
    Path,
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the completions command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "cainiao", &mut io::stdout());
}

/// Initialize tracing/logging based on CLI options.
///
/// The TUI owns the terminal, so without `--log-file` it logs nothing.
fn init_logging(cli: &Cli) -> Result<()> {
    use std::sync::Mutex;
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let (writer, ansi) = match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    TrackerError::io(format!("Failed to open log file: {}", path.display()), e)
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let filter = if cli.is_tui() && cli.log_file.is_none() {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()))
    };

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(ansi)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_ansi(ansi).with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
    Ok(())
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        None => commands::tui::run(&cli, &TuiArgs { theme: None }),
        Some(Commands::Add(args)) => commands::add::run(&cli, args),
        Some(Commands::List(args)) => commands::list::run(&cli, args),
        Some(Commands::Archive(args)) => commands::manage::archive(&cli, args),
        Some(Commands::Unarchive(args)) => commands::manage::unarchive(&cli, args),
        Some(Commands::Delete(args)) => commands::manage::delete(&cli, args),
        Some(Commands::Open(args)) => commands::open::run(&cli, args),
        Some(Commands::Url(args)) => commands::open::url(&cli, args),
        Some(Commands::Tui(args)) => commands::tui::run(&cli, args),
        Some(Commands::Update(args)) => commands::update::run(&cli, args),
        Some(Commands::Config(args)) => commands::config::run(&cli, args),
        Some(Commands::Completions(args)) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}
