//! The command line interface for the forecaster.
use crate::commands::{
    handle_demo_extract_command, handle_demo_list_command, handle_demo_run_command,
    handle_run_command, handle_settings_dump_default_command, handle_settings_init_command,
    handle_settings_path_command, handle_validate_command,
};
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// The command line interface for the forecaster.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// First forecast date (defaults to today)
    #[arg(short, long)]
    pub start_date: Option<NaiveDate>,
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a forecast model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model without running it.
    Validate {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
    /// Manage bundled demo models.
    Demo {
        /// The available subcommands for managing demo models.
        #[command(subcommand)]
        subcommand: DemoSubcommands,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

/// The available subcommands for managing settings.
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Create the settings file with default contents, if it does not already exist.
    Init,
    /// Print the path to the settings file.
    Path,
    /// Print the contents of the default settings file.
    DumpDefault,
}

/// The available subcommands for managing demo models.
#[derive(Subcommand)]
pub enum DemoSubcommands {
    /// List available demo models.
    List,
    /// Extract a demo model configuration to a new directory.
    Extract {
        /// The name of the demo to extract.
        name: String,
        /// The destination folder for the demo.
        new_path: Option<PathBuf>,
    },
    /// Run a demo model.
    Run {
        /// The name of the demo to run.
        name: String,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Demo { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Init => handle_settings_init_command()?,
            Self::Path => handle_settings_path_command(),
            Self::DumpDefault => handle_settings_dump_default_command(),
        }

        Ok(())
    }
}

impl DemoSubcommands {
    /// Execute the supplied demo subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_demo_list_command(),
            Self::Extract { name, new_path } => {
                handle_demo_extract_command(&name, new_path.as_deref())?;
            }
            Self::Run { name, opts } => handle_demo_run_command(&name, &opts)?,
        }

        Ok(())
    }
}

/// Parse CLI arguments and dispatch the selected command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}
