mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wikimap_lib::settings::Settings;

use cmd::{PlanArgs, RunArgs, cmd_list, cmd_run, cmd_show, cmd_snapshots};
use output::{OutputFormat, print_error};

/// wikimap - incremental build orchestrator over numbered snapshot directories
#[derive(Parser)]
#[command(name = "wikimap")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Archive root holding the snapshot directories [env: WIKIMAP_BUILDPATH]
  #[arg(short, long, global = true)]
  buildpath: Option<PathBuf>,

  /// Snapshot directory prefix [env: WIKIMAP_BUILD_PREFIX, default: build]
  #[arg(short, long, global = true)]
  prefix: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the planned jobs
  List(PlanArgs),

  /// Run the planned jobs into a new snapshot
  Run(RunArgs),

  /// List snapshot directories
  Snapshots {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the configuration record of a snapshot
  Show {
    /// Snapshot index
    index: usize,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let settings = Settings::from_env().with_overrides(cli.buildpath, cli.prefix);

  let result = match cli.command {
    Commands::List(args) => cmd_list(&args).map(|()| ExitCode::SUCCESS),
    Commands::Run(args) => cmd_run(&settings, args),
    Commands::Snapshots { output } => cmd_snapshots(&settings, output).map(|()| ExitCode::SUCCESS),
    Commands::Show { index, output } => cmd_show(&settings, index, output).map(|()| ExitCode::SUCCESS),
  };

  match result {
    Ok(code) => code,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
