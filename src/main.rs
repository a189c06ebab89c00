mod build;
mod checks;
mod commands;
mod core;
mod formula;
mod pipeline;
mod publish;
mod ui;
mod version;

use crate::core::error::{ReleaseError, print_error};
use crate::version::VersionPart;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter (e.g. `dbt_release=debug`)
const LOG_ENV: &str = "DBT_RELEASE_LOG";

/// Release dbt: bump the version, build and publish packages, generate the Homebrew formula
#[derive(Parser)]
#[command(name = "dbt-release")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Log external commands and stage transitions to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a full release: bump, build, publish to staging and production, formula
  Release {
    /// Version to release (e.g. 0.15.2 or 0.16.0b1)
    #[arg(id = "release_version", value_name = "VERSION")]
    version: String,
    /// Version part bumpversion treats as changed
    #[arg(value_enum)]
    part: VersionPart,
    /// Path to the dbt source checkout (default: current directory)
    #[arg(long)]
    path: Option<PathBuf>,
    /// Path to the Homebrew formula repository (default: ../homebrew-dbt)
    #[arg(long)]
    homebrew_path: Option<PathBuf>,
    /// Also make this version the default Homebrew formula
    #[arg(long)]
    homebrew_set_default: bool,
    /// Skip the confirmation between staging and production
    #[arg(short, long)]
    yes: bool,
    /// Print the stages and commands without running anything
    #[arg(long)]
    dry_run: bool,
    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Generate, verify and commit the Homebrew formula for a published version
  Formula {
    /// Published version (e.g. 0.15.2)
    #[arg(id = "formula_version", value_name = "VERSION")]
    version: String,
    /// Path to the dbt source checkout (default: current directory)
    #[arg(long)]
    path: Option<PathBuf>,
    /// Path to the Homebrew formula repository (default: ../homebrew-dbt)
    #[arg(long)]
    homebrew_path: Option<PathBuf>,
    /// Also make this version the default Homebrew formula
    #[arg(long)]
    set_default: bool,
    /// Render the formula to stdout instead of writing it
    #[arg(long)]
    print: bool,
  },

  /// Check that this machine can run a release
  Doctor {
    /// Path to the dbt source checkout (default: current directory)
    #[arg(long)]
    path: Option<PathBuf>,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  let heading = anstyle::Style::new()
    .bold()
    .underline()
    .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)));
  let failure = anstyle::Style::new()
    .bold()
    .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));

  clap::builder::Styles::styled()
    .usage(heading)
    .header(heading)
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(failure)
    .error(failure)
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: bool) {
  let default = if verbose { "dbt_release=debug" } else { "warn" };
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::Release {
      version,
      part,
      path,
      homebrew_path,
      homebrew_set_default,
      yes,
      dry_run,
      json,
    } => commands::run_release(commands::ReleaseArgs {
      version,
      part,
      path,
      homebrew_path,
      homebrew_set_default,
      yes,
      dry_run,
      json,
    }),
    Commands::Formula {
      version,
      path,
      homebrew_path,
      set_default,
      print,
    } => commands::run_formula(commands::FormulaArgs {
      version,
      path,
      homebrew_path,
      set_default,
      print,
    }),
    Commands::Doctor { path, json } => commands::run_doctor(path, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
