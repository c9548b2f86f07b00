use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use cmd::Global;
use output::OutputFormat;

/// feedstocks - keep a fleet of conda-forge feedstocks at their desired versions
#[derive(Parser)]
#[command(name = "feedstocks")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the config file (default: ./feedstocks.yml, then the user config dir)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Prefix generated recipe names and in-batch requirements
  #[arg(long, global = true)]
  prefix: Option<String>,

  /// GitHub token used to create forks
  #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show where every desired package stands
  Status,

  /// Submit recipes for packages without a feedstock to staged-recipes
  Create {
    /// Packages to submit (default: every package without a recipe)
    packages: Vec<String>,

    /// Branch name (default: derived from the package names)
    #[arg(short, long)]
    branch: Option<String>,
  },

  /// Regenerate the recipe of an existing feedstock at the desired version
  Update {
    package: String,

    /// Branch name (default: upgrade-to-<version>)
    #[arg(short, long)]
    branch: Option<String>,
  },

  /// Generate recipes into a local directory
  Generate {
    dir: PathBuf,

    /// Packages to generate (default: every package without a recipe)
    packages: Vec<String>,
  },

  /// Build every recipe in a directory in dependency order
  Build {
    dir: PathBuf,

    /// Extra channels to build against (repeatable)
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Skip the recipes' test sections
    #[arg(long)]
    no_test: bool,

    /// Show the build order without building
    #[arg(long)]
    dry_run: bool,
  },

  /// Upload built artifacts
  Publish {
    dir: PathBuf,

    /// Base URL artifacts are uploaded to
    #[arg(long)]
    to: String,

    /// Bearer token for the upload server
    #[arg(long, env = "FEEDSTOCKS_UPLOAD_TOKEN", hide_env_values = true)]
    upload_token: Option<String>,
  },

  /// Re-trigger CI for feedstocks whose artifacts are missing
  Kick {
    /// Packages to kick (default: every kickable package)
    packages: Vec<String>,

    /// List what would be kicked without pushing
    #[arg(long)]
    dry_run: bool,
  },

  /// Print the build order of the recipes in a directory
  Order { dir: PathBuf },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let global = Global {
    config: cli.config,
    prefix: cli.prefix,
    token: cli.token,
    verbose: cli.verbose,
    format: cli.format,
  };

  match cli.command {
    Commands::Status => cmd::cmd_status(&global),
    Commands::Create { packages, branch } => cmd::cmd_create(&global, &packages, branch.as_deref()),
    Commands::Update { package, branch } => cmd::cmd_update(&global, &package, branch.as_deref()),
    Commands::Generate { dir, packages } => cmd::cmd_generate(&global, &dir, &packages),
    Commands::Build {
      dir,
      channels,
      no_test,
      dry_run,
    } => cmd::cmd_build(&global, &dir, channels, no_test, dry_run),
    Commands::Publish { dir, to, upload_token } => cmd::cmd_publish(&global, &dir, &to, upload_token),
    Commands::Kick { packages, dry_run } => cmd::cmd_kick(&global, &packages, dry_run),
    Commands::Order { dir } => cmd::cmd_order(&global, &dir),
  }
}
