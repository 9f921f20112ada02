use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use galaxy_generator::config::Config;
use galaxy_generator::error::Result;
use log::error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Procedural spiral galaxy generator and viewer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// TOML config file; missing values use defaults
  #[arg(short, long)]
  config: Option<PathBuf>,
  /// Number of stars, overriding the config
  #[arg(short = 'n', long)]
  count: Option<u32>,
  /// Seed for reproducible galaxies
  #[arg(short, long)]
  seed: Option<u64>,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Frames to step in headless mode
  #[arg(long, default_value_t = 600)]
  frames: u32,
  /// Write the final point cloud as JSON (headless only)
  #[arg(long, requires = "headless")]
  dump: Option<PathBuf>,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
  /// Print the default configuration as TOML
  DefaultConfig,
}

fn run(args: Args) -> Result<()> {
  match args.command {
    Some(Commands::Completions { shell }) => {
      let mut cmd = Args::command();
      let name = cmd.get_name().to_string();
      generate(shell, &mut cmd, name, &mut io::stdout());
      return Ok(());
    }
    Some(Commands::DefaultConfig) => {
      print!("{}", Config::default().to_toml()?);
      return Ok(());
    }
    None => {}
  }

  let mut config = match &args.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  if let Some(count) = args.count {
    config.galaxy.count = count;
  }
  if args.seed.is_some() {
    config.seed = args.seed;
  }
  config.limit_count();

  if args.headless {
    galaxy_generator::state::run_headless(&config, args.frames, args.dump.as_deref())
  } else {
    galaxy_generator::state::run(config)
  }
}

fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  match run(Args::parse()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{e}");
      ExitCode::FAILURE
    }
  }
}
