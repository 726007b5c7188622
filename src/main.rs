use clap::{Args, Parser, Subcommand};
use relnotes::commands;
use relnotes::core::error::{ExitCode, NotesError, print_error};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::error;

/// Release notes from merge commits and issue tracker records
#[derive(Parser)]
#[command(name = "relnotes")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(flatten)]
  logging: LoggingArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct LoggingArgs {
  /// Show debug logs (RUST_LOG takes precedence)
  #[arg(short, long, global = true, conflicts_with = "quiet")]
  verbose: bool,
  /// Only show warnings and errors
  #[arg(short, long, global = true)]
  quiet: bool,
  /// Append logs to this file instead of stderr
  #[arg(long, global = true, value_name = "PATH")]
  log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate the release notes for the configured repositories
  Generate {
    /// Config file (default: relnotes.toml, .relnotes.toml or .config/relnotes.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output file (overrides tracker.output_file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Only process this repository (repeatable)
    #[arg(long = "repo", value_name = "NAME")]
    repositories: Vec<String>,
    /// Print the release notes instead of writing the file
    #[arg(long)]
    dry_run: bool,
  },

  /// Validate the configuration and show the resolved targets
  Config {
    /// Config file (default: relnotes.toml, .relnotes.toml or .config/relnotes.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn setup_logging(args: &LoggingArgs) {
  use tracing_subscriber::EnvFilter;

  let default_level = if args.verbose {
    "debug"
  } else if args.quiet {
    "warn"
  } else {
    "info"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  // Fall back to stderr when the log file cannot be opened
  if let Some(file) = args.log_file.as_deref().and_then(open_log_file) {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(Mutex::new(file))
      .with_ansi(false)
      .init();
  } else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .init();
  }
}

fn open_log_file(path: &Path) -> Option<fs::File> {
  match fs::OpenOptions::new().create(true).append(true).open(path) {
    Ok(file) => Some(file),
    Err(e) => {
      eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
      None
    }
  }
}

fn main() {
  let cli = Cli::parse();
  setup_logging(&cli.logging);

  let result = match cli.command {
    Commands::Generate {
      config,
      output,
      repositories,
      dry_run,
    } => commands::run_generate(&commands::GenerateOptions {
      config_path: config,
      output,
      repositories,
      dry_run,
    }),
    Commands::Config { config, json } => commands::run_config(config, json).map(|_| ExitCode::Success),
  };

  match result {
    Ok(code) => std::process::exit(code.as_i32()),
    Err(err) => handle_error(err),
  }
}

fn handle_error(err: NotesError) -> ! {
  error!(error = %err, "run aborted");
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
