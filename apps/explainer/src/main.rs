// explainer/src/main.rs

use clap::Parser;
use explainer::errors::{AppError, Result as AppResult};
use explainer::{run_explainer, AppConfig, AppState};
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Turn a YouTube video or a local video file into a simplified explainer document.
#[derive(Parser, Debug)]
#[command(name = "explainer", version, about)]
struct Cli {
  /// YouTube URL, `local:<path>`, or a path to a local video file.
  #[arg(value_name = "SOURCE", conflicts_with_all = ["url", "file"])]
  source: Option<String>,

  /// YouTube video URL to process.
  #[arg(long, conflicts_with = "file")]
  url: Option<String>,

  /// Local video file to process.
  #[arg(long)]
  file: Option<String>,

  /// More log output (-v debug, -vv trace).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) {
  let default_filter = match verbose {
    0 => "info",
    1 => "debug",
    _ => "trace",
  };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  let file_layer = log_file.and_then(|path| match OpenOptions::new().create(true).append(true).open(path) {
    Ok(file) => Some(
      fmt::layer()
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE) // Stage durations in the log file
        .with_writer(Arc::new(file)),
    ),
    Err(e) => {
      eprintln!("warning: cannot open log file {}: {}", path.display(), e);
      None
    }
  });

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(io::stderr))
    .with(file_layer)
    .init();
}

fn prompt_line(label: &str) -> io::Result<String> {
  print!("{}", label);
  io::stdout().flush()?;
  let mut line = String::new();
  if io::stdin().lock().read_line(&mut line)? == 0 {
    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input"));
  }
  Ok(line.trim().to_string())
}

/// Asks until the user picks a source type and enters a source.
fn prompt_for_source() -> io::Result<String> {
  loop {
    match prompt_line("Enter input type (1 for YouTube URL, 2 for local file): ")?.as_str() {
      "1" => return prompt_line("Enter YouTube URL to process: "),
      "2" => return prompt_line("Enter local video file path: ").map(|path| format!("local:{}", path)),
      _ => println!("Invalid choice. Please enter 1 or 2."),
    }
  }
}

fn resolve_source(cli: &Cli) -> AppResult<String> {
  if let Some(url) = &cli.url {
    return Ok(url.clone());
  }
  if let Some(file) = &cli.file {
    return Ok(format!("local:{}", file));
  }
  if let Some(source) = &cli.source {
    return Ok(source.clone());
  }
  Ok(prompt_for_source()?)
}

async fn run(cli: Cli, config: AppConfig) -> AppResult<()> {
  let source = resolve_source(&cli)?;
  if source.trim().is_empty() {
    return Err(AppError::Validation("No source provided".to_string()));
  }
  tracing::info!(%source, "Starting explainer.");

  let state = AppState::from_config(Arc::new(config))?;
  let (data, _outcome) = run_explainer(&state, &source).await?;

  let output = data.output_path.unwrap_or_else(|| state.config.output_path.clone());
  println!("\n{}", "=".repeat(50));
  println!("Processing completed successfully!");
  println!("Output Markdown file: {}", output.display());
  println!("{}\n", "=".repeat(50));
  Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  // Subscriber first, so config loading is logged.
  let log_file = AppConfig::log_file_from_env();
  init_tracing(cli.verbose, log_file.as_deref());

  let result = match AppConfig::from_env() {
    Ok(config) => run(cli, config).await,
    Err(e) => Err(e),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!(error = %e, "Explainer failed.");
      ExitCode::FAILURE
    }
  }
}
