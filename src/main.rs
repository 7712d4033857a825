mod api;
mod app;
mod commands;
mod config;
mod event;
mod queries;
mod query;
mod routes;
mod session;
mod ui;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "t9s")]
#[command(about = "A terminal UI for task management, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/t9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Server URL to connect to (overrides config)
  #[arg(short, long)]
  server: Option<String>,
}

/// Send logs to a file under the data directory; writing them to the
/// terminal would draw over the UI. Filter via T9S_LOG.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("t9s");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let file = tracing_appender::rolling::never(&log_dir, "t9s.log");
  let (writer, guard) = tracing_appender::non_blocking(file);

  let filter = EnvFilter::try_from_env("T9S_LOG").unwrap_or_else(|_| EnvFilter::new("t9s=info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _guard = init_logging()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override server if specified on command line
  let config = if let Some(url) = args.server {
    config::Config {
      server: config::ServerConfig { url },
      ..config
    }
  } else {
    config
  };

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
