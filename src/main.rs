mod api;
mod cli;
mod config;
mod model;
mod monitor;
mod repo;
mod session;
mod sync;

use clap::Parser;
use color_eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = cli::Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _guard = init_tracing()?;

  cli::run(args).await
}

/// Route logs to a file under the data directory; stdout belongs to the
/// command output.
fn init_tracing() -> Result<Option<WorkerGuard>> {
  let data_dir = dirs::data_dir().or_else(|| dirs::home_dir().map(|p| p.join(".local/share")));
  let log_dir = match data_dir {
    Some(dir) => dir.join("raidsync"),
    None => return Ok(None),
  };
  std::fs::create_dir_all(&log_dir)?;

  let file = tracing_appender::rolling::never(log_dir, "raidsync.log");
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "raidsync=info".into()),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(Some(guard))
}
