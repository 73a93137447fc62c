use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fuelpoa::cli::{run_command, Cli};
use fuelpoa::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging; stdout is reserved for page output
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("FuelPoa v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_command(&cli, config).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("[!!] {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
