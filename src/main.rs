use anyhow::Result;
use batchgen::cli::Cli;
use batchgen::{generate_responses, utils, LoggingConfig, Settings};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::new()?;
    init_tracing(&settings.logging)?;

    let request = cli.into_request(|name| std::env::var(name).ok());

    match generate_responses(&request, &settings).await {
        Ok(summary) => {
            tracing::info!(
                total = summary.total,
                empty = summary.empty,
                "Generation finished"
            );
            Ok(())
        }
        Err(e) => {
            utils::print_error(&format!("Generation aborted: {:#}", e));
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr so stdout
/// only carries the status lines.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let level = logging.level_filter()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    Ok(())
}
