use clap::Parser;
use ipsentry::cli::{commands, Cli};
use ipsentry::Error;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting ipsentry v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = commands::run(cli).await {
        match e {
            Error::AddressDrift { .. } => error!("{}, restarting", e),
            _ => error!("Error: {}", e),
        }
        process::exit(1);
    }
}
