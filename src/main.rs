//! Bargain CLI binary

use anyhow::Context;
use bargain::cli::{summarize, BargainApp, Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli
        .command
        .resolve_config()
        .context("failed to load configuration")?;
    let app = BargainApp::new(config);

    match &cli.command {
        Commands::Seller { .. } => {
            tracing::info!("Starting seller on {}", app.config().network.address());
            let report = app.run_seller().await.context("seller session failed")?;
            println!("{}", summarize(&report));
        }

        Commands::Buyer { connect, .. } => {
            let report = app
                .run_buyer(connect.as_deref())
                .await
                .context("buyer session failed")?;
            println!("{}", summarize(&report));
        }

        Commands::Demo { .. } => {
            let (seller, buyer) = app.run_demo().await.context("demo failed")?;
            println!("{}\n", summarize(&seller));
            println!("{}", summarize(&buyer));
        }
    }

    Ok(())
}
