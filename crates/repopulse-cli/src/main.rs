use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::Cli;
use repopulse_core::Settings;
use repopulse_engine::{Scheduler, Services};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repopulse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load_from(&cli.config)?;

    // One scheduler per process, owned here
    let scheduler = Scheduler::new(settings.time_window()?);
    let services = Services::from_settings(settings, scheduler)?;

    commands::execute(cli.command, services).await
}
