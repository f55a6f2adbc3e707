use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repopulse_core::Settings;
use repopulse_engine::{Scheduler, Services};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repopulse=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let settings = Settings::load()?;
    let port = settings.api_port;

    // The scheduler lives as long as this process
    let scheduler = Scheduler::new(settings.time_window()?);
    let services = Services::from_settings(settings, scheduler.clone())?;
    services.dispatcher.arm_all().await?;

    let served = repopulse_api::serve(&services, port).await;

    scheduler.shutdown().await;
    served
}
