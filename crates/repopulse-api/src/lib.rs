pub mod handlers;
pub mod routes;
pub mod state;

// Re-exports
pub use routes::create_router;
pub use state::ApiState;

use repopulse_engine::Services;

/// Serve the API until the process is stopped
pub async fn serve(services: &Services, port: u16) -> anyhow::Result<()> {
    let app = create_router(ApiState::new(services));

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("RepoPulse API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
