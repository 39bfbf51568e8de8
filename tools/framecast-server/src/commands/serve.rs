//! Run the HTTP service.

use std::sync::Arc;

use framecast_capture_engine::{CaptureEngine, CommandEngine};
use framecast_common::config::ServiceConfig;
use framecast_orchestrator::ExportOrchestrator;
use framecast_server::{router, AppState};

pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let engine = CommandEngine::from_config(&config.engine);
    if !engine.is_available() {
        tracing::warn!(
            program = engine.program(),
            "Capture engine program not found on PATH; exports will fail until it is installed"
        );
    }

    let orchestrator = Arc::new(ExportOrchestrator::new(Arc::new(engine), &config));
    let app = router(AppState::new(orchestrator, config.server.environment));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        max_concurrent_jobs = config.engine.max_concurrent_jobs,
        temp_dir = %config.engine.effective_temp_dir().display(),
        "Framecast export service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Framecast export service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested; draining in-flight exports");
}
