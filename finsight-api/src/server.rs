use std::sync::Arc;

use anyhow::Context;
use finsight_core::FinsightContext;

use crate::router::create_router;

/// Targets match by prefix, so `finsight` covers the core and api crates too
const DEFAULT_LOG_FILTER: &str = "finsight=info,tower_http=info";

/// Initialize tracing from `RUST_LOG`, falling back to info-level logs
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init();
}

/// Run the API server until Ctrl-C
pub async fn run_server(ctx: Arc<FinsightContext>, host: &str, port: u16) -> anyhow::Result<()> {
    init_tracing();

    let provider = ctx.provider_name().to_string();
    let model = ctx.config.llm.model.clone();
    let app = create_router(ctx);

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    let addr = listener.local_addr()?;
    tracing::info!(%provider, %model, "Starting server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
