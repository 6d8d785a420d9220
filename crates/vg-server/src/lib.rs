//! vg-server: the HTTP surface of the gateway.
//!
//! This crate wires the core types and the imaging pipeline into a running
//! server. It provides:
//!
//! - A credentialed origin client with per-intent range and timeout handling
//! - The range/header translator and the cancellable body relay
//! - Axum routes for streaming, downloads, previews, images and assets
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod relay;
pub mod router;
pub mod routes;
pub mod upstream;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use vg_core::config::Config;

use crate::context::AppContext;

/// Start the gateway.
///
/// Builds the [`AppContext`], binds the configured address, and serves until
/// a shutdown signal is received.
pub async fn start(config: Config, metrics: Option<PrometheusHandle>) -> vg_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let ctx = AppContext::new(config, metrics)?;

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| vg_core::Error::Internal(format!("Failed to bind to {host}:{port}: {e}")))?;

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Gateway listening on {addr}"),
        Err(_) => tracing::info!("Gateway listening on {host}:{port}"),
    }

    serve(listener, ctx, CancellationToken::new()).await
}

/// Serve the router on an already-bound listener until `cancel` fires or a
/// shutdown signal arrives.
pub async fn serve(listener: TcpListener, ctx: AppContext, cancel: CancellationToken) -> vg_core::Result<()> {
    let app = router::build_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM) or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
