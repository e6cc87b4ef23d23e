//! Control surface server lifecycle

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::http::{create_router, AppState};

/// Serve the control surface until `state.shutdown` is cancelled
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    info!("Control surface listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Control surface stopped");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM; returns early if it is cancelled
/// elsewhere, e.g. by a failed stream group command
pub async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        () = process_signal() => token.cancel(),
        () = token.cancelled() => {}
    }
}

async fn process_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM, only Ctrl+C stops the node");
                return ctrl_c().await;
            }
        };
        tokio::select! {
            () = ctrl_c() => {}
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

/// Completes on Ctrl+C; never completes if the handler cannot be installed
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C"),
        Err(e) => {
            error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_signal_returns_when_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let waiter = tokio::spawn(shutdown_signal(token.clone()));

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
