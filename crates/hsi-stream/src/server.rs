//! Accept loop: upgrade connections on the configured path and hand each one
//! to its own connection task.

use std::time::Duration;

use hsi_config::{DeliveryConfig, ServerConfig};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::connection::handle_connection;
use crate::registry::ConnectionRegistry;

/// Time a fresh TCP connection gets to complete the WebSocket upgrade.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept connections until `shutdown` fires, then wait for every
/// connection task to finish.
pub async fn serve(
    listener: TcpListener,
    registry: ConnectionRegistry,
    server: ServerConfig,
    delivery: DeliveryConfig,
    shutdown: CancellationToken,
) {
    let tracker = TaskTracker::new();

    match listener.local_addr() {
        Ok(addr) => tracing::info!("hsi-stream listening on ws://{}{}", addr, server.path),
        Err(e) => tracing::warn!(error = %e, "Listening on unknown address"),
    }

    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                let registry = registry.clone();
                let delivery = delivery.clone();
                let shutdown = shutdown.clone();
                let path = server.path.clone();

                tracker.spawn(async move {
                    let callback = move |req: &Request, resp: Response| check_path(&path, req, resp);
                    let handshake = tokio::select! {
                        _ = shutdown.cancelled() => return,
                        res = tokio::time::timeout(HANDSHAKE_TIMEOUT, accept_hdr_async(stream, callback)) => res,
                    };
                    match handshake {
                        Ok(Ok(ws)) => {
                            handle_connection(ws, peer, registry, delivery, shutdown).await;
                        }
                        Ok(Err(e)) => {
                            tracing::warn!(peer = %peer, error = %e, "WS handshake failed");
                        }
                        Err(_) => {
                            tracing::warn!(peer = %peer, "WS handshake timed out");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }

    tracker.close();
    tracing::info!(connections = tracker.len(), "Accept loop stopped, draining connections");
    tracker.wait().await;
}

/// Reject upgrades for any path other than the configured one.
fn check_path(path: &str, req: &Request, resp: Response) -> Result<Response, ErrorResponse> {
    if req.uri().path() == path {
        return Ok(resp);
    }

    tracing::debug!(path = %req.uri().path(), "Rejecting upgrade on unknown path");
    let mut err = ErrorResponse::new(Some(format!("no endpoint at {}", req.uri().path())));
    *err.status_mut() = StatusCode::NOT_FOUND;
    Err(err)
}
