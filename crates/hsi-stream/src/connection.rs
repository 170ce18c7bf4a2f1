//! Per-connection handler: admit, drain the client's queue onto the socket,
//! discard inbound keep-alives, then clean up.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use hsi_common::ClientId;
use hsi_config::DeliveryConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use crate::queue::FrameQueue;
use crate::registry::{ClientHandle, ConnectionRegistry};

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Close frame or EOF from the client.
    ClosedByPeer,
    ReadError,
    WriteError,
    WriteTimeout,
    /// The registry removed the client (delivery failure or shutdown drain).
    Evicted,
    Shutdown,
}

/// Serve one upgraded WebSocket until it disconnects or `shutdown` fires.
pub async fn handle_connection<S>(
    ws: WebSocketStream<S>,
    peer: SocketAddr,
    registry: ConnectionRegistry,
    delivery: DeliveryConfig,
    shutdown: CancellationToken,
) -> Disconnect
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();

    let id = ClientId::new();
    let queue = Arc::new(FrameQueue::new(delivery.queue_capacity, delivery.overflow));
    registry
        .admit(ClientHandle::new(id.clone(), peer.to_string(), queue.clone()))
        .await;

    let send_timeout = delivery.send_timeout();

    let reason = loop {
        // Shutdown first: once it fires, queued frames stay unsent.
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break Disconnect::Shutdown,

            // Queued frames → this client's WebSocket
            next = queue.pop() => {
                let Some(text) = next else {
                    break Disconnect::Evicted;
                };
                match tokio::time::timeout(send_timeout, sink.send(Message::Text(text.to_string().into()))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(client = %id.short(), error = %e, "WS write error");
                        break Disconnect::WriteError;
                    }
                    Err(_) => {
                        tracing::warn!(
                            client = %id.short(),
                            timeout_ms = send_timeout.as_millis() as u64,
                            "WS write timed out"
                        );
                        break Disconnect::WriteTimeout;
                    }
                }
            }

            // Inbound frames only keep the connection alive.
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break Disconnect::ClosedByPeer,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(client = %id.short(), error = %e, "WS read error");
                        break Disconnect::ReadError;
                    }
                }
            }
        }
    };

    registry.remove(&id).await;

    if matches!(reason, Disconnect::Shutdown | Disconnect::Evicted) {
        let _ = tokio::time::timeout(send_timeout, sink.send(Message::Close(None))).await;
    }

    let clients = registry.len().await;
    tracing::info!(
        client = %id.short(),
        peer = %peer,
        reason = ?reason,
        clients,
        "Client disconnected"
    );
    reason
}
