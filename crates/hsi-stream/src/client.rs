//! Diagnostic listener: connect to a running server and decode what it sends.

use futures_util::{SinkExt, StreamExt};
use hsi_common::{HsiError, Payload, PayloadMode};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Receive frames from `url` until the server closes the connection or
/// `shutdown` fires, passing each decoded payload to `on_payload`.
///
/// Returns the number of payloads decoded. Frames that do not decode as
/// `mode` are logged and skipped.
pub async fn listen<F>(
    url: &str,
    mode: PayloadMode,
    shutdown: CancellationToken,
    mut on_payload: F,
) -> Result<u64, HsiError>
where
    F: FnMut(Payload),
{
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| HsiError::WebSocket(format!("failed to connect to {url}: {e}")))?;
    tracing::info!(url = %url, mode = ?mode, "Connected");

    let (mut sink, mut stream) = ws.split();
    let mut received: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match Payload::decode(mode, &text) {
                    Some(payload) => {
                        received += 1;
                        on_payload(payload);
                    }
                    None => tracing::warn!(text = %text.as_str(), "Undecodable frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(received, "Connection closed");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(HsiError::WebSocket(e.to_string())),
            },
        }
    }

    Ok(received)
}
