//! Connection registry: the set of clients that receive each broadcast.
//!
//! Membership lives in one `RwLock`-guarded map shared by the accept path
//! (admit), the per-client tasks (remove on disconnect) and the producer
//! (broadcast). The lock is only held to mutate the map or clone a
//! snapshot of it; no socket I/O happens under it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hsi_common::{ClientId, DeliveryError, Payload};
use tokio::sync::RwLock;

/// Outcome of a successful hand-off to one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The frame will be written to the client.
    Queued,
    /// The client's buffer was full and a frame was discarded by policy.
    /// The client stays registered.
    Dropped,
}

/// One client's send path, as seen by the registry.
///
/// `try_send` must not block: it is called once per client per tick from
/// the producer.
pub trait ClientSink: Send + Sync {
    fn try_send(&self, payload: &Arc<str>) -> Result<Delivery, DeliveryError>;

    /// Release the underlying connection. Must be safe to call repeatedly.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Registry entry for one connected client.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    peer: String,
    sink: Arc<dyn ClientSink>,
}

impl ClientHandle {
    pub fn new(id: ClientId, peer: impl Into<String>, sink: Arc<dyn ClientSink>) -> Self {
        Self {
            id,
            peer: peer.into(),
            sink,
        }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }

    fn try_send(&self, payload: &Arc<str>) -> Result<Delivery, DeliveryError> {
        self.sink.try_send(payload)
    }

    fn close(&self) {
        self.sink.close();
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Per-tick delivery summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients in the snapshot, each attempted exactly once.
    pub attempted: usize,
    pub delivered: usize,
    /// Clients that stayed registered but lost a frame to their overflow policy.
    pub dropped: usize,
    /// Clients removed by this pass.
    pub evicted: usize,
}

/// Thread-safe client registry. Clones share the same membership.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    clients: Arc<RwLock<HashMap<ClientId, ClientHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client that just completed its handshake. It receives frames
    /// broadcast from now on; nothing earlier is replayed.
    ///
    /// Returns the number of registered clients.
    pub async fn admit(&self, handle: ClientHandle) -> usize {
        let mut map = self.clients.write().await;
        let id = handle.id.clone();
        let peer = handle.peer.clone();

        if let Some(previous) = map.insert(id.clone(), handle) {
            previous.close();
        }
        let count = map.len();
        drop(map);

        tracing::info!(client = %id.short(), peer = %peer, clients = count, "Client admitted");
        count
    }

    /// Remove a client and close its connection. Removing an absent client
    /// is a no-op. Returns whether this call removed it.
    pub async fn remove(&self, id: &ClientId) -> bool {
        let removed = self.clients.write().await.remove(id);

        match removed {
            Some(handle) => {
                handle.close();
                tracing::info!(
                    client = %id.short(),
                    peer = %handle.peer,
                    "Client removed"
                );
                true
            }
            None => false,
        }
    }

    /// Deliver one payload to every registered client.
    ///
    /// Encoding failures skip the tick. Per-client failures never propagate;
    /// failed clients are evicted after the whole pass.
    pub async fn broadcast(&self, payload: &Payload) -> BroadcastReport {
        match payload.encode() {
            Ok(text) => self.broadcast_text(Arc::from(text)).await,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode payload, skipping tick");
                BroadcastReport::default()
            }
        }
    }

    /// Deliver pre-encoded text to every registered client.
    pub async fn broadcast_text(&self, text: Arc<str>) -> BroadcastReport {
        let snapshot = self.snapshot().await;
        let mut report = BroadcastReport {
            attempted: snapshot.len(),
            ..BroadcastReport::default()
        };
        let mut failed: Vec<ClientId> = Vec::new();

        for handle in &snapshot {
            match handle.try_send(&text) {
                Ok(Delivery::Queued) => report.delivered += 1,
                Ok(Delivery::Dropped) => {
                    report.dropped += 1;
                    tracing::debug!(client = %handle.id.short(), "Client lagging, frame dropped");
                }
                Err(e) => {
                    tracing::warn!(
                        client = %handle.id.short(),
                        peer = %handle.peer,
                        error = %e,
                        "Delivery failed, evicting client"
                    );
                    failed.push(handle.id.clone());
                }
            }
        }

        for id in failed {
            // The client's own task may have removed it already.
            if self.remove(&id).await {
                report.evicted += 1;
            }
        }

        report
    }

    /// Close and remove every client.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<ClientHandle> = {
            let mut map = self.clients.write().await;
            map.drain().map(|(_, handle)| handle).collect()
        };

        for handle in &drained {
            handle.close();
        }
        if !drained.is_empty() {
            tracing::info!(clients = drained.len(), "Closed all clients");
        }
        drained.len()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    pub async fn contains(&self, id: &ClientId) -> bool {
        self.clients.read().await.contains_key(id)
    }

    pub async fn client_ids(&self) -> Vec<ClientId> {
        self.clients.read().await.keys().cloned().collect()
    }

    async fn snapshot(&self) -> Vec<ClientHandle> {
        self.clients.read().await.values().cloned().collect()
    }
}
