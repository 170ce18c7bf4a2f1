//! hsi-stream: fan a periodically produced frame out to every connected
//! WebSocket client.
//!
//! A [`ConnectionRegistry`] tracks connected clients. A [`ProducerLoop`]
//! pulls payloads from a [`FrameSource`] (a fixed-rate timer or an external
//! line source) and broadcasts each one. Every client drains its own
//! bounded [`FrameQueue`], so one slow or dead client never stalls a tick;
//! clients whose delivery fails are evicted.

pub mod client;
pub mod connection;
pub mod producer;
pub mod queue;
pub mod registry;
pub mod server;
pub mod source;

pub use connection::{handle_connection, Disconnect};
pub use producer::{FrameSource, LatestFrame, ProducerExit, ProducerLoop, ProducerState, TimerSource};
pub use queue::FrameQueue;
pub use registry::{BroadcastReport, ClientHandle, ClientSink, ConnectionRegistry, Delivery};
pub use server::serve;
pub use source::{open_source, SerialSource};

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
