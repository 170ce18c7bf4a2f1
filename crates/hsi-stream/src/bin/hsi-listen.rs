//! hsi-listen: connect to an hsi-stream server and log every frame.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use hsi_common::{Payload, PayloadMode};
use hsi_stream::client::listen;
use hsi_stream::init_tracing;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Structured,
    Label,
}

#[derive(Parser)]
#[command(name = "hsi-listen", about = "Print frames received from an hsi-stream server")]
struct Args {
    /// Server endpoint.
    #[arg(default_value = "ws://127.0.0.1:8000/ws")]
    url: String,

    /// Payload shape the server is sending.
    #[arg(long, value_enum, default_value = "structured")]
    mode: ModeArg,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("hsi_stream=info,hsi_listen=info");
    let args = Args::parse();

    let mode = match args.mode {
        ModeArg::Structured => PayloadMode::Structured,
        ModeArg::Label => PayloadMode::Label,
    };

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let result = listen(&args.url, mode, shutdown, |payload| match payload {
        Payload::Structured(frame) => {
            tracing::info!(vector = ?frame.vector, text = %frame.text, "Received frame");
        }
        Payload::Label(label) => {
            tracing::info!(label = %label, "Received label");
        }
    })
    .await;

    match result {
        Ok(count) => {
            tracing::info!(frames = count, "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Listener failed");
            ExitCode::FAILURE
        }
    }
}
