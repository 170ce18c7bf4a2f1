//! hsi-stream: WebSocket broadcaster for head-mounted display clients.
//!
//! Binds the configured endpoint, runs one producer loop (timer or serial
//! source) and pushes every frame it yields to all connected clients until
//! Ctrl-C.

use std::future::{ready, Future};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use hsi_common::{ConfigError, HsiError};
use hsi_config::{HsiConfig, ProducerMode};
use hsi_stream::{
    init_tracing, open_source, serve, ConnectionRegistry, LatestFrame, ProducerLoop, TimerSource,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// JSON vector + text frames on a fixed timer.
    Timer,
    /// Bare "0"/"1" labels from the external source.
    Serial,
}

impl From<ModeArg> for ProducerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Timer => ProducerMode::Timer,
            ModeArg::Serial => ProducerMode::Serial,
        }
    }
}

#[derive(Parser)]
#[command(name = "hsi-stream", about = "Broadcast frames to WebSocket clients at a fixed cadence")]
struct Args {
    /// Config file. Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Producer mode (overrides config).
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Source address for serial mode (overrides config).
    #[arg(long)]
    source: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match hsi_config::load_config(args.config.as_deref())
        .and_then(|config| apply_overrides(config, &args))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hsi-stream: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging.filter);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "hsi-stream exited with error");
            ExitCode::FAILURE
        }
    }
}

/// Apply command-line overrides, then validate again: an override can
/// enable checks the file alone skipped (e.g. `--mode serial`).
fn apply_overrides(mut config: HsiConfig, args: &Args) -> Result<HsiConfig, ConfigError> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(mode) = args.mode {
        config.producer.mode = mode.into();
    }
    if let Some(source) = &args.source {
        config.source.address = source.clone();
    }

    hsi_config::validation::validate(&config)?;
    Ok(config)
}

async fn run(config: HsiConfig) -> Result<(), HsiError> {
    let listener = TcpListener::bind(config.server.bind_addr()).await?;
    run_until(config, listener, tokio::signal::ctrl_c()).await
}

/// Serve until `stop` resolves. Tasks are cancelled and joined whether or
/// not `stop` succeeded; its error is returned afterwards.
async fn run_until<F>(config: HsiConfig, listener: TcpListener, stop: F) -> Result<(), HsiError>
where
    F: Future<Output = std::io::Result<()>>,
{
    let registry = ConnectionRegistry::new();
    let shutdown = CancellationToken::new();

    let server_task = tokio::spawn(serve(
        listener,
        registry.clone(),
        config.server.clone(),
        config.delivery.clone(),
        shutdown.clone(),
    ));

    // The producer's fate is independent of the server: a failed source
    // stops new frames but keeps clients connected.
    let producer =
        ProducerLoop::new(registry.clone()).with_mode(config.producer.mode.payload_mode());
    let producer_task = match config.producer.mode {
        ProducerMode::Timer => {
            let latest = LatestFrame::new(config.producer.initial_frame());
            let source = TimerSource::new(config.producer.interval(), &latest);
            tracing::info!(
                interval_ms = config.producer.interval_ms,
                "Starting timer producer"
            );
            producer.spawn(ready(Ok(source)), shutdown.clone())
        }
        ProducerMode::Serial => {
            let source_config = config.source.clone();
            tracing::info!(source = %source_config.address, "Starting serial producer");
            producer.spawn(
                async move { open_source(&source_config).await },
                shutdown.clone(),
            )
        }
    };

    let signal = stop.await;
    match &signal {
        Ok(()) => tracing::info!("Shutting down"),
        Err(e) => tracing::error!(error = %e, "Signal handler failed, shutting down"),
    }
    shutdown.cancel();

    match producer_task.await {
        Ok(exit) => tracing::debug!(state = ?exit.state(), ticks = exit.ticks(), "Producer joined"),
        Err(e) => tracing::warn!(error = %e, "Producer task panicked"),
    }
    if let Err(e) = server_task.await {
        tracing::warn!(error = %e, "Server task panicked");
    }
    registry.close_all().await;

    tracing::info!("Shutdown complete");
    signal?;
    Ok(())
}
