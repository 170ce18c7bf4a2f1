//! Producer loop: one background task that turns a [`FrameSource`] into
//! registry broadcasts.
//!
//! ```text
//!   Starting ──open ok──► Running ──cancel──► Stopped
//!      │                     │
//!      └──open err──┐        └──source err──► Failed
//!                   ▼
//!                 Failed
//! ```
//!
//! Only `Running` broadcasts. A failed source ends the loop but leaves the
//! registry and its clients untouched; reconnecting means starting a new
//! loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hsi_common::{Frame, Payload, PayloadMode, SourceError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::registry::ConnectionRegistry;

/// Something that yields the next payload, waiting until one is ready.
#[async_trait]
pub trait FrameSource: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn next_payload(&mut self) -> Result<Payload, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Starting,
    Running,
    Stopped,
    Failed,
}

/// How a producer loop ended.
#[derive(Debug)]
pub enum ProducerExit {
    /// Cancelled by shutdown.
    Stopped { ticks: u64 },
    /// The source could not be opened or failed mid-stream.
    Failed { ticks: u64, error: SourceError },
}

impl ProducerExit {
    pub fn ticks(&self) -> u64 {
        match self {
            ProducerExit::Stopped { ticks } | ProducerExit::Failed { ticks, .. } => *ticks,
        }
    }

    pub fn state(&self) -> ProducerState {
        match self {
            ProducerExit::Stopped { .. } => ProducerState::Stopped,
            ProducerExit::Failed { .. } => ProducerState::Failed,
        }
    }
}

pub struct ProducerLoop {
    registry: ConnectionRegistry,
    state: watch::Sender<ProducerState>,
    mode: Option<PayloadMode>,
}

impl ProducerLoop {
    pub fn new(registry: ConnectionRegistry) -> Self {
        let (state, _) = watch::channel(ProducerState::Starting);
        Self {
            registry,
            state,
            mode: None,
        }
    }

    /// Pin the payload shape for this run. Without it the first payload
    /// decides. Payloads of the other shape are skipped.
    pub fn with_mode(mut self, mode: PayloadMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<ProducerState> {
        self.state.subscribe()
    }

    /// Open the source, then broadcast every payload it yields until
    /// `shutdown` fires or the source fails.
    pub async fn run<S, F>(self, open: F, shutdown: CancellationToken) -> ProducerExit
    where
        S: FrameSource,
        F: Future<Output = Result<S, SourceError>>,
    {
        let opened = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            opened = open => Some(opened),
        };

        let exit = match opened {
            None => ProducerExit::Stopped { ticks: 0 },
            Some(Err(error)) => {
                tracing::error!(error = %error, "Producer source failed to open");
                ProducerExit::Failed { ticks: 0, error }
            }
            Some(Ok(source)) => self.drive(source, &shutdown).await,
        };

        self.state.send_replace(exit.state());
        tracing::info!(state = ?exit.state(), ticks = exit.ticks(), "Producer loop ended");
        exit
    }

    async fn drive<S: FrameSource>(&self, mut source: S, shutdown: &CancellationToken) -> ProducerExit {
        self.state.send_replace(ProducerState::Running);
        tracing::info!(source = source.name(), "Producer loop running");

        let mut ticks: u64 = 0;
        let mut shape = self.mode;
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return ProducerExit::Stopped { ticks },
                next = source.next_payload() => next,
            };

            match next {
                Ok(payload) => {
                    if shutdown.is_cancelled() {
                        return ProducerExit::Stopped { ticks };
                    }
                    let mode = payload.mode();
                    match shape {
                        Some(expected) if expected != mode => {
                            tracing::warn!(
                                source = source.name(),
                                expected = ?expected,
                                got = ?mode,
                                "Payload shape changed mid-run, skipping"
                            );
                            continue;
                        }
                        Some(_) => {}
                        None => shape = Some(mode),
                    }
                    let report = self.registry.broadcast(&payload).await;
                    ticks += 1;
                    tracing::trace!(
                        tick = ticks,
                        attempted = report.attempted,
                        delivered = report.delivered,
                        dropped = report.dropped,
                        evicted = report.evicted,
                        "Broadcast"
                    );
                }
                Err(error) => {
                    tracing::error!(source = source.name(), error = %error, "Producer source failed");
                    return ProducerExit::Failed { ticks, error };
                }
            }
        }
    }

    /// Run on a new tokio task.
    pub fn spawn<S, F>(self, open: F, shutdown: CancellationToken) -> JoinHandle<ProducerExit>
    where
        S: FrameSource + 'static,
        F: Future<Output = Result<S, SourceError>> + Send + 'static,
    {
        tokio::spawn(self.run(open, shutdown))
    }
}

/// The most recent frame for timer mode. Other code may publish new
/// vectors; each tick sends whatever is current.
#[derive(Clone)]
pub struct LatestFrame {
    tx: Arc<watch::Sender<Frame>>,
}

impl LatestFrame {
    pub fn new(initial: Frame) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, frame: Frame) {
        self.tx.send_replace(frame);
    }

    pub fn current(&self) -> Frame {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Frame> {
        self.tx.subscribe()
    }
}

/// Fixed-cadence structured frames.
pub struct TimerSource {
    interval: Interval,
    latest: watch::Receiver<Frame>,
}

impl TimerSource {
    /// The first payload is ready immediately, then one per `period`.
    pub fn new(period: Duration, latest: &LatestFrame) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            latest: latest.subscribe(),
        }
    }
}

#[async_trait]
impl FrameSource for TimerSource {
    fn name(&self) -> &str {
        "timer"
    }

    async fn next_payload(&mut self) -> Result<Payload, SourceError> {
        self.interval.tick().await;
        let frame = self.latest.borrow_and_update().clone();
        Ok(Payload::Structured(frame))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::ready;

    use hsi_common::Label;

    use super::*;
    use crate::registry::tests::{handle, RecordingSink};
    use crate::registry::ClientSink;

    /// Replays a script, then fails with `Closed`.
    struct ScriptedSource {
        script: VecDeque<Payload>,
    }

    #[async_trait]
    impl FrameSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn next_payload(&mut self) -> Result<Payload, SourceError> {
            self.script.pop_front().ok_or(SourceError::Closed)
        }
    }

    /// Never yields.
    struct PendingSource;

    #[async_trait]
    impl FrameSource for PendingSource {
        fn name(&self) -> &str {
            "pending"
        }

        async fn next_payload(&mut self) -> Result<Payload, SourceError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_cadence_is_ten_hertz() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::healthy();
        registry.admit(handle(sink.clone())).await;

        let latest = LatestFrame::new(Frame::default());
        let shutdown = CancellationToken::new();
        let task = ProducerLoop::new(registry.clone()).spawn(
            ready(Ok(TimerSource::new(Duration::from_millis(100), &latest))),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.cancel();
        let exit = task.await.unwrap();

        let count = sink.received().len();
        assert!((9..=11).contains(&count), "got {count} broadcasts");
        assert_eq!(exit.ticks() as usize, count);
        assert!(matches!(exit, ProducerExit::Stopped { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_sends_latest_frame() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::healthy();
        registry.admit(handle(sink.clone())).await;

        let latest = LatestFrame::new(Frame::default());
        let shutdown = CancellationToken::new();
        let task = ProducerLoop::new(registry).spawn(
            ready(Ok(TimerSource::new(Duration::from_millis(100), &latest))),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        latest.publish(Frame::new(vec![0.5], "updated"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        task.await.unwrap();

        let received = sink.received();
        assert_eq!(received[0], Frame::default().encode().unwrap());
        assert_eq!(
            received.last().unwrap(),
            &Frame::new(vec![0.5], "updated").encode().unwrap()
        );
        assert_eq!(latest.current().text, "updated");
    }

    #[tokio::test]
    async fn source_failure_ends_loop_but_keeps_clients() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::healthy();
        registry.admit(handle(sink.clone())).await;

        let source = ScriptedSource {
            script: VecDeque::from(vec![
                Payload::Label(Label::Zero),
                Payload::Label(Label::One),
            ]),
        };
        let producer = ProducerLoop::new(registry.clone());
        let state = producer.state();
        let exit = producer.run(ready(Ok(source)), CancellationToken::new()).await;

        assert!(matches!(
            exit,
            ProducerExit::Failed {
                ticks: 2,
                error: SourceError::Closed
            }
        ));
        assert_eq!(*state.borrow(), ProducerState::Failed);
        assert_eq!(sink.received(), vec!["0", "1"]);
        assert_eq!(registry.len().await, 1);
        assert!(!sink.is_closed());
    }

    #[tokio::test]
    async fn open_failure_is_failed_state() {
        let registry = ConnectionRegistry::new();
        let producer = ProducerLoop::new(registry);
        let state = producer.state();
        assert_eq!(*state.borrow(), ProducerState::Starting);

        let open = ready(Err::<PendingSource, _>(SourceError::Open {
            address: "/dev/missing".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }));
        let exit = producer.run(open, CancellationToken::new()).await;

        assert!(matches!(exit, ProducerExit::Failed { ticks: 0, .. }));
        assert_eq!(*state.borrow(), ProducerState::Failed);
    }

    #[tokio::test]
    async fn cancellation_stops_blocked_source() {
        let producer = ProducerLoop::new(ConnectionRegistry::new());
        let mut state = producer.state();
        let shutdown = CancellationToken::new();
        let task = producer.spawn(ready(Ok(PendingSource)), shutdown.clone());

        state
            .wait_for(|s| *s == ProducerState::Running)
            .await
            .unwrap();
        shutdown.cancel();

        let exit = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(exit, ProducerExit::Stopped { ticks: 0 }));
        assert_eq!(*state.borrow(), ProducerState::Stopped);
    }

    #[tokio::test]
    async fn pinned_mode_skips_other_shapes() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::healthy();
        registry.admit(handle(sink.clone())).await;

        let source = ScriptedSource {
            script: VecDeque::from(vec![
                Payload::Structured(Frame::default()),
                Payload::Label(Label::One),
                Payload::Label(Label::Zero),
            ]),
        };
        let exit = ProducerLoop::new(registry)
            .with_mode(PayloadMode::Label)
            .run(ready(Ok(source)), CancellationToken::new())
            .await;

        assert_eq!(exit.ticks(), 2);
        assert_eq!(sink.received(), vec!["1", "0"]);
    }

    #[tokio::test]
    async fn first_payload_fixes_the_shape() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::healthy();
        registry.admit(handle(sink.clone())).await;

        let source = ScriptedSource {
            script: VecDeque::from(vec![
                Payload::Label(Label::Zero),
                Payload::Structured(Frame::default()),
                Payload::Label(Label::One),
            ]),
        };
        let exit = ProducerLoop::new(registry)
            .run(ready(Ok(source)), CancellationToken::new())
            .await;

        assert_eq!(exit.ticks(), 2);
        assert_eq!(sink.received(), vec!["0", "1"]);
    }

    #[tokio::test]
    async fn nothing_sent_after_shutdown() {
        let registry = ConnectionRegistry::new();
        let sink = RecordingSink::healthy();
        registry.admit(handle(sink.clone())).await;

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let source = ScriptedSource {
            script: VecDeque::from(vec![Payload::Label(Label::One)]),
        };
        let exit = ProducerLoop::new(registry)
            .run(ready(Ok(source)), shutdown)
            .await;

        assert!(matches!(exit, ProducerExit::Stopped { ticks: 0 }));
        assert!(sink.received().is_empty());
    }
}
