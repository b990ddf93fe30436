// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorder controller.
//!
//! Binds the recorder lifecycle to transport events so that every
//! start→stop playback cycle produces exactly one artifact:
//! - start event: begin recording (pauses are not forwarded, so the take
//!   runs straight through pause/resume)
//! - stop event: wait for the settle strategy, finish the encoder and
//!   resolve the handshake opened by the matching `initialize()`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::artifact::RecordingArtifact;
use super::encoder::{Encoder, EncoderFactory};
use super::gate::{Handshake, ReadinessGate};
use super::settle::SettleStrategy;
use crate::error::CaptureError;
use crate::transport::{Handler, TransportController, TransportEvent, TransportEventKind};

/// Recorder session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Initialized, waiting for the transport to start
    Idle,
    /// Capturing the mix
    Recording,
    /// Stopped; waiting for the encoder to flush
    Settling,
    /// Output produced and handed to the gate
    Settled,
}

impl Default for RecorderState {
    fn default() -> Self {
        RecorderState::Idle
    }
}

/// One recording attempt. Owns its encoder until the settle task takes it.
struct RecorderSession {
    id: u64,
    state: watch::Sender<RecorderState>,
    encoder: Option<Box<dyn Encoder>>,
    handshake: Arc<Handshake>,
}

impl RecorderSession {
    fn state(&self) -> RecorderState {
        *self.state.borrow()
    }

    fn set_state(&self, state: RecorderState) {
        self.state.send_replace(state);
    }
}

type SharedSession = Arc<Mutex<RecorderSession>>;

/// What the stop handler needs to run a settle task
#[derive(Clone)]
struct SettleContext {
    runtime: Handle,
    gate: Arc<ReadinessGate>,
    settle: Arc<dyn SettleStrategy>,
    filename: Arc<str>,
}

struct RecorderInner {
    transport: TransportController,
    gate: Arc<ReadinessGate>,
    factory: Arc<dyn EncoderFactory>,
    settle: Arc<dyn SettleStrategy>,
    filename: Arc<str>,
    session: Mutex<Option<SharedSession>>,
    next_id: AtomicU64,
}

/// Shared handle to the recorder
#[derive(Clone)]
pub struct RecorderController {
    inner: Arc<RecorderInner>,
}

impl RecorderController {
    /// Create a recorder bound to a transport and gate.
    ///
    /// Nothing is recorded until [`initialize`](Self::initialize) is called.
    pub fn new(
        transport: TransportController,
        gate: Arc<ReadinessGate>,
        factory: Arc<dyn EncoderFactory>,
        settle: Arc<dyn SettleStrategy>,
        filename: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            inner: Arc::new(RecorderInner {
                transport,
                gate,
                factory,
                settle,
                filename: filename.into(),
                session: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Start a new session: fresh encoder, fresh handshake, and transport
    /// start/stop handlers rebuilt from scratch.
    ///
    /// Fails while recording or while a stop-triggered settle is in flight.
    /// Must run inside a tokio runtime; the settle task is spawned on it.
    pub fn initialize(&self) -> Result<u64, CaptureError> {
        let mut slot = self.inner.session.lock();

        if let Some(current) = slot.as_ref() {
            match current.lock().state() {
                RecorderState::Recording => return Err(CaptureError::Recording),
                RecorderState::Settling => return Err(CaptureError::SettleInFlight),
                RecorderState::Idle | RecorderState::Settled => {}
            }
        }

        let runtime = Handle::try_current().map_err(|_| CaptureError::NoRuntime)?;

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let (state, _) = watch::channel(RecorderState::Idle);
        let session: SharedSession = Arc::new(Mutex::new(RecorderSession {
            id,
            state,
            encoder: Some(self.inner.factory.create()),
            handshake: self.inner.gate.open(),
        }));

        let ctx = SettleContext {
            runtime,
            gate: Arc::clone(&self.inner.gate),
            settle: Arc::clone(&self.inner.settle),
            filename: Arc::clone(&self.inner.filename),
        };

        let on_start: Handler<TransportEvent> = {
            let session = Arc::clone(&session);
            Arc::new(move |event: &TransportEvent| handle_start(&session, event))
        };
        let on_stop: Handler<TransportEvent> = {
            let session = Arc::clone(&session);
            Arc::new(move |_: &TransportEvent| handle_stop(&session, &ctx))
        };

        // Pause is not forwarded
        self.inner.transport.rebind([
            (TransportEventKind::Start, on_start),
            (TransportEventKind::Stop, on_stop),
        ]);

        *slot = Some(session);
        tracing::info!(session = id, "recorder initialized");
        Ok(id)
    }

    /// Unbind from the transport and drop the current session.
    ///
    /// An in-flight settle keeps running and resolves its own handshake.
    pub fn teardown(&self) {
        let mut slot = self.inner.session.lock();
        if let Some(session) = slot.take() {
            self.inner.transport.unsubscribe(TransportEventKind::Start);
            self.inner.transport.unsubscribe(TransportEventKind::Stop);
            tracing::info!(session = session.lock().id, "recorder torn down");
        }
    }

    /// Check whether a session exists
    pub fn is_initialized(&self) -> bool {
        self.inner.session.lock().is_some()
    }

    /// Id of the current session
    pub fn session_id(&self) -> Option<u64> {
        self.current().map(|session| session.lock().id)
    }

    /// State of the current session; `Idle` when none exists
    pub fn state(&self) -> RecorderState {
        self.current()
            .map(|session| session.lock().state())
            .unwrap_or_default()
    }

    /// Check if recording
    pub fn is_recording(&self) -> bool {
        self.state() == RecorderState::Recording
    }

    /// Handshake opened by the current session
    pub fn handshake(&self) -> Option<Arc<Handshake>> {
        self.current()
            .map(|session| Arc::clone(&session.lock().handshake))
    }

    /// Wait until the current session is no longer settling
    pub async fn settled(&self) {
        let Some(session) = self.current() else {
            return;
        };
        let mut rx = session.lock().state.subscribe();
        let _ = rx.wait_for(|state| *state != RecorderState::Settling).await;
    }

    /// Resolve the handshake with nothing if the session never started.
    ///
    /// Without this, a session that was initialized but never played would
    /// leave its handshake pending forever.
    pub fn release_idle(&self) -> bool {
        let Some(session) = self.current() else {
            return false;
        };
        let mut session = session.lock();
        if session.state() != RecorderState::Idle {
            return false;
        }
        settle_empty(&mut session, &self.inner.gate);
        true
    }

    fn current(&self) -> Option<SharedSession> {
        self.inner.session.lock().clone()
    }
}

impl std::fmt::Debug for RecorderController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderController")
            .field("session", &self.session_id())
            .field("state", &self.state())
            .field("filename", &self.inner.filename)
            .finish()
    }
}

fn handle_start(session: &SharedSession, event: &TransportEvent) {
    let mut session = session.lock();
    match session.state() {
        RecorderState::Recording => {
            tracing::debug!(
                session = session.id,
                resume = event.is_resume(),
                "start event, recorder already recording"
            );
        }
        RecorderState::Idle => {
            let started = match session.encoder.as_mut() {
                Some(encoder) => encoder.start(),
                None => return,
            };
            match started {
                Ok(()) => {
                    session.set_state(RecorderState::Recording);
                    tracing::info!(session = session.id, "recording started");
                }
                Err(e) => {
                    tracing::warn!(session = session.id, error = %e, "encoder failed to start");
                }
            }
        }
        RecorderState::Settling | RecorderState::Settled => {
            tracing::warn!(
                session = session.id,
                "start event after stop; recorder must be re-initialized"
            );
        }
    }
}

fn handle_stop(session: &SharedSession, ctx: &SettleContext) {
    let mut guard = session.lock();
    match guard.state() {
        RecorderState::Recording => {
            guard.set_state(RecorderState::Settling);
            let encoder = guard.encoder.take();
            let handshake = Arc::clone(&guard.handshake);
            let id = guard.id;
            drop(guard);

            tracing::info!(session = id, "stop event, waiting for recorder to settle");
            ctx.runtime.spawn(run_settle(
                Arc::clone(session),
                encoder,
                handshake,
                ctx.clone(),
            ));
        }
        RecorderState::Idle => {
            tracing::info!(session = guard.id, "stop event before recording started");
            settle_empty(&mut guard, &ctx.gate);
        }
        RecorderState::Settling | RecorderState::Settled => {
            tracing::debug!(session = guard.id, "stop event, recorder already stopped");
        }
    }
}

fn settle_empty(session: &mut RecorderSession, gate: &ReadinessGate) {
    session.encoder = None;
    session.set_state(RecorderState::Settled);
    gate.resolve_handshake(&session.handshake, None);
}

async fn run_settle(
    session: SharedSession,
    encoder: Option<Box<dyn Encoder>>,
    handshake: Arc<Handshake>,
    ctx: SettleContext,
) {
    ctx.settle.settle().await;

    let result = match encoder {
        Some(mut encoder) => {
            let mime_type = encoder.mime_type();
            match encoder.finish().await {
                Ok(bytes) if !bytes.is_empty() => Some(
                    RecordingArtifact::new(bytes, Arc::clone(&ctx.filename))
                        .with_mime_type(mime_type),
                ),
                Ok(_) => {
                    tracing::warn!(handshake = handshake.id(), "encoder flushed an empty buffer");
                    None
                }
                Err(e) => {
                    tracing::warn!(handshake = handshake.id(), error = %e, "encoder flush failed");
                    None
                }
            }
        }
        None => None,
    };

    let has_artifact = result.is_some();

    // Resolve before publishing Settled: `settled()` waiters may re-initialize
    // and open a new handshake as soon as they observe it.
    let id = {
        let session = session.lock();
        ctx.gate.resolve_handshake(&handshake, result);
        session.set_state(RecorderState::Settled);
        session.id
    };
    tracing::info!(session = id, has_artifact, "recorder settled");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncoderError;
    use crate::recording::encoder::EncoderState;
    use crate::recording::gate::HandshakeState;
    use crate::recording::settle::FixedDelay;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Encoder that returns a fixed payload
    struct MockEncoder {
        state: EncoderState,
        payload: Result<Vec<u8>, EncoderError>,
    }

    #[async_trait]
    impl Encoder for MockEncoder {
        fn state(&self) -> EncoderState {
            self.state
        }

        fn start(&mut self) -> Result<(), EncoderError> {
            self.state = EncoderState::Recording;
            Ok(())
        }

        async fn finish(&mut self) -> Result<Vec<u8>, EncoderError> {
            self.state = EncoderState::Finished;
            self.payload.clone()
        }
    }

    struct MockFactory {
        created: AtomicUsize,
        payload: Result<Vec<u8>, EncoderError>,
    }

    impl MockFactory {
        fn new(payload: Result<Vec<u8>, EncoderError>) -> Arc<Self> {
            Arc::new(Self {
                created: AtomicUsize::new(0),
                payload,
            })
        }
    }

    impl EncoderFactory for MockFactory {
        fn create(&self) -> Box<dyn Encoder> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(MockEncoder {
                state: EncoderState::Idle,
                payload: self.payload.clone(),
            })
        }
    }

    fn recorder(
        factory: Arc<MockFactory>,
    ) -> (TransportController, Arc<ReadinessGate>, RecorderController) {
        let transport = TransportController::new();
        let gate = Arc::new(ReadinessGate::new());
        let recorder = RecorderController::new(
            transport.clone(),
            Arc::clone(&gate),
            factory,
            Arc::new(FixedDelay::from_millis(2000)),
            "recording.webm",
        );
        (transport, gate, recorder)
    }

    #[test]
    fn test_initialize_requires_runtime() {
        let (_, _, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        assert_eq!(recorder.initialize(), Err(CaptureError::NoRuntime));
        assert!(!recorder.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_binds_start_and_stop_only() {
        let (transport, gate, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        transport.subscribe(TransportEventKind::Pause, |_| {});

        recorder.initialize().unwrap();

        assert!(transport.is_subscribed(TransportEventKind::Start));
        assert!(transport.is_subscribed(TransportEventKind::Stop));
        assert!(!transport.is_subscribed(TransportEventKind::Pause));
        assert_eq!(gate.state(), HandshakeState::Pending);
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_produces_artifact_after_settle() {
        let (transport, gate, recorder) = recorder(MockFactory::new(Ok(vec![1, 2, 3])));
        recorder.initialize().unwrap();

        transport.start();
        assert!(recorder.is_recording());

        let stopped_at = Instant::now();
        transport.stop();
        assert_eq!(recorder.state(), RecorderState::Settling);
        assert_eq!(gate.state(), HandshakeState::Pending);

        let artifact = gate.wait().await.unwrap();
        assert!(stopped_at.elapsed() >= Duration::from_millis(2000));
        assert_eq!(artifact.bytes(), &[1, 2, 3]);
        assert_eq!(artifact.suggested_filename(), "recording.webm");
        assert_eq!(recorder.state(), RecorderState::Settled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recording_continues_through_pause() {
        let (transport, _, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        recorder.initialize().unwrap();

        transport.start();
        transport.pause();
        assert!(recorder.is_recording());
        transport.start();
        assert!(recorder.is_recording());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_failure_resolves_empty() {
        let (transport, gate, recorder) = recorder(MockFactory::new(Err(EncoderError::NoData)));
        recorder.initialize().unwrap();

        transport.start();
        transport.stop();

        assert_eq!(gate.wait().await, None);
        assert_eq!(gate.state(), HandshakeState::Resolved(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_flush_resolves_empty() {
        let (transport, gate, recorder) = recorder(MockFactory::new(Ok(Vec::new())));
        recorder.initialize().unwrap();

        transport.start();
        transport.stop();

        assert_eq!(gate.wait().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_guards() {
        let (transport, _, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        recorder.initialize().unwrap();

        transport.start();
        assert_eq!(recorder.initialize(), Err(CaptureError::Recording));

        transport.stop();
        assert_eq!(recorder.initialize(), Err(CaptureError::SettleInFlight));

        recorder.settled().await;
        assert!(recorder.initialize().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_initialize_creates_fresh_encoder() {
        let factory = MockFactory::new(Ok(vec![1]));
        let (transport, _, recorder) = recorder(Arc::clone(&factory));

        let first = recorder.initialize().unwrap();
        transport.start();
        transport.stop();
        recorder.settled().await;

        let second = recorder.initialize().unwrap();
        assert_ne!(first, second);
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_resolves_empty() {
        let (transport, gate, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        recorder.initialize().unwrap();

        // Start handler swapped out so the recorder never begins
        transport.unsubscribe(TransportEventKind::Start);
        transport.start();
        transport.stop();

        assert_eq!(recorder.state(), RecorderState::Settled);
        assert_eq!(gate.state(), HandshakeState::Resolved(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_settle_is_ignored() {
        let (transport, gate, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        recorder.initialize().unwrap();

        transport.start();
        transport.stop();
        let first = gate.wait().await;

        transport.start();
        assert_eq!(recorder.state(), RecorderState::Settled);
        transport.stop();
        assert_eq!(gate.wait().await, first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_idle() {
        let (_, gate, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        assert!(!recorder.release_idle());

        recorder.initialize().unwrap();
        assert!(recorder.release_idle());
        assert_eq!(gate.state(), HandshakeState::Resolved(None));
        assert!(!recorder.release_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_unbinds_transport() {
        let (transport, _, recorder) = recorder(MockFactory::new(Ok(vec![1])));
        recorder.initialize().unwrap();
        recorder.teardown();

        assert!(!recorder.is_initialized());
        assert!(!transport.is_subscribed(TransportEventKind::Start));
        assert!(!transport.is_subscribed(TransportEventKind::Stop));
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_after_teardown_still_resolves_its_handshake() {
        let (transport, gate, recorder) = recorder(MockFactory::new(Ok(vec![5])));
        recorder.initialize().unwrap();
        let handshake = recorder.handshake().unwrap();

        transport.start();
        transport.stop();
        recorder.teardown();

        let artifact = handshake.wait().await.unwrap();
        assert_eq!(artifact.bytes(), &[5]);
        assert_eq!(gate.current().id(), handshake.id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_settled_implies_handshake_resolved() {
        let transport = TransportController::new();
        let gate = Arc::new(ReadinessGate::new());
        let recorder = RecorderController::new(
            transport.clone(),
            Arc::clone(&gate),
            MockFactory::new(Ok(vec![5])),
            Arc::new(FixedDelay::from_millis(0)),
            "recording.webm",
        );

        for _ in 0..200 {
            recorder.initialize().unwrap();
            transport.start();
            let handshake = recorder.handshake().unwrap();
            let waiter = tokio::spawn({
                let handshake = Arc::clone(&handshake);
                async move { handshake.wait().await }
            });
            transport.stop();

            recorder.settled().await;
            assert!(handshake.state().is_resolved());

            // The next take must not strand a waiter on the previous one
            recorder.initialize().unwrap();
            let artifact = tokio::time::timeout(Duration::from_secs(5), waiter)
                .await
                .expect("waiter on settled take never woke")
                .unwrap();
            assert_eq!(artifact.unwrap().bytes(), &[5]);
            recorder.release_idle();
        }
    }
}
