// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback-and-capture session.
//!
//! This module provides:
//! - The save orchestrator and its error banner
//! - The sequence-end watcher
//! - [`Session`], which owns every component and exposes the user actions
//!   (load, play/pause, stop, save, volume)

pub mod banner;
pub mod save;
pub mod sequence_end;

pub use banner::{BannerState, ErrorBanner};
pub use save::{SaveOrchestrator, SaveOutcome, SaveState};
pub use sequence_end::{ListenerId, SequenceEndSignal, SequenceEndWatcher, SequenceEnded};

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::host::{Host, InstrumentHandle};
use crate::recording::{
    EncoderFactory, FixedDelay, MixBus, ReadinessGate, RecorderController, TapEncoderFactory,
};
use crate::transport::{TransportController, TransportState};

/// Owns the transport, recorder, gate and save path for one process session
pub struct Session {
    config: SessionConfig,
    host: Host,
    transport: TransportController,
    bus: MixBus,
    gate: Arc<ReadinessGate>,
    recorder: RecorderController,
    saver: SaveOrchestrator,
    sequence_end: SequenceEndSignal,
    watcher: SequenceEndWatcher,
    instruments: Mutex<Vec<InstrumentHandle>>,
}

impl Session {
    /// Create a session that records the bus through [`TapEncoderFactory`]
    pub fn new(config: SessionConfig, host: Host) -> Self {
        let bus = MixBus::default();
        let factory = Arc::new(TapEncoderFactory::new(bus.clone()));
        Self::with_encoder(config, host, bus, factory)
    }

    /// Create a session with a custom encoder
    pub fn with_encoder(
        config: SessionConfig,
        host: Host,
        bus: MixBus,
        factory: Arc<dyn EncoderFactory>,
    ) -> Self {
        let transport = TransportController::new();
        let gate = Arc::new(ReadinessGate::new());
        let recorder = RecorderController::new(
            transport.clone(),
            Arc::clone(&gate),
            factory,
            Arc::new(FixedDelay::new(config.settle_delay())),
            config.artifact_filename.as_str(),
        );
        let banner = ErrorBanner::new(Arc::clone(&host.frontend), config.banner_duration());
        let saver = SaveOrchestrator::new(
            transport.clone(),
            recorder.clone(),
            Arc::clone(&gate),
            Arc::clone(&host.frontend),
            banner,
            config.no_recording_message.as_str(),
        );
        let sequence_end = SequenceEndSignal::new();
        let watcher = SequenceEndWatcher::new(sequence_end.clone(), transport.clone());

        Self {
            config,
            host,
            transport,
            bus,
            gate,
            recorder,
            saver,
            sequence_end,
            watcher,
            instruments: Mutex::new(Vec::new()),
        }
    }

    /// Load content and schedule it for playback.
    ///
    /// Stops playback, clears everything scheduled by a previous load,
    /// re-arms the sequence-end watcher and applies the initial volume before
    /// asking the host for content. Returns the number of instruments built.
    pub async fn load_file(&self) -> Result<usize, SessionError> {
        self.stop();
        self.transport.cancel();
        self.host.parts.cancel(&self.transport);
        self.instruments.lock().clear();

        self.watcher.arm();
        self.bus.set_volume(self.config.initial_volume_db);

        let content = self.host.loader.load().await.map_err(SessionError::Load)?;

        let mut instruments = Vec::with_capacity(content.tracks.len());
        for (index, track) in content.tracks.iter().enumerate() {
            let instrument = self.host.instruments.instrument(index, track, &self.bus);
            self.host.instruments.analyser(&instrument);
            if track.has_notes() {
                self.host
                    .parts
                    .schedule(&self.transport, &instrument, &track.notes);
            }
            instruments.push(instrument);
        }

        let draw = Arc::clone(&self.host.draw);
        self.transport.schedule_on_start(move || draw.draw());

        let count = instruments.len();
        *self.instruments.lock() = instruments;
        tracing::info!(tracks = content.tracks.len(), instruments = count, "content loaded");
        Ok(count)
    }

    /// Toggle playback.
    ///
    /// Starting from stopped re-initializes the recorder first, waiting for
    /// any in-flight settle so the previous take is handed over intact.
    pub async fn play_pause(&self) -> Result<TransportState, SessionError> {
        match self.transport.state() {
            TransportState::Started => {
                tracing::info!("pausing playback");
                self.transport.pause();
            }
            TransportState::Paused => {
                tracing::info!("resuming playback");
                self.transport.start();
            }
            TransportState::Stopped => {
                self.recorder.settled().await;
                tracing::info!("transport stopped, initializing recorder");
                self.recorder.initialize()?;
                self.transport.start();
            }
        }
        Ok(self.transport.state())
    }

    /// Stop playback if it is running
    pub fn stop(&self) -> bool {
        self.transport.stop()
    }

    /// Stop, wait for the recording and deliver it
    pub async fn save(&self) -> SaveOutcome {
        self.saver.save().await
    }

    /// Set the master volume in dB
    pub fn set_volume(&self, volume_db: f64) {
        self.bus.set_volume(volume_db);
    }

    /// Configuration the session was built with
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Playback transport
    pub fn transport(&self) -> &TransportController {
        &self.transport
    }

    /// Recorder bound to the transport
    pub fn recorder(&self) -> &RecorderController {
        &self.recorder
    }

    /// Gate that hands recordings to savers
    pub fn gate(&self) -> &Arc<ReadinessGate> {
        &self.gate
    }

    /// Master mix bus
    pub fn bus(&self) -> &MixBus {
        &self.bus
    }

    /// Save orchestrator
    pub fn saver(&self) -> &SaveOrchestrator {
        &self.saver
    }

    /// Signal the host raises when content runs out
    pub fn sequence_end(&self) -> &SequenceEndSignal {
        &self.sequence_end
    }

    /// Instruments built by the last load
    pub fn instruments(&self) -> Vec<InstrumentHandle> {
        self.instruments.lock().clone()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("recorder", &self.recorder)
            .field("saver", &self.saver)
            .finish()
    }
}
