// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Save orchestration.
//!
//! A save stops the transport, waits on the readiness gate and hands the
//! artifact to the frontend. Saves are serialized: a second call made while
//! one is in flight waits its turn and then reads the same handshake, so it
//! sees the same result.

use std::sync::Arc;

use parking_lot::Mutex;

use super::banner::ErrorBanner;
use crate::error::DeliveryError;
use crate::host::{DownloadRequest, Frontend};
use crate::recording::{ReadinessGate, RecorderController};
use crate::transport::TransportController;

/// Where the orchestrator is in a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    /// Waiting for the recorder to hand over its output
    Saving,
    /// Handing the artifact to the frontend
    Delivering,
    /// Error banner visible
    ShowingError,
}

/// Result of one save call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Download triggered
    Delivered { filename: String, bytes: usize },
    /// No recorder session was ever initialized
    NothingToSave,
    /// The recording cycle produced no artifact
    NoRecording,
    /// The frontend refused the download
    DeliveryFailed(DeliveryError),
}

/// Drives stop → await → deliver
pub struct SaveOrchestrator {
    transport: TransportController,
    recorder: RecorderController,
    gate: Arc<ReadinessGate>,
    frontend: Arc<dyn Frontend>,
    banner: ErrorBanner,
    no_recording_message: String,
    in_flight: tokio::sync::Mutex<()>,
    state: Mutex<SaveState>,
}

impl SaveOrchestrator {
    /// Create an idle orchestrator
    pub fn new(
        transport: TransportController,
        recorder: RecorderController,
        gate: Arc<ReadinessGate>,
        frontend: Arc<dyn Frontend>,
        banner: ErrorBanner,
        no_recording_message: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            recorder,
            gate,
            frontend,
            banner,
            no_recording_message: no_recording_message.into(),
            in_flight: tokio::sync::Mutex::new(()),
            state: Mutex::new(SaveState::Idle),
        }
    }

    /// Current orchestrator state
    pub fn state(&self) -> SaveState {
        let state = *self.state.lock();
        if state == SaveState::ShowingError && !self.banner.is_visible() {
            return SaveState::Idle;
        }
        state
    }

    /// Check if a save is running
    pub fn is_saving(&self) -> bool {
        matches!(self.state(), SaveState::Saving | SaveState::Delivering)
    }

    /// The banner this orchestrator raises
    pub fn banner(&self) -> &ErrorBanner {
        &self.banner
    }

    /// Stop playback, wait for the recording and deliver it
    pub async fn save(&self) -> SaveOutcome {
        if !self.recorder.is_initialized() {
            tracing::info!("save requested, nothing loaded");
            return SaveOutcome::NothingToSave;
        }

        let _turn = self.in_flight.lock().await;
        self.set_state(SaveState::Saving);
        tracing::info!("save requested, stopping playback and awaiting recording");

        self.transport.stop();
        self.recorder.release_idle();

        let outcome = match self.gate.wait().await {
            Some(artifact) => {
                self.set_state(SaveState::Delivering);
                let filename = artifact.suggested_filename().to_string();
                let bytes = artifact.len();

                match self.frontend.deliver(DownloadRequest::new(artifact)) {
                    Ok(()) => {
                        tracing::info!(%filename, bytes, "recording delivered");
                        SaveOutcome::Delivered { filename, bytes }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "delivery failed");
                        self.banner.raise(&e.to_string());
                        SaveOutcome::DeliveryFailed(e)
                    }
                }
            }
            None => {
                tracing::warn!("save finished without a recording");
                self.banner.raise(&self.no_recording_message);
                SaveOutcome::NoRecording
            }
        };

        self.set_state(match outcome {
            SaveOutcome::Delivered { .. } => SaveState::Idle,
            _ => SaveState::ShowingError,
        });
        outcome
    }

    fn set_state(&self, state: SaveState) {
        *self.state.lock() = state;
    }
}

impl std::fmt::Debug for SaveOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveOrchestrator")
            .field("state", &self.state())
            .field("banner", &self.banner)
            .finish()
    }
}
