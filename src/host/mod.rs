// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Collaborators supplied by the host application.
//!
//! Content parsing, instrument construction, part scheduling, drawing and
//! the user-facing download/banner actions all live outside this crate.
//! The session reaches them only through these traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::recording::{MixBus, RecordingArtifact};
use crate::transport::TransportController;

/// A note parsed from loaded content
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Start time in seconds from the top
    pub time: f64,
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// Velocity (0.0 - 1.0)
    pub velocity: f32,
    /// Length in seconds
    pub duration: f64,
}

/// One track of loaded content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackData {
    /// Track name
    pub name: String,
    /// Notes in time order
    pub notes: Vec<Note>,
}

impl TrackData {
    /// Check if the track has anything to play
    pub fn has_notes(&self) -> bool {
        !self.notes.is_empty()
    }
}

/// Parsed content ready for scheduling
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedContent {
    pub tracks: Vec<TrackData>,
}

/// Loads and parses content asynchronously
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<LoadedContent>;
}

/// Handle to an instrument built for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentHandle {
    /// Index of the track it plays
    pub track: usize,
    /// Host-defined label
    pub label: String,
}

/// Builds instruments and their analysers
pub trait InstrumentFactory: Send + Sync {
    /// Build the instrument for a track, routed into the bus
    fn instrument(&self, track: usize, data: &TrackData, bus: &MixBus) -> InstrumentHandle;

    /// Attach an analyser to an instrument
    fn analyser(&self, instrument: &InstrumentHandle);
}

/// Arms musical events on the transport
pub trait PartScheduler: Send + Sync {
    /// Schedule a track's notes on its instrument
    fn schedule(
        &self,
        transport: &TransportController,
        instrument: &InstrumentHandle,
        notes: &[Note],
    );

    /// Drop every scheduled part
    fn cancel(&self, transport: &TransportController);
}

/// Draws the waveform; invoked once per start from the top
pub trait DrawHook: Send + Sync {
    /// Redraw the waveform
    fn draw(&self);
}

/// Download request built from an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Suggested filename
    pub filename: String,
    /// MIME type reported by the encoder
    pub mime_type: &'static str,
    /// Artifact the bytes come from
    pub artifact: RecordingArtifact,
}

impl DownloadRequest {
    /// Build a request for an artifact
    pub fn new(artifact: RecordingArtifact) -> Self {
        Self {
            filename: artifact.suggested_filename().to_string(),
            mime_type: artifact.mime_type(),
            artifact,
        }
    }

    /// Bytes to write
    pub fn bytes(&self) -> &[u8] {
        self.artifact.bytes()
    }
}

/// User-facing outbound actions
pub trait Frontend: Send + Sync {
    /// Trigger the platform save-as/download action
    fn deliver(&self, request: DownloadRequest) -> Result<(), DeliveryError>;

    /// Show the error banner
    fn show_error(&self, message: &str);

    /// Hide the error banner
    fn hide_error(&self);
}

/// Everything the session needs from the host
#[derive(Clone)]
pub struct Host {
    /// Content source
    pub loader: Arc<dyn ContentLoader>,
    /// Instrument builder
    pub instruments: Arc<dyn InstrumentFactory>,
    /// Note scheduler
    pub parts: Arc<dyn PartScheduler>,
    /// Waveform renderer
    pub draw: Arc<dyn DrawHook>,
    /// Download and banner surface
    pub frontend: Arc<dyn Frontend>,
}
