// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Capture of a sequenced performance's mixed output.
//!
//! Playback runs on a [`transport::TransportController`]. A
//! [`recording::RecorderController`] records the mix for every start→stop
//! cycle and, once the encoder has settled, resolves the
//! [`recording::ReadinessGate`]. A save stops playback, waits on the gate
//! and hands the artifact to the host as a download. [`session::Session`]
//! wires all of it together.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod recording;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use error::{CaptureError, DeliveryError, EncoderError, SessionError};
pub use recording::{RecordingArtifact, ReadinessGate, RecorderController, RecorderState};
pub use session::{SaveOutcome, Session};
pub use transport::{TransportController, TransportState};
