// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types shared across the capture pipeline.
//!
//! Nothing in here crosses an event callback: encoder and delivery
//! failures are folded into absence markers or the error banner before
//! they reach the transport.

use thiserror::Error;

/// Errors from recorder lifecycle management
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("recorder is currently recording; stop the transport before re-initializing")]
    Recording,

    #[error("a stop-triggered settle is still in flight")]
    SettleInFlight,

    #[error("no tokio runtime available to run the settle task")]
    NoRuntime,
}

/// Errors produced by an encoder
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncoderError {
    #[error("failed to start encoder: {0}")]
    StartFailed(String),

    #[error("encoder produced no data")]
    NoData,

    #[error("encoder was already finished")]
    Finished,
}

/// Errors reported by the host when handing off a download
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("download rejected: {0}")]
    Rejected(String),
}

/// Errors surfaced by the session facade
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("failed to load content: {0:#}")]
    Load(#[source] anyhow::Error),
}
