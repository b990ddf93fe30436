// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording of the mixed output.
//!
//! This module provides:
//! - The master mix bus and the tap encoder that captures it
//! - Settle strategies for waiting out the encoder flush
//! - The readiness gate that hands artifacts to savers
//! - The recorder controller tying all of it to the transport

pub mod artifact;
pub mod capture;
pub mod encoder;
pub mod gate;
pub mod mix;
pub mod settle;

pub use artifact::{RecordingArtifact, DEFAULT_MIME_TYPE};
pub use capture::{RecorderController, RecorderState};
pub use encoder::{
    Encoder, EncoderFactory, EncoderState, TapEncoder, TapEncoderFactory, CAPTURE_MIME_TYPE,
};
pub use gate::{Handshake, HandshakeState, ReadinessGate};
pub use mix::{Block, MixBus, TapReceiver};
pub use settle::{FixedDelay, SettleStrategy};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportController;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_tap_encoder_records_bus_output() {
        let bus = MixBus::default();
        let transport = TransportController::new();
        let gate = Arc::new(ReadinessGate::new());
        let recorder = RecorderController::new(
            transport.clone(),
            Arc::clone(&gate),
            Arc::new(TapEncoderFactory::new(bus.clone())),
            Arc::new(FixedDelay::from_millis(100)),
            "recording.webm",
        );

        recorder.initialize().unwrap();
        transport.start();
        bus.write(&[0.5; 64]);
        transport.stop();

        // Blocks written during the settle still make the take
        tokio::time::sleep(Duration::from_millis(50)).await;
        bus.write(&[0.5; 64]);

        let artifact = gate.wait().await.unwrap();
        assert_eq!(artifact.len(), 14 + 128 * 4);
        assert_eq!(artifact.mime_type(), CAPTURE_MIME_TYPE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_take_has_no_artifact() {
        let bus = MixBus::default();
        let transport = TransportController::new();
        let gate = Arc::new(ReadinessGate::new());
        let recorder = RecorderController::new(
            transport.clone(),
            Arc::clone(&gate),
            Arc::new(TapEncoderFactory::new(bus)),
            Arc::new(FixedDelay::default()),
            "recording.webm",
        );

        recorder.initialize().unwrap();
        transport.start();
        transport.stop();

        assert_eq!(gate.wait().await, None);
    }
}
