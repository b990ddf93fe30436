// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Encoder abstraction and the default bus-tap encoder.
//!
//! An encoder is owned by exactly one recorder session. It is created when
//! the session is initialized and consumed when the session settles; a new
//! session always gets a new encoder from its factory.

use async_trait::async_trait;

use super::artifact::DEFAULT_MIME_TYPE;
use super::mix::{Block, MixBus, TapReceiver};
use crate::error::EncoderError;

/// Magic bytes at the start of a tap encoder capture
pub const CAPTURE_MAGIC: &[u8; 4] = b"SQCP";

/// MIME type of a tap encoder capture
pub const CAPTURE_MIME_TYPE: &str = "application/x-seq-capture";

/// Encoder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Created, not yet capturing
    Idle,
    /// Capturing output
    Recording,
    /// Output has been produced; the encoder cannot be reused
    Finished,
}

/// Captures the mixed output into an encoded buffer
#[async_trait]
pub trait Encoder: Send {
    /// Current state
    fn state(&self) -> EncoderState;

    /// Begin capturing
    fn start(&mut self) -> Result<(), EncoderError>;

    /// Stop capturing and return the encoded bytes
    async fn finish(&mut self) -> Result<Vec<u8>, EncoderError>;

    /// MIME type of the bytes returned by `finish`
    fn mime_type(&self) -> &'static str {
        DEFAULT_MIME_TYPE
    }
}

/// Builds a fresh encoder for each recorder session
pub trait EncoderFactory: Send + Sync {
    /// Create a new encoder
    fn create(&self) -> Box<dyn Encoder>;
}

/// Encoder fed by a [`MixBus`] tap.
///
/// Output layout: magic, sample rate (u32 LE), channels (u16 LE), sample
/// count (u32 LE), then the samples as f32 LE.
#[derive(Debug)]
pub struct TapEncoder {
    tap: TapReceiver,
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
    state: EncoderState,
}

impl TapEncoder {
    /// Create an encoder reading from a tap
    pub fn new(tap: TapReceiver, sample_rate: u32, channels: u16) -> Self {
        Self {
            tap,
            sample_rate,
            channels,
            samples: Vec::new(),
            state: EncoderState::Idle,
        }
    }

    /// Pull every pending block out of the tap.
    ///
    /// Blocks are kept only while recording.
    pub fn pump(&mut self) -> usize {
        let mut received = 0;
        while let Ok(block) = self.tap.try_recv() {
            received += 1;
            if self.state == EncoderState::Recording {
                self.push_block(&block);
            }
        }
        received
    }

    /// Samples captured so far
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn push_block(&mut self, block: &Block) {
        self.samples.extend_from_slice(block);
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(14 + self.samples.len() * 4);
        out.extend_from_slice(CAPTURE_MAGIC);
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&(self.samples.len() as u32).to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }
}

#[async_trait]
impl Encoder for TapEncoder {
    fn state(&self) -> EncoderState {
        self.state
    }

    fn mime_type(&self) -> &'static str {
        CAPTURE_MIME_TYPE
    }

    fn start(&mut self) -> Result<(), EncoderError> {
        match self.state {
            EncoderState::Idle => {
                // Anything written before the start is not part of the take
                self.pump();
                self.state = EncoderState::Recording;
                Ok(())
            }
            EncoderState::Recording => Ok(()),
            EncoderState::Finished => Err(EncoderError::Finished),
        }
    }

    async fn finish(&mut self) -> Result<Vec<u8>, EncoderError> {
        match self.state {
            EncoderState::Finished => return Err(EncoderError::Finished),
            EncoderState::Idle => {
                self.state = EncoderState::Finished;
                return Err(EncoderError::NoData);
            }
            EncoderState::Recording => {}
        }

        self.pump();
        self.state = EncoderState::Finished;
        self.tap.close();

        if self.samples.is_empty() {
            return Err(EncoderError::NoData);
        }
        Ok(self.encode())
    }
}

/// Creates [`TapEncoder`]s connected to a bus
#[derive(Debug, Clone)]
pub struct TapEncoderFactory {
    bus: MixBus,
}

impl TapEncoderFactory {
    /// Create a factory for a bus
    pub fn new(bus: MixBus) -> Self {
        Self { bus }
    }
}

impl EncoderFactory for TapEncoderFactory {
    fn create(&self) -> Box<dyn Encoder> {
        Box::new(TapEncoder::new(
            self.bus.connect(),
            self.bus.sample_rate(),
            self.bus.channels(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(bus: &MixBus) -> TapEncoder {
        TapEncoder::new(bus.connect(), bus.sample_rate(), bus.channels())
    }

    #[tokio::test]
    async fn test_captures_blocks_after_start() {
        let bus = MixBus::new(48000, 2);
        let mut enc = encoder(&bus);

        bus.write(&[9.0, 9.0]);
        enc.start().unwrap();
        bus.write(&[0.25, 0.5]);
        bus.write(&[0.75, 1.0]);

        let bytes = enc.finish().await.unwrap();
        assert_eq!(&bytes[0..4], CAPTURE_MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 48000);
        assert_eq!(u16::from_le_bytes(bytes[8..10].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(bytes[10..14].try_into().unwrap()), 4);
        assert_eq!(bytes.len(), 14 + 4 * 4);
        assert_eq!(f32::from_le_bytes(bytes[14..18].try_into().unwrap()), 0.25);
        assert_eq!(enc.state(), EncoderState::Finished);
    }

    #[tokio::test]
    async fn test_finish_without_data() {
        let bus = MixBus::default();
        let mut enc = encoder(&bus);
        enc.start().unwrap();
        assert_eq!(enc.finish().await, Err(EncoderError::NoData));
    }

    #[tokio::test]
    async fn test_finish_before_start() {
        let bus = MixBus::default();
        let mut enc = encoder(&bus);
        assert_eq!(enc.finish().await, Err(EncoderError::NoData));
        assert_eq!(enc.state(), EncoderState::Finished);
    }

    #[tokio::test]
    async fn test_encoder_is_single_use() {
        let bus = MixBus::default();
        let mut enc = encoder(&bus);
        enc.start().unwrap();
        bus.write(&[0.1]);
        assert!(enc.finish().await.is_ok());

        assert_eq!(enc.start(), Err(EncoderError::Finished));
        assert_eq!(enc.finish().await, Err(EncoderError::Finished));
    }

    #[test]
    fn test_finished_encoder_releases_tap() {
        let bus = MixBus::default();
        let factory = TapEncoderFactory::new(bus.clone());
        let first = factory.create();
        let _second = factory.create();
        assert_eq!(bus.tap_count(), 2);

        drop(first);
        assert_eq!(bus.tap_count(), 1);
    }

    #[test]
    fn test_pump_discards_while_idle() {
        let bus = MixBus::default();
        let mut enc = encoder(&bus);
        bus.write(&[1.0, 1.0]);
        assert_eq!(enc.pump(), 1);
        assert_eq!(enc.sample_count(), 0);
    }
}
