// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Master mix bus.
//!
//! All instruments render into this bus. It applies the master volume and
//! fans each block out to every connected tap, which is how recorders
//! capture the mixed output.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// One block of interleaved samples
pub type Block = Arc<[f32]>;

/// Receiving end of a bus tap
pub type TapReceiver = mpsc::UnboundedReceiver<Block>;

#[derive(Debug)]
struct MixInner {
    volume_db: f64,
    taps: Vec<mpsc::UnboundedSender<Block>>,
}

/// Shared handle to the master output
#[derive(Debug, Clone)]
pub struct MixBus {
    inner: Arc<Mutex<MixInner>>,
    sample_rate: u32,
    channels: u16,
}

impl MixBus {
    /// Create a bus with the given format
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MixInner {
                volume_db: 0.0,
                taps: Vec::new(),
            })),
            sample_rate,
            channels,
        }
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Master volume in dB
    pub fn volume_db(&self) -> f64 {
        self.inner.lock().volume_db
    }

    /// Set master volume in dB
    pub fn set_volume(&self, volume_db: f64) {
        if !volume_db.is_finite() {
            tracing::debug!(volume_db, "ignoring non-finite volume");
            return;
        }
        self.inner.lock().volume_db = volume_db;
        tracing::debug!(volume_db, "master volume set");
    }

    /// Linear gain for the current volume
    pub fn gain(&self) -> f32 {
        db_to_gain(self.volume_db())
    }

    /// Attach a new tap; it receives every block written after this call
    pub fn connect(&self) -> TapReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().taps.push(tx);
        rx
    }

    /// Number of live taps
    pub fn tap_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.taps.retain(|tap| !tap.is_closed());
        inner.taps.len()
    }

    /// Write a block of interleaved samples through the master gain.
    ///
    /// Returns the number of taps that received it. Taps whose receiver was
    /// dropped are pruned.
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut inner = self.inner.lock();
        if inner.taps.is_empty() {
            return 0;
        }

        let gain = db_to_gain(inner.volume_db);
        let block: Block = samples.iter().map(|s| s * gain).collect();
        inner.taps.retain(|tap| tap.send(Arc::clone(&block)).is_ok());
        inner.taps.len()
    }
}

impl Default for MixBus {
    fn default() -> Self {
        Self::new(44100, 2)
    }
}

fn db_to_gain(db: f64) -> f32 {
    10f64.powf(db / 20.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_creation() {
        let bus = MixBus::default();
        assert_eq!(bus.sample_rate(), 44100);
        assert_eq!(bus.channels(), 2);
        assert_eq!(bus.volume_db(), 0.0);
        assert_eq!(bus.tap_count(), 0);
    }

    #[test]
    fn test_write_without_taps() {
        let bus = MixBus::default();
        assert_eq!(bus.write(&[0.5, 0.5]), 0);
    }

    #[test]
    fn test_taps_receive_scaled_blocks() {
        let bus = MixBus::default();
        let mut rx = bus.connect();
        bus.set_volume(-6.0);

        assert_eq!(bus.write(&[1.0, -1.0]), 1);
        let block = rx.try_recv().unwrap();
        assert!((block[0] - 0.501).abs() < 0.01);
        assert!((block[1] + 0.501).abs() < 0.01);
    }

    #[test]
    fn test_dropped_taps_are_pruned() {
        let bus = MixBus::default();
        let first = bus.connect();
        let _second = bus.connect();
        assert_eq!(bus.tap_count(), 2);

        drop(first);
        assert_eq!(bus.write(&[0.0]), 1);
        assert_eq!(bus.tap_count(), 1);
    }

    #[test]
    fn test_non_finite_volume_ignored() {
        let bus = MixBus::default();
        bus.set_volume(-12.0);
        bus.set_volume(f64::INFINITY);
        assert_eq!(bus.volume_db(), -12.0);
    }

    #[test]
    fn test_db_to_gain() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-20.0) - 0.1).abs() < 1e-6);
    }
}
