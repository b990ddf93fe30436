// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Settle strategies.
//!
//! After the transport stops, the encoder needs time to flush buffered
//! frames before its output is complete. A strategy decides how long to
//! wait before the recorder finishes the encoder.

use std::time::Duration;

use async_trait::async_trait;

/// Waits for the encoder to flush after a stop
#[async_trait]
pub trait SettleStrategy: Send + Sync {
    /// Resolve once it is safe to finish the encoder
    async fn settle(&self);
}

/// Waits a fixed duration on the tokio clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Default flush wait
    pub const DEFAULT: Duration = Duration::from_millis(2000);

    /// Create with a custom delay
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Create from milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

#[async_trait]
impl SettleStrategy for FixedDelay {
    async fn settle(&self) {
        tracing::debug!(delay_ms = self.delay.as_millis() as u64, "waiting for encoder to settle");
        tokio::time::sleep(self.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_default_delay() {
        assert_eq!(FixedDelay::default().delay(), Duration::from_millis(2000));
        assert_eq!(FixedDelay::from_millis(5).delay(), Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_waits_full_duration() {
        let strategy = FixedDelay::from_millis(2000);
        let started = Instant::now();
        strategy.settle().await;
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }
}
