// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transient error banner.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::host::Frontend;

/// What the banner currently shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BannerState {
    pub visible: bool,
    pub message: String,
    pub expires_at: Option<Instant>,
}

/// Error banner that hides itself after a fixed duration
#[derive(Clone)]
pub struct ErrorBanner {
    state: Arc<Mutex<BannerState>>,
    frontend: Arc<dyn Frontend>,
    duration: Duration,
}

impl ErrorBanner {
    /// Create a hidden banner that shows for `duration` once raised
    pub fn new(frontend: Arc<dyn Frontend>, duration: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BannerState::default())),
            frontend,
            duration,
        }
    }

    /// Snapshot of the banner
    pub fn state(&self) -> BannerState {
        self.state.lock().clone()
    }

    /// Check if the banner is showing
    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    /// Show a message and schedule the auto-hide.
    ///
    /// Raising again before expiry restarts the timer; only the latest
    /// deadline hides the banner. Must be called inside a tokio runtime.
    pub fn raise(&self, message: &str) {
        let deadline = Instant::now() + self.duration;
        {
            let mut state = self.state.lock();
            state.visible = true;
            state.message = message.to_string();
            state.expires_at = Some(deadline);
        }
        self.frontend.show_error(message);
        tracing::debug!(message, "error banner shown");

        let banner = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            banner.expire(deadline);
        });
    }

    fn expire(&self, deadline: Instant) {
        {
            let mut state = self.state.lock();
            if !state.visible || state.expires_at != Some(deadline) {
                return;
            }
            state.visible = false;
            state.expires_at = None;
        }
        self.frontend.hide_error();
        tracing::debug!("error banner hidden");
    }
}

impl std::fmt::Debug for ErrorBanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBanner")
            .field("state", &self.state())
            .field("duration", &self.duration)
            .finish()
    }
}
