// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback transport.
//!
//! This module provides:
//! - The start/pause/stop state machine with idempotent commands
//! - A dispatch table holding one handler per event kind
//! - Time-zero callbacks fired whenever playback starts from the top

pub mod controller;
pub mod dispatch;

pub use controller::{StartCallback, TransportController};
pub use dispatch::{Dispatcher, Handler};

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    Stopped,
    Started,
    Paused,
}

impl Default for TransportState {
    fn default() -> Self {
        TransportState::Stopped
    }
}

/// Kind of transport event, used as the dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportEventKind {
    Start,
    Pause,
    Stop,
}

/// Emitted after a transport transition has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportEvent {
    /// What happened
    pub kind: TransportEventKind,
    /// State before the transition
    pub previous: TransportState,
}

impl TransportEvent {
    /// State after the transition
    pub fn current(&self) -> TransportState {
        match self.kind {
            TransportEventKind::Start => TransportState::Started,
            TransportEventKind::Pause => TransportState::Paused,
            TransportEventKind::Stop => TransportState::Stopped,
        }
    }

    /// True when playback resumed from a pause rather than the top
    pub fn is_resume(&self) -> bool {
        self.kind == TransportEventKind::Start && self.previous == TransportState::Paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        assert_eq!(TransportState::default(), TransportState::Stopped);
    }

    #[test]
    fn test_event_current_state() {
        let event = TransportEvent {
            kind: TransportEventKind::Start,
            previous: TransportState::Paused,
        };
        assert_eq!(event.current(), TransportState::Started);
        assert!(event.is_resume());

        let event = TransportEvent {
            kind: TransportEventKind::Stop,
            previous: TransportState::Started,
        };
        assert_eq!(event.current(), TransportState::Stopped);
        assert!(!event.is_resume());
    }
}
