// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport controller.
//!
//! Wraps the playback state and applies start/pause/stop commands. Illegal
//! transitions are absorbed without emitting anything, so every command is
//! safe to call from any state.

use std::sync::Arc;

use parking_lot::Mutex;

use super::dispatch::{Dispatcher, Handler};
use super::{TransportEvent, TransportEventKind, TransportState};

/// Callback fired when playback starts from the top
pub type StartCallback = Arc<dyn Fn() + Send + Sync>;

struct TransportInner {
    state: Mutex<TransportState>,
    handlers: Dispatcher<TransportEventKind, TransportEvent>,
    on_start: Mutex<Vec<StartCallback>>,
}

/// Shared handle to the playback transport.
///
/// Cloning yields another handle to the same transport.
#[derive(Clone)]
pub struct TransportController {
    inner: Arc<TransportInner>,
}

impl TransportController {
    /// Create a stopped transport with no handlers
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TransportInner {
                state: Mutex::new(TransportState::Stopped),
                handlers: Dispatcher::new(),
                on_start: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Current playback state
    pub fn state(&self) -> TransportState {
        *self.inner.state.lock()
    }

    /// Check if playing
    pub fn is_started(&self) -> bool {
        self.state() == TransportState::Started
    }

    /// Start or resume playback.
    ///
    /// Returns false when already started.
    pub fn start(&self) -> bool {
        let previous = {
            let mut state = self.inner.state.lock();
            if *state == TransportState::Started {
                tracing::debug!("start ignored, transport already started");
                return false;
            }
            std::mem::replace(&mut *state, TransportState::Started)
        };

        tracing::info!(?previous, "transport started");
        self.emit(TransportEventKind::Start, previous);

        // A Start handler may already have stopped or paused playback
        if previous == TransportState::Stopped && self.state() == TransportState::Started {
            let callbacks = self.inner.on_start.lock().clone();
            for callback in callbacks {
                callback();
            }
        }
        true
    }

    /// Pause playback; only valid while started
    pub fn pause(&self) -> bool {
        {
            let mut state = self.inner.state.lock();
            if *state != TransportState::Started {
                tracing::debug!(state = ?*state, "pause ignored");
                return false;
            }
            *state = TransportState::Paused;
        }

        tracing::info!("transport paused");
        self.emit(TransportEventKind::Pause, TransportState::Started);
        true
    }

    /// Stop playback; a no-op when already stopped
    pub fn stop(&self) -> bool {
        let previous = {
            let mut state = self.inner.state.lock();
            if *state == TransportState::Stopped {
                tracing::debug!("stop ignored, transport already stopped");
                return false;
            }
            std::mem::replace(&mut *state, TransportState::Stopped)
        };

        tracing::info!(?previous, "transport stopped");
        self.emit(TransportEventKind::Stop, previous);
        true
    }

    /// Bind the handler for an event kind, replacing any previous one
    pub fn subscribe<F>(&self, kind: TransportEventKind, handler: F)
    where
        F: Fn(&TransportEvent) + Send + Sync + 'static,
    {
        if self.inner.handlers.set(kind, handler) {
            tracing::debug!(?kind, "replaced transport handler");
        }
    }

    /// Remove the handler for an event kind
    pub fn unsubscribe(&self, kind: TransportEventKind) -> bool {
        self.inner.handlers.remove(kind)
    }

    /// Replace every transport handler in one step
    pub fn rebind<I>(&self, handlers: I)
    where
        I: IntoIterator<Item = (TransportEventKind, Handler<TransportEvent>)>,
    {
        self.inner.handlers.replace_all(handlers);
    }

    /// Check whether an event kind has a handler
    pub fn is_subscribed(&self, kind: TransportEventKind) -> bool {
        self.inner.handlers.is_bound(kind)
    }

    /// Run a callback each time playback starts from the top.
    ///
    /// Resuming from a pause does not fire it.
    pub fn schedule_on_start<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.on_start.lock().push(Arc::new(callback));
    }

    /// Drop every time-zero callback
    pub fn cancel(&self) {
        let mut callbacks = self.inner.on_start.lock();
        if !callbacks.is_empty() {
            tracing::debug!(count = callbacks.len(), "cancelled scheduled start callbacks");
        }
        callbacks.clear();
    }

    /// Number of time-zero callbacks
    pub fn scheduled_count(&self) -> usize {
        self.inner.on_start.lock().len()
    }

    fn emit(&self, kind: TransportEventKind, previous: TransportState) {
        self.inner.handlers.emit(kind, &TransportEvent { kind, previous });
    }
}

impl Default for TransportController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportController")
            .field("state", &self.state())
            .field("handlers", &self.inner.handlers)
            .finish()
    }
}
