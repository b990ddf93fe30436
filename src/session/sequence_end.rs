// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequence-end signal and the watcher that stops playback on it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::transport::{Handler, TransportController};

/// Raised by the content side when the last scheduled event has played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceEnded {
    /// Diagnostic text from the emitter
    pub message: String,
}

/// Identifies one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct SignalInner {
    listeners: Mutex<Vec<(ListenerId, Handler<SequenceEnded>)>>,
    next_id: AtomicU64,
}

/// Broadcast point for the sequence-end event.
///
/// Cloning yields another handle to the same signal.
#[derive(Clone, Default)]
pub struct SequenceEndSignal {
    inner: Arc<SignalInner>,
}

impl SequenceEndSignal {
    /// Create a signal with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SequenceEnded) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; false if it was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Deliver the event to every listener; returns how many ran
    pub fn emit(&self, message: impl Into<String>) -> usize {
        let event = SequenceEnded {
            message: message.into(),
        };
        let listeners: Vec<_> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }
}

impl std::fmt::Debug for SequenceEndSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceEndSignal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Stops the transport when the sequence ends
#[derive(Debug)]
pub struct SequenceEndWatcher {
    signal: SequenceEndSignal,
    transport: TransportController,
    listener: Mutex<Option<ListenerId>>,
}

impl SequenceEndWatcher {
    /// Create a disarmed watcher
    pub fn new(signal: SequenceEndSignal, transport: TransportController) -> Self {
        Self {
            signal,
            transport,
            listener: Mutex::new(None),
        }
    }

    /// Register the stop listener, dropping any earlier registration first
    pub fn arm(&self) {
        let mut slot = self.listener.lock();
        if let Some(previous) = slot.take() {
            self.signal.remove_listener(previous);
        }

        let transport = self.transport.clone();
        let id = self.signal.add_listener(move |event| {
            tracing::info!(message = %event.message, "sequence reached end");
            transport.stop();
        });
        *slot = Some(id);
    }

    /// Remove the stop listener
    pub fn disarm(&self) -> bool {
        match self.listener.lock().take() {
            Some(id) => self.signal.remove_listener(id),
            None => false,
        }
    }

    /// Check if the stop listener is registered
    pub fn is_armed(&self) -> bool {
        self.listener.lock().is_some()
    }
}

impl Drop for SequenceEndWatcher {
    fn drop(&mut self) {
        self.disarm();
    }
}
