// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Readiness gate.
//!
//! A single-slot handshake between the recorder and whoever wants its
//! output. Each recorder initialization opens a new handshake; the settle
//! task resolves it once, with an artifact or with nothing. Any number of
//! callers may wait on the current handshake and all see the same result.
//!
//! Opening a handshake supersedes the previous one. Callers already waiting
//! on a superseded handshake stay suspended, and resolving it afterwards is
//! a logged no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::artifact::RecordingArtifact;

/// State of one handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for the recorder
    Pending,
    /// Completed, with an artifact or with nothing
    Resolved(Option<RecordingArtifact>),
    /// Replaced by a newer handshake before it was resolved
    Superseded,
}

impl HandshakeState {
    /// Check if resolved, with or without an artifact
    pub fn is_resolved(&self) -> bool {
        matches!(self, HandshakeState::Resolved(_))
    }

    /// Artifact carried by a resolved handshake
    pub fn artifact(&self) -> Option<RecordingArtifact> {
        match self {
            HandshakeState::Resolved(artifact) => artifact.clone(),
            _ => None,
        }
    }
}

/// One readiness cycle
#[derive(Debug)]
pub struct Handshake {
    id: u64,
    state: watch::Sender<HandshakeState>,
}

impl Handshake {
    fn new(id: u64, state: HandshakeState) -> Self {
        let (state, _) = watch::channel(state);
        Self { id, state }
    }

    /// Handshake number; increases with every open
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Snapshot of the current state
    pub fn state(&self) -> HandshakeState {
        self.state.borrow().clone()
    }

    /// Check if still waiting for the recorder
    pub fn is_pending(&self) -> bool {
        *self.state.borrow() == HandshakeState::Pending
    }

    /// Complete the handshake. Only the first resolve takes effect.
    fn resolve(&self, result: Option<RecordingArtifact>) -> bool {
        self.state.send_if_modified(|state| {
            if *state == HandshakeState::Pending {
                *state = HandshakeState::Resolved(result);
                true
            } else {
                false
            }
        })
    }

    fn supersede(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == HandshakeState::Pending {
                *state = HandshakeState::Superseded;
                true
            } else {
                false
            }
        })
    }

    /// Suspend until resolved and return the result.
    ///
    /// Never returns for a handshake that is superseded before it resolves.
    pub async fn wait(&self) -> Option<RecordingArtifact> {
        let mut rx = self.state.subscribe();
        let result = rx
            .wait_for(HandshakeState::is_resolved)
            .await
            .map(|state| state.artifact());
        result.ok().flatten()
    }
}

/// Holds the current handshake
#[derive(Debug)]
pub struct ReadinessGate {
    current: Mutex<Arc<Handshake>>,
    next_id: AtomicU64,
}

impl ReadinessGate {
    /// Create a gate whose initial handshake is already resolved with nothing
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(Handshake::new(0, HandshakeState::Resolved(None)))),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a new pending handshake, superseding the current one
    pub fn open(&self) -> Arc<Handshake> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handshake = Arc::new(Handshake::new(id, HandshakeState::Pending));
        let previous = std::mem::replace(&mut *self.current.lock(), Arc::clone(&handshake));

        if previous.supersede() {
            tracing::debug!(superseded = previous.id, current = id, "superseded pending handshake");
        }
        tracing::debug!(handshake = id, "opened handshake");
        handshake
    }

    /// The current handshake
    pub fn current(&self) -> Arc<Handshake> {
        Arc::clone(&self.current.lock())
    }

    /// State of the current handshake
    pub fn state(&self) -> HandshakeState {
        self.current().state()
    }

    /// Resolve the current handshake
    pub fn resolve(&self, result: Option<RecordingArtifact>) -> bool {
        let handshake = self.current();
        self.resolve_handshake(&handshake, result)
    }

    /// Resolve a specific handshake.
    ///
    /// A handshake that is no longer current is orphaned: resolving it does
    /// nothing beyond a log line.
    pub fn resolve_handshake(
        &self,
        handshake: &Handshake,
        result: Option<RecordingArtifact>,
    ) -> bool {
        let current_id = self.current.lock().id;
        if handshake.id != current_id {
            tracing::warn!(
                handshake = handshake.id,
                current = current_id,
                "discarding result for superseded handshake"
            );
            return false;
        }

        let has_artifact = result.is_some();
        let resolved = handshake.resolve(result);
        if resolved {
            tracing::info!(handshake = handshake.id, has_artifact, "handshake resolved");
        } else {
            tracing::debug!(handshake = handshake.id, "handshake already resolved");
        }
        resolved
    }

    /// Wait for the handshake that is current at call time
    pub async fn wait(&self) -> Option<RecordingArtifact> {
        let handshake = self.current();
        handshake.wait().await
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
