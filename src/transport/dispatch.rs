// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Single-slot event dispatch table.
//!
//! Each event kind maps to at most one handler. Registering a handler for
//! a kind that already has one replaces it, so rebinding never leaves a
//! stale handler behind.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

/// Event handler stored in a dispatch table
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Dispatch table keyed by event kind
pub struct Dispatcher<K, E> {
    handlers: Mutex<HashMap<K, Handler<E>>>,
}

impl<K, E> Dispatcher<K, E>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Bind a handler, replacing any previous one for the same kind.
    ///
    /// Returns true if a handler was replaced.
    pub fn set<F>(&self, kind: K, handler: F) -> bool
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.handlers.lock().insert(kind, Arc::new(handler)).is_some()
    }

    /// Remove the handler for a kind
    pub fn remove(&self, kind: K) -> bool {
        self.handlers.lock().remove(&kind).is_some()
    }

    /// Swap the whole table in one step
    pub fn replace_all<I>(&self, handlers: I)
    where
        I: IntoIterator<Item = (K, Handler<E>)>,
    {
        let table: HashMap<K, Handler<E>> = handlers.into_iter().collect();
        *self.handlers.lock() = table;
    }

    /// Remove every handler
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    /// Check whether a kind has a handler
    pub fn is_bound(&self, kind: K) -> bool {
        self.handlers.lock().contains_key(&kind)
    }

    /// Number of bound kinds
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Check if no kind is bound
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    /// Invoke the handler for a kind, if any.
    ///
    /// The table lock is released before the handler runs, so a handler may
    /// rebind or emit on the same table.
    pub fn emit(&self, kind: K, event: &E) -> bool {
        let handler = self.handlers.lock().get(&kind).cloned();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => {
                tracing::trace!(?kind, "no handler bound");
                false
            }
        }
    }
}

impl<K, E> Default for Dispatcher<K, E>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> fmt::Debug for Dispatcher<K, E>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.lock();
        f.debug_struct("Dispatcher")
            .field("bound", &handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
