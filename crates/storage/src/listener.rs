//! Storage listeners and the collections that hold them.
//!
//! `ListenerRegistry` holds weak references: a store must not keep its
//! listeners (typically sessions) alive. `ListenerSet` holds strong
//! references for listeners owned by the caller of `add`.
//!
//! Both take a snapshot under their lock and invoke listeners outside it, so a
//! listener may add or remove listeners from its own callback.

use crate::event::StorageEvent;
use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Unique identifier for a registered listener.
pub type ListenerId = u64;

/// Receives storage events.
pub trait StorageListener: Send + Sync {
    fn on_event(&self, event: &StorageEvent);
}

impl<F> StorageListener for F
where
    F: Fn(&StorageEvent) + Send + Sync,
{
    fn on_event(&self, event: &StorageEvent) {
        self(event)
    }
}

/// Weakly-held listeners, keyed by id.
pub struct ListenerRegistry {
    entries: Mutex<Vec<(ListenerId, Weak<dyn StorageListener>)>>,
    next_id: AtomicU64,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a listener and returns its id.
    pub fn register(&self, listener: Weak<dyn StorageListener>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().push((id, listener));
        debug!("registered weak storage listener {}", id);
        id
    }

    /// Unregisters a listener by id.
    ///
    /// Returns true if the listener was found and removed.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Delivers `event` to every listener still alive and prunes dead entries.
    pub fn dispatch(&self, event: &StorageEvent) {
        let alive: Vec<Arc<dyn StorageListener>> = {
            let mut entries = self.entries.lock();
            entries.retain(|(_, weak)| weak.strong_count() > 0);
            entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        for listener in alive {
            listener.on_event(event);
        }
    }

    /// Returns the number of listeners still alive.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strongly-held listeners, keyed by id.
pub struct ListenerSet {
    entries: Mutex<Vec<(ListenerId, Arc<dyn StorageListener>)>>,
    next_id: AtomicU64,
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerSet {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Adds a listener and returns its id.
    pub fn add(&self, listener: Arc<dyn StorageListener>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().push((id, listener));
        id
    }

    /// Removes a listener by id.
    ///
    /// Returns true if the listener was found and removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Delivers `event` to a snapshot of the current listeners.
    pub fn fire(&self, event: &StorageEvent) {
        let snapshot: Vec<Arc<dyn StorageListener>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
