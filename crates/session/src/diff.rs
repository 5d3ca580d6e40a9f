//! The ordered log of queued deltas.

use crate::delta::Delta;
use geodelta_core::Result;
use geodelta_storage::FeatureStore;
use log::debug;
use std::collections::VecDeque;

/// Pending deltas in the order they were queued.
#[derive(Clone, Debug, Default)]
pub struct SessionDiff {
    deltas: VecDeque<Delta>,
}

impl SessionDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a delta.
    pub fn add(&mut self, delta: Delta) {
        debug!("queued {} delta on {}", delta.kind(), delta.type_name());
        self.deltas.push_back(delta);
    }

    /// Returns the queued deltas in insertion order.
    pub fn deltas(&self) -> impl Iterator<Item = &Delta> {
        self.deltas.iter()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Applies every delta to `store` in insertion order.
    ///
    /// Identifiers assigned by the store to added features are remapped in
    /// the deltas still queued. Commit is not atomic: on failure, the deltas
    /// already applied stay applied and the failing delta and everything after
    /// it stay queued.
    pub fn commit(&mut self, store: &dyn FeatureStore) -> Result<()> {
        let total = self.deltas.len();
        while let Some(delta) = self.deltas.pop_front() {
            match delta.apply_to(store) {
                Ok(Some(id_map)) if !id_map.is_empty() => {
                    for pending in self.deltas.iter_mut() {
                        pending.remap_identifiers(&id_map);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(
                        "commit stopped after {} of {} deltas: {}",
                        total - self.deltas.len() - 1,
                        total,
                        e
                    );
                    self.deltas.push_front(delta);
                    return Err(e);
                }
            }
            delta.dispose();
        }
        debug!("committed {} deltas", total);
        Ok(())
    }

    /// Discards every queued delta.
    pub fn rollback(&mut self) {
        let total = self.deltas.len();
        for delta in self.deltas.drain(..) {
            delta.dispose();
        }
        debug!("rolled back {} deltas", total);
    }
}
