//! Single-writer snapshot handoff between the sampler and the renderer.
//!
//! The sampler publishes whole snapshots; readers clone the current `Arc`
//! and keep a consistent view for as long as they hold it.

use std::sync::{Arc, PoisonError, RwLock};

use crate::monitor::MonitorSnapshot;

#[derive(Debug)]
pub struct SnapshotCell {
    inner: RwLock<Arc<MonitorSnapshot>>,
}

impl SnapshotCell {
    pub fn new(initial: MonitorSnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    /// Replaces the published snapshot.
    pub fn publish(&self, snapshot: MonitorSnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    /// The latest published snapshot.
    pub fn load(&self) -> Arc<MonitorSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
