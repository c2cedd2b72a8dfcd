//! Single-writer publish slot for immutable snapshots.
//!
//! Readers take an `Arc` clone under a read lock that is held only for the
//! clone; writers serialize on an async mutex while they build, then swap the
//! pointer. A reader therefore sees either the previous or the next snapshot,
//! never a partially built one.

use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, MutexGuard};

pub struct SnapshotCell<T: ?Sized> {
    current: RwLock<Option<Arc<T>>>,
    build_lock: Mutex<()>,
}

impl<T: ?Sized> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }
}

impl<T: ?Sized> SnapshotCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently published snapshot, if any.
    pub fn load(&self) -> Option<Arc<T>> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Replaces the published snapshot.
    pub fn publish(&self, next: Arc<T>) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(next);
    }

    /// Exclusive build permit. Hold it for the whole build-and-publish step.
    pub async fn build_permit(&self) -> MutexGuard<'_, ()> {
        self.build_lock.lock().await
    }
}
