//! Shared snapshot of the latest value of every field.
//!
//! Producers never wait on the lock: `try_merge` hands the update back on
//! contention so the caller can retry later. The dirty flag lives under the
//! same mutex as the map, and a condition variable wakes the publisher when
//! it becomes set.

use std::collections::BTreeMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use contracts::{Field, PublishedState, Reading, Stamped};

/// Set of whole-field replacements applied under one lock acquisition
pub type FieldUpdate = BTreeMap<Field, Stamped>;

#[derive(Debug, Default)]
struct SnapshotInner {
    fields: BTreeMap<Field, Stamped>,
    dirty: bool,
}

/// Multi-producer, single-consumer latest-value map
#[derive(Debug, Default)]
pub struct Snapshot {
    inner: Mutex<SnapshotInner>,
    dirty_signal: Condvar,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect decoded readings into an update (later readings win)
    pub fn update_from(readings: impl IntoIterator<Item = Reading>) -> FieldUpdate {
        readings.into_iter().map(Reading::into_entry).collect()
    }

    /// Apply an update without blocking.
    ///
    /// Returns `Ok(true)` if any field changed, `Ok(false)` if every pair was
    /// already present, and `Err(update)` if the lock was busy.
    pub fn try_merge(&self, update: FieldUpdate) -> Result<bool, FieldUpdate> {
        let Some(mut inner) = self.try_lock() else {
            return Err(update);
        };

        let mut changed = false;
        for (field, value) in update {
            if inner.fields.get(&field) != Some(&value) {
                inner.fields.insert(field, value);
                changed = true;
            }
        }

        if changed {
            inner.dirty = true;
            self.dirty_signal.notify_one();
        }
        Ok(changed)
    }

    /// Take a full copy if anything changed since the last drain.
    ///
    /// Returns `None` when clean or when the lock is busy.
    pub fn drain_if_dirty(&self) -> Option<PublishedState> {
        let mut inner = self.try_lock()?;
        if !inner.dirty {
            return None;
        }
        inner.dirty = false;
        Some(PublishedState::new(inner.fields.clone()))
    }

    /// Block up to `timeout` until the snapshot is dirty.
    pub fn wait_dirty(&self, timeout: Duration) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (inner, _) = self
            .dirty_signal
            .wait_timeout_while(inner, timeout, |inner| !inner.dirty)
            .unwrap_or_else(PoisonError::into_inner);
        inner.dirty
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Number of distinct fields observed so far
    pub fn len(&self) -> usize {
        self.lock().fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, SnapshotInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock(&self) -> Option<MutexGuard<'_, SnapshotInner>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Hold the lock to simulate a busy publisher
    #[cfg(test)]
    pub(crate) fn hold_lock(&self) -> impl Drop + '_ {
        self.lock()
    }
}
