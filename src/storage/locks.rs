//! Per-entity locking
//!
//! Mutations of one transaction or proposal are serialized by a lock keyed
//! on its id; unrelated entities never contend. An entry lives only while
//! someone holds or waits on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock table addressed by entity id
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`
    pub async fn lock(&self, id: &str) -> KeyedGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        KeyedGuard {
            guard: Some(lock.lock_owned().await),
            locks: self,
            id: id.to_string(),
        }
    }

    /// Drop the entry for `id` if nobody holds or waits on it
    pub fn forget(&self, id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one id; releasing it drops the table entry when idle
pub struct KeyedGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a KeyedLocks,
    id: String,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.forget(&self.id);
    }
}
