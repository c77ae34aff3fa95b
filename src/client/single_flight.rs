//! Collapses concurrent calls for the same key into one in-flight operation.
//!
//! The first caller for a key runs the operation; callers arriving while it is
//! pending await the same outcome instead of starting their own. Once the
//! operation settles the slot is released, so the next call starts a fresh
//! flight. If the running caller is dropped before the operation finishes, one
//! of the waiters takes over and runs its own operation.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::OnceCell;
use tracing::trace;

#[derive(Debug)]
pub struct SingleFlight<T> {
    slots: Mutex<HashMap<&'static str, Arc<OnceCell<T>>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> SingleFlight<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `operation` unless a flight for `key` is already pending, in which
    /// case the pending outcome is awaited and cloned.
    pub async fn run<F, Fut>(&self, key: &'static str, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = self.slot(key);
        let value = cell.get_or_init(operation).await.clone();
        self.release(key, &cell);
        value
    }

    /// True while a flight for `key` has not settled.
    #[cfg(test)]
    fn in_flight(&self, key: &'static str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|cell| !cell.initialized())
    }

    fn slot(&self, key: &'static str) -> Arc<OnceCell<T>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cell) = slots.get(key) {
            trace!(key, "joining in-flight operation");
            return Arc::clone(cell);
        }
        let cell = Arc::new(OnceCell::new());
        slots.insert(key, Arc::clone(&cell));
        cell
    }

    fn release(&self, key: &'static str, cell: &Arc<OnceCell<T>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell))
        {
            slots.remove(key);
        }
    }
}
