//! Seam to the routing layer. The client only needs to know where the user is
//! and how to send them to the login surface; everything else about routing
//! lives with the application.

use std::sync::{Mutex, PoisonError};
use tracing::info;

pub trait Navigator: Send + Sync {
    /// Path of the current location, e.g. `/dashboard/escrows`.
    fn current_path(&self) -> String;

    /// Hard navigation to `path`.
    fn navigate(&self, path: &str);
}

/// In-memory location history, for headless front ends and tests.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn new(initial_path: &str) -> Self {
        Self {
            history: Mutex::new(vec![initial_path.to_string()]),
        }
    }

    /// Every location visited, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of navigations performed since construction.
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.history().len().saturating_sub(1)
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn navigate(&self, path: &str) {
        info!(path, "navigating");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
