//! Process-wide count of open guestfish sessions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

static GLOBAL_COUNTER: OnceLock<SessionCounter> = OnceLock::new();

/// Shared counter of open sessions
///
/// Incremented when a manager opens a session and decremented on confirmed
/// close. Diagnostics only: a non-zero value at exit points to a leak.
/// Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct SessionCounter {
    count: Arc<AtomicUsize>,
}

impl SessionCounter {
    /// Creates an isolated counter starting at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide counter, created on first use and never reset
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_COUNTER.get_or_init(Self::new).clone()
    }

    /// Current number of open sessions
    #[must_use]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Records an opened session and returns the new count
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records a closed session and returns the new count; never goes below zero
    pub fn decrement(&self) -> usize {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    /// Returns true if both handles share the same count
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.count, &other.count)
    }
}
