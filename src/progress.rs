//! Completion reporting for row-parallel operations.
//!
//! [`Progress::begin`] hands out a [`ProgressHandle`] scoped to one
//! operation: worker threads tick it once per completed row and readers
//! holding the handle see only that operation's completion. A process-wide
//! slot additionally remembers the most recently begun operation so the
//! boundary layer can poll [`Progress::current`] without holding a handle;
//! concurrent operations keep independent counters and the global query
//! simply reports the newest one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

static CURRENT: Mutex<Option<ProgressHandle>> = Mutex::new(None);

#[derive(Debug)]
struct State {
    done: AtomicUsize,
    total: usize,
}

/// Shared per-operation completion counter. Cheap to clone; clones tick
/// the same counter.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    state: Arc<State>,
}

impl ProgressHandle {
    /// Record one completed row. Safe to call from any worker thread.
    #[inline]
    pub fn row_done(&self) {
        self.state.done.fetch_add(1, Ordering::Relaxed);
    }

    /// Rounded completion percentage, or `None` when the operation has no
    /// rows to count.
    pub fn percent(&self) -> Option<u32> {
        if self.state.total == 0 {
            return None;
        }
        let done = self.state.done.load(Ordering::Relaxed).min(self.state.total);
        Some(((done as f64 / self.state.total as f64) * 100.0).round() as u32)
    }

    /// Mark the operation finished: the global slot goes back to idle if
    /// it still points at this operation.
    pub fn finish(&self) {
        let mut current = CURRENT.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(active) = current.as_ref() {
            if Arc::ptr_eq(&active.state, &self.state) {
                *current = None;
            }
        }
    }
}

pub struct Progress;

impl Progress {
    /// Start a new operation of `total_rows` rows and make it the one
    /// reported by [`Progress::current`].
    pub fn begin(total_rows: usize) -> ProgressHandle {
        let handle = ProgressHandle {
            state: Arc::new(State {
                done: AtomicUsize::new(0),
                total: total_rows,
            }),
        };
        let mut current = CURRENT.lock().unwrap_or_else(|e| e.into_inner());
        *current = Some(handle.clone());
        handle
    }

    /// Completion of the most recently begun operation, or `None` when
    /// idle.
    pub fn current() -> Option<u32> {
        let current = CURRENT.lock().unwrap_or_else(|e| e.into_inner());
        current.as_ref().and_then(|h| h.percent())
    }
}
