//! Application orchestration layer for Bookclub.

pub mod loaders;
pub mod messages;
pub mod reconcile;
pub mod reports;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use loaders::{CatalogSearch, ReportsSnapshot, SourceFailure, load_reports, search_catalog};
pub use reconcile::{AppError, LoadedStates, Reconciler, find, merge, require_session};

/// Marks whether the view that started a load still wants its result.
/// Clones share the flag.
#[derive(Debug, Clone)]
pub struct ActiveFlag(Arc<AtomicBool>);

impl Default for ActiveFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn deactivate(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Awaits `fut` and returns its output only if the flag is still active
    /// once it settles.
    pub async fn settle<F: Future>(&self, fut: F) -> Option<F::Output> {
        let output = fut.await;
        if self.is_active() {
            Some(output)
        } else {
            tracing::debug!("discarding result for inactive view");
            None
        }
    }

    /// Writes `value` into `slot` unless the flag was cleared.
    pub fn apply<T>(&self, slot: &mut T, value: T) -> bool {
        if self.is_active() {
            *slot = value;
            true
        } else {
            false
        }
    }
}
