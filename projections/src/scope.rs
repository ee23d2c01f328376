//! View scopes: discard results that arrive after the user navigated away.
//!
//! Requests are never cancelled. Instead each load takes a [`Visit`] from the
//! view's [`ViewScope`]; leaving the view (or starting a newer load) advances
//! the scope's generation, and a load whose visit is no longer current drops
//! its results instead of publishing them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation counter shared between a view and the navigation shell.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    generation: Arc<AtomicU64>,
}

impl ViewScope {
    /// A fresh scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a visit, superseding every earlier one.
    #[must_use]
    pub fn enter(&self) -> Visit {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        Visit {
            generation,
            scope: Arc::clone(&self.generation),
        }
    }

    /// Leave the view; outstanding visits become stale.
    pub fn leave(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// One load's claim on a view.
#[derive(Debug, Clone)]
pub struct Visit {
    generation: u64,
    scope: Arc<AtomicU64>,
}

impl Visit {
    /// Whether results of this load may still be published.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.scope.load(Ordering::Acquire) == self.generation
    }
}
