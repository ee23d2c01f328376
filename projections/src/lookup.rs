//! Per-lookup state of a dependent fetch.

use ticketdesk_core::classify::ClassifyContext;
use ticketdesk_core::error::{ClassifiedError, ServiceError};

/// Outcome of one dependent fetch, carried explicitly rather than inferred
/// from an absent value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The record never asked for this value
    NotRequested,
    /// Requested, no answer yet
    Pending,
    /// Fetched successfully
    Loaded(T),
    /// Fetch failed
    Failed(ClassifiedError),
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self::NotRequested
    }
}

impl<T> Lookup<T> {
    /// Settle a lookup from a service result, classifying failures.
    #[must_use]
    pub fn settle(result: Result<T, ServiceError>, context: &ClassifyContext<'_>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e.classify(context)),
        }
    }

    /// The loaded value.
    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// The failure, when the fetch failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether the lookup still awaits an answer.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}
