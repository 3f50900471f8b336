//! One-shot arbitration of the initial-load race.
//!
//! On first page load the host may fire the early, root-scoped "content
//! loaded" event without ever firing the canonical one. The debouncer turns
//! the first early event that actually finds a child collection into a single
//! canonical trigger, and ignores everything after that.

use crate::folder_metrics::events::{CollectionContainer, RootContainer};

/// Session-scoped state of the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitState {
    /// No canonical trigger has been synthesized yet.
    #[default]
    AwaitingFirstLoad,
    /// A trigger was synthesized. Terminal.
    Settled,
}

/// Converts the first qualifying early event into a canonical trigger.
#[derive(Debug, Default)]
pub struct InitDebouncer {
    state: InitState,
}

impl InitDebouncer {
    /// Create a debouncer owning the given session state.
    pub fn new(state: InitState) -> Self {
        Self { state }
    }

    /// Current session state.
    pub fn state(&self) -> InitState {
        self.state
    }

    /// Observe an early lifecycle event.
    ///
    /// Returns the container to fire the canonical trigger on, at most once
    /// per debouncer. A root with no child collection leaves the state
    /// untouched so a later event can still settle it.
    pub fn observe(&mut self, root: &RootContainer) -> Option<CollectionContainer> {
        if self.state == InitState::Settled {
            return None;
        }

        let container = root.child_collection.as_ref()?;

        self.state = InitState::Settled;
        tracing::debug!(
            "Initial load settled, synthesizing trigger for {:?}",
            container.collection_id
        );

        Some(container.clone())
    }
}
