//! Folder Metrics
//!
//! This crate merges server-computed folder metrics (asset count and total
//! size) into a collection view that the host console has already rendered,
//! in either list or card layout.
//!
//! ## Pipeline
//!
//! ```text
//! early "content loaded" (root)     canonical "content loaded" (collection)
//!        ↓                                   │
//! InitDebouncer (fires at most once)         │
//!        ↓                                   ↓
//!        └──────────────→ EventBus ←─────────┘
//!                            ↓
//! FeatureGate (column visible? layout list/card? path resolvable?)
//!                            ↓
//! MetricsSource::fetch("{path}.size.json") [async, generation stamped]
//!                            ↓
//! LayoutDispatcher → ListRenderer | CardRenderer
//!                            ↓
//! CollectionView augmented under one write lock
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use folder_metrics::prelude::*;
//! use std::sync::Arc;
//! use tokio::sync::RwLock;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let view = Arc::new(RwLock::new(CollectionView::default()));
//!     let (bus, _rx) = EventBus::new(64);
//!
//!     let (pipeline, _listener) = folder_metrics::start(
//!         Arc::clone(&view),
//!         FetcherConfig::new("http://localhost:4502"),
//!         &bus,
//!     )?;
//!
//!     bus.publish(LifecycleEvent::ContentLoaded(CollectionContainer::new(
//!         "/content/dam/we-retail",
//!         LayoutMode::List,
//!     )));
//!
//!     let _ = pipeline.generation();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`folder_metrics`]: events, debouncing, gating, fetching, the pipeline
//! - [`ui`]: the collection view model, formatting and renderers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod folder_metrics;
pub mod ui;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Re-exports for convenience.
pub mod prelude {
    pub use crate::folder_metrics::{
        CollectionContainer, EventBus, FeatureGate, FetchError, FetcherConfig, HttpMetricsFetcher,
        InitDebouncer, InitState, LayoutMode, LifecycleEvent, MetricsIndex, MetricsListener,
        MetricsPipeline, MetricsPipelineBuilder, MetricsRecord, MetricsSource, PassOutcome,
        RootContainer, SkipReason,
    };
    pub use crate::ui::{
        format_size, CollectionView, HeaderColumn, ItemDescriptor, ItemKind, LayoutDispatcher,
        RenderSummary, TableCell, METRICS_COLUMN,
    };
}

/// Wire an HTTP-backed pipeline to `bus` for a fresh page session.
///
/// Failed fetches are logged; use [`folder_metrics::MetricsPipelineBuilder`]
/// directly to attach a failure callback.
pub fn start(
    view: Arc<RwLock<ui::CollectionView>>,
    config: folder_metrics::FetcherConfig,
    bus: &folder_metrics::EventBus,
) -> Result<
    (folder_metrics::MetricsPipeline, folder_metrics::MetricsListener),
    folder_metrics::FetchError,
> {
    let fetcher = folder_metrics::HttpMetricsFetcher::new(config)?;
    let pipeline = folder_metrics::MetricsPipelineBuilder::new(view, Arc::new(fetcher)).build();
    let listener = pipeline.spawn_listener(
        bus,
        folder_metrics::InitDebouncer::new(folder_metrics::InitState::AwaitingFirstLoad),
    );

    Ok((pipeline, listener))
}
