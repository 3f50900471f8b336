//! Folder metrics pipeline.
//!
//! This module provides:
//! - `record`: typed metrics records and the per-fetch index
//! - `fetcher`: the metrics source seam and its HTTP implementation
//! - `events`: host lifecycle events and the event bus
//! - `debounce`: one-shot arbitration of the initial-load race
//! - `gate`: per-trigger enablement check
//! - `model`: the pipeline tying gate, fetch and render together

pub mod debounce;
pub mod events;
pub mod fetcher;
pub mod gate;
pub mod model;
pub mod record;

pub use debounce::{InitDebouncer, InitState};
pub use events::{
    CollectionContainer, EventBus, LayoutDescriptor, LayoutMode, LifecycleEvent, RootContainer,
};
pub use fetcher::{
    metrics_endpoint, FetchError, FetcherConfig, HttpMetricsFetcher, MetricsSource, SIZE_SELECTOR,
};
pub use gate::{FeatureGate, GatePass, SkipReason};
pub use model::{
    FailureCallback, MetricsListener, MetricsPipeline, MetricsPipelineBuilder, PassOutcome,
};
pub use record::{IndexError, MetricsIndex, MetricsRecord, RecordError};
