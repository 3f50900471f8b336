//! UI-side model and renderers.
//!
//! This module provides the typed view of the host's collection and the
//! renderers that merge metrics into it.

pub mod collection_view;
pub mod format;
pub mod renderer;

pub use collection_view::{
    CardNode, CollectionView, HeaderColumn, ItemDescriptor, ItemKind, TableCell, METRICS_COLUMN,
};
pub use format::{format_count, format_size};
pub use renderer::{
    CardRenderer, ItemOutcome, ItemRenderer, LayoutDispatcher, ListRenderer, RenderSummary,
};
