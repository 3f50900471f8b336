//! Per-layout renderers and the dispatcher that drives them.

use crate::folder_metrics::{LayoutMode, MetricsIndex};
use crate::ui::collection_view::{CollectionView, ItemDescriptor, ItemKind, TableCell};
use crate::ui::format::{format_count, format_size};

/// What a renderer did to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Metrics were written into the item.
    Augmented,
    /// An empty cell was inserted to keep columns aligned.
    Placeholder,
    /// The item was left as is.
    Untouched,
    /// The anchor the renderer needs is absent. The item was skipped.
    AnchorMissing,
}

/// Augments a single item with metrics.
pub trait ItemRenderer: Send + Sync {
    /// Render metrics from `index` into `item`.
    fn render(&self, index: &MetricsIndex, item: &mut ItemDescriptor) -> ItemOutcome;
}

/// List layout: one extra cell per row, right before the drag handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListRenderer;

impl ItemRenderer for ListRenderer {
    fn render(&self, index: &MetricsIndex, item: &mut ItemDescriptor) -> ItemOutcome {
        let Some(anchor) = item.drag_handle_index() else {
            tracing::debug!("No drag handle cell for {}, skipping", item.path);
            return ItemOutcome::AnchorMissing;
        };

        if item.kind != ItemKind::Directory {
            item.cells.insert(anchor, TableCell::default());
            return ItemOutcome::Placeholder;
        }

        let record = index.get(&item.path);
        let text = format!(
            "Total Count: {}, Size: {}",
            format_count(record),
            format_size(record)
        );
        item.cells.insert(anchor, TableCell::text(text));

        ItemOutcome::Augmented
    }
}

/// Card layout: directory card titles gain a metrics suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct CardRenderer;

impl ItemRenderer for CardRenderer {
    fn render(&self, index: &MetricsIndex, item: &mut ItemDescriptor) -> ItemOutcome {
        let Some(card) = item.card.as_mut() else {
            return ItemOutcome::Untouched;
        };

        if card.meta_kind != Some(ItemKind::Directory) {
            return ItemOutcome::Untouched;
        }

        let Some(title) = card.title.as_mut() else {
            tracing::debug!("No card title for {}, skipping", item.path);
            return ItemOutcome::AnchorMissing;
        };

        let record = index.get(&item.path);
        title.push_str(&format!(
            " - Assets: {}, {}",
            format_count(record),
            format_size(record)
        ));

        ItemOutcome::Augmented
    }
}

/// Counts of what one render pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    /// Items that received metrics.
    pub augmented: usize,
    /// File rows that received an empty cell.
    pub placeholders: usize,
    /// Items left unchanged.
    pub untouched: usize,
    /// Items skipped for a missing anchor.
    pub anchors_missing: usize,
    /// Whether the orphaned reorder header column was removed.
    pub header_removed: bool,
}

impl RenderSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Augmented => self.augmented += 1,
            ItemOutcome::Placeholder => self.placeholders += 1,
            ItemOutcome::Untouched => self.untouched += 1,
            ItemOutcome::AnchorMissing => self.anchors_missing += 1,
        }
    }

    /// Number of items the pass visited.
    pub fn items(&self) -> usize {
        self.augmented + self.placeholders + self.untouched + self.anchors_missing
    }
}

/// Routes a fetched index to the renderer of the active layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutDispatcher;

impl LayoutDispatcher {
    /// Renderer bound to `mode`. Column layout has none.
    pub fn renderer_for(mode: LayoutMode) -> Option<&'static dyn ItemRenderer> {
        match mode {
            LayoutMode::List => Some(&ListRenderer),
            LayoutMode::Card => Some(&CardRenderer),
            LayoutMode::Column => None,
        }
    }

    /// Render every displayed item, in display order.
    ///
    /// In list layout the reorder header column is dropped first when no drag
    /// handle is visible, since the metrics cell takes its place.
    pub fn dispatch(mode: LayoutMode, index: &MetricsIndex, view: &mut CollectionView) -> RenderSummary {
        let mut summary = RenderSummary::default();

        let Some(renderer) = Self::renderer_for(mode) else {
            return summary;
        };

        if mode == LayoutMode::List && !view.drag_handle_visible() {
            summary.header_removed = view.remove_trailing_header_column().is_some();
        }

        for item in view.items_mut() {
            summary.record(renderer.render(index, item));
        }

        tracing::debug!(
            "Rendered {} items in {} layout: {:?}",
            summary.items(),
            mode,
            summary
        );

        summary
    }
}
