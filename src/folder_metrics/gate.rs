//! Per-trigger enablement check.
//!
//! Evaluated fresh on every canonical trigger; nothing here is cached. A
//! skip is ordinary control flow, not an error.

use crate::folder_metrics::events::{CollectionContainer, LayoutMode};
use crate::ui::CollectionView;

/// Why a trigger did not start a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The host reports the metrics column as hidden.
    MetricsColumnHidden,
    /// The trigger carries no layout descriptor.
    MissingLayout,
    /// The layout descriptor names a layout we do not know.
    UnknownLayout(String),
    /// Column layout shows no metrics.
    ColumnLayout,
    /// No collection path could be resolved from the trigger.
    MissingCollectionPath,
}

/// A trigger that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePass {
    /// Resolved layout, list or card.
    pub mode: LayoutMode,
    /// Folder to fetch metrics for.
    pub collection_path: String,
}

/// Decides whether a trigger runs the fetch and render pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureGate;

impl FeatureGate {
    /// Check a trigger against the current view.
    pub fn evaluate(
        view: &CollectionView,
        trigger: &CollectionContainer,
    ) -> Result<GatePass, SkipReason> {
        if view.metrics_column_hidden() {
            return Err(SkipReason::MetricsColumnHidden);
        }

        let layout = trigger
            .layout
            .as_ref()
            .filter(|layout| !layout.layout_id.is_empty())
            .ok_or(SkipReason::MissingLayout)?;

        let mode = layout
            .layout_id
            .parse::<LayoutMode>()
            .map_err(SkipReason::UnknownLayout)?;

        if mode == LayoutMode::Column {
            return Err(SkipReason::ColumnLayout);
        }

        let collection_path = trigger
            .collection_id
            .as_deref()
            .filter(|path| !path.is_empty())
            .ok_or(SkipReason::MissingCollectionPath)?
            .to_string();

        Ok(GatePass {
            mode,
            collection_path,
        })
    }
}
