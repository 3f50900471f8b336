//! Typed model of the collection the host has rendered.
//!
//! The host adapts its on-screen rows and cards into [`ItemDescriptor`]s and
//! applies whatever the renderers change back to its own widgets. Only the
//! anchors the renderers rely on are modelled: the table header, the
//! drag-handle cell of list rows, and the metadata kind and title of cards.

/// Name of the metrics column in the host's column configuration.
pub const METRICS_COLUMN: &str = "aemExtensionsAssetsCount";

/// Kind of an item as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A folder. Only folders show metrics.
    Directory,
    /// Anything else.
    File,
}

/// A column header in list layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderColumn {
    /// Column name in the host's column configuration.
    pub name: String,
    /// Whether the host hides the column.
    pub hidden: bool,
}

impl HeaderColumn {
    /// A visible column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hidden: false,
        }
    }

    /// A hidden column.
    pub fn hidden(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hidden: true,
        }
    }
}

/// A cell of a list row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    /// Cell content.
    pub text: String,
    /// Whether this cell holds the reorder drag handle.
    pub drag_handle: bool,
    /// Whether the cell is hidden.
    pub hidden: bool,
}

impl TableCell {
    /// A plain text cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The reorder drag-handle cell.
    pub fn drag_handle(hidden: bool) -> Self {
        Self {
            text: String::new(),
            drag_handle: true,
            hidden,
        }
    }
}

/// Card-layout anchors of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardNode {
    /// Kind reported by the card's nested metadata node.
    pub meta_kind: Option<ItemKind>,
    /// Card title content, `None` when the card has no title node.
    pub title: Option<String>,
}

/// One on-screen row or card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Path used to look the item up in the metrics index.
    pub path: String,
    /// Item type attribute of the row.
    pub kind: ItemKind,
    /// Row cells in list layout. Empty for cards.
    pub cells: Vec<TableCell>,
    /// Card anchors in card layout.
    pub card: Option<CardNode>,
}

impl ItemDescriptor {
    /// A list-layout row.
    pub fn list_row(path: impl Into<String>, kind: ItemKind, cells: Vec<TableCell>) -> Self {
        Self {
            path: path.into(),
            kind,
            cells,
            card: None,
        }
    }

    /// A card-layout card.
    pub fn card(path: impl Into<String>, meta_kind: ItemKind, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: meta_kind,
            cells: Vec::new(),
            card: Some(CardNode {
                meta_kind: Some(meta_kind),
                title: Some(title.into()),
            }),
        }
    }

    /// Position of the drag-handle cell in this row.
    pub fn drag_handle_index(&self) -> Option<usize> {
        self.cells.iter().position(|cell| cell.drag_handle)
    }

    /// Text of every cell, in order.
    pub fn cell_texts(&self) -> Vec<&str> {
        self.cells.iter().map(|cell| cell.text.as_str()).collect()
    }
}

/// The displayed collection: list header plus items in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionView {
    header: Vec<HeaderColumn>,
    items: Vec<ItemDescriptor>,
}

impl CollectionView {
    /// View with the given header and items in display order.
    pub fn new(header: Vec<HeaderColumn>, items: Vec<ItemDescriptor>) -> Self {
        Self { header, items }
    }

    /// List header columns. Empty in card layout.
    pub fn header(&self) -> &[HeaderColumn] {
        &self.header
    }

    /// Items in display order.
    pub fn items(&self) -> &[ItemDescriptor] {
        &self.items
    }

    /// Mutable items in display order.
    pub fn items_mut(&mut self) -> &mut [ItemDescriptor] {
        &mut self.items
    }

    /// Whether the host reports the metrics column as hidden.
    ///
    /// A view without that column (card layout has no table header) does not
    /// report it hidden.
    pub fn metrics_column_hidden(&self) -> bool {
        self.header
            .iter()
            .find(|column| column.name == METRICS_COLUMN)
            .map(|column| column.hidden)
            .unwrap_or(false)
    }

    /// Show or hide a header column by name. Returns false if it is absent.
    pub fn set_column_hidden(&mut self, name: &str, hidden: bool) -> bool {
        match self.header.iter_mut().find(|column| column.name == name) {
            Some(column) => {
                column.hidden = hidden;
                true
            }
            None => false,
        }
    }

    /// Whether the reorder affordance is visible.
    ///
    /// Decided by the first drag-handle cell in display order.
    pub fn drag_handle_visible(&self) -> bool {
        self.items
            .iter()
            .flat_map(|item| item.cells.iter())
            .find(|cell| cell.drag_handle)
            .map(|cell| !cell.hidden)
            .unwrap_or(false)
    }

    /// Remove the header column just before the last one.
    pub fn remove_trailing_header_column(&mut self) -> Option<HeaderColumn> {
        if self.header.len() < 2 {
            return None;
        }
        let index = self.header.len() - 2;
        Some(self.header.remove(index))
    }
}
