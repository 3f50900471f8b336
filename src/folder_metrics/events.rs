//! Host lifecycle events and the publish/subscribe bus that carries them.
//!
//! The host framework fires two flavours of "content loaded": an early one
//! scoped to the page root, and the canonical one scoped to the child
//! collection container. Both travel over the same [`EventBus`].

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast;

/// Presentation of the collection currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    /// Miller-column browser. Shows no metrics.
    Column,
    /// Table rows.
    List,
    /// Card grid.
    Card,
}

impl LayoutMode {
    /// The host's `layoutId` for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Column => "column",
            LayoutMode::List => "list",
            LayoutMode::Card => "card",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "column" => Ok(LayoutMode::Column),
            "list" => Ok(LayoutMode::List),
            "card" => Ok(LayoutMode::Card),
            other => Err(other.to_string()),
        }
    }
}

/// Layout descriptor attached to the collection container by the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LayoutDescriptor {
    /// Host layout name: `column`, `list` or `card`.
    #[serde(rename = "layoutId")]
    pub layout_id: String,
}

impl LayoutDescriptor {
    /// Descriptor for the given layout name.
    pub fn new(layout_id: impl Into<String>) -> Self {
        Self {
            layout_id: layout_id.into(),
        }
    }
}

/// The child-collection container a canonical trigger is scoped to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionContainer {
    /// Path of the folder whose children are displayed.
    pub collection_id: Option<String>,
    /// Active layout, if the host attached one.
    pub layout: Option<LayoutDescriptor>,
}

impl CollectionContainer {
    /// Container for `collection_id` shown in `layout`.
    pub fn new(collection_id: impl Into<String>, layout: LayoutMode) -> Self {
        Self {
            collection_id: Some(collection_id.into()),
            layout: Some(LayoutDescriptor::new(layout.as_str())),
        }
    }
}

/// Page root carried by the early lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootContainer {
    /// The child-collection container, once the host has rendered one.
    pub child_collection: Option<CollectionContainer>,
}

/// Lifecycle events consumed (and, once, emitted) by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Early, ambiguous "content loaded" scoped to the page root.
    EarlyContentLoaded(RootContainer),
    /// Canonical "content loaded" scoped to the child collection.
    ContentLoaded(CollectionContainer),
}

/// Broadcast bus for lifecycle events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a bus holding up to `buffer_size` undelivered events.
    pub fn new(buffer_size: usize) -> (Self, broadcast::Receiver<LifecycleEvent>) {
        let (sender, receiver) = broadcast::channel(buffer_size);
        (Self { sender }, receiver)
    }

    /// Publish an event. Returns the number of subscribers that will see it.
    pub fn publish(&self, event: LifecycleEvent) -> usize {
        match self.sender.send(event) {
            Ok(count) => count,
            Err(e) => {
                tracing::debug!("No subscribers for lifecycle event {:?}", e.0);
                0
            }
        }
    }

    /// Subscribe a new listener.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}
