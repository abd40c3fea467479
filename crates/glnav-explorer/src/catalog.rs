//! Capability discovery.
//!
//! Builds the ordered action menu for a node from its declared capability
//! families. Families are expanded to their full ancestry and walked in
//! declaration order; a capability is offered only when the node actually
//! exposes the operation behind it.

use glnav_core::capability::{ancestry, capabilities_of};
use glnav_core::{ResourceNode, Selector};
use tracing::trace;

/// Label of the entry that lists a collection's items for drill-down.
pub const BROWSE_LABEL: &str = "Browse items";
/// Label of the terminal entry on every non-root node.
pub const BACK_LABEL: &str = "← Back";
/// Label of the terminal entry on the root node.
pub const QUIT_LABEL: &str = "Quit";

/// What selecting a catalog entry does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Run the operation named by the entry's selector.
    Action,
    /// List the collection's items and drill into one.
    Browse,
    /// Return to the parent node.
    Back,
    /// End the session.
    Quit,
}

/// One entry of an action catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionCatalogEntry {
    /// Menu label, unique within the catalog.
    pub label: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Operation behind an [`EntryKind::Action`] entry.
    pub selector: Option<Selector>,
}

impl ActionCatalogEntry {
    fn action(label: impl Into<String>, selector: Selector) -> Self {
        Self {
            label: label.into(),
            kind: EntryKind::Action,
            selector: Some(selector),
        }
    }

    fn special(label: &str, kind: EntryKind) -> Self {
        Self {
            label: label.to_string(),
            kind,
            selector: None,
        }
    }
}

/// Action entries for `node`, without browse or terminal entries.
///
/// Labels that repeat an earlier entry's label are qualified with the
/// family name, e.g. `Delete object (ObjectDelete)`.
pub fn build_actions(node: &ResourceNode) -> Vec<ActionCatalogEntry> {
    let Some(resource) = node.resource() else {
        return Vec::new();
    };
    let kind = resource.kind();

    let mut entries: Vec<ActionCatalogEntry> = Vec::new();
    for family in ancestry(kind.families) {
        for cap in capabilities_of(family) {
            if resource.operation(cap.selector).is_none() {
                trace!(kind = kind.name, capability = cap.key, "capability not exposed");
                continue;
            }
            let label = if entries.iter().any(|e| e.label == cap.label) {
                format!("{} ({})", cap.label, family.name())
            } else {
                cap.label.to_string()
            };
            entries.push(ActionCatalogEntry::action(label, cap.selector));
        }
    }
    entries
}

/// Whether `node` is a collection that can be listed.
pub fn can_browse(node: &ResourceNode) -> bool {
    node.as_collection()
        .is_some_and(|c| c.operation(Selector::LIST).is_some())
}

/// Full catalog for `node`: actions, then `Browse items` when the node can
/// be listed, then exactly one terminal entry (`Quit` at the root,
/// `← Back` elsewhere).
pub fn build_catalog(node: &ResourceNode) -> Vec<ActionCatalogEntry> {
    let mut entries = build_actions(node);
    if can_browse(node) {
        entries.push(ActionCatalogEntry::special(BROWSE_LABEL, EntryKind::Browse));
    }
    if node.is_root() {
        entries.push(ActionCatalogEntry::special(QUIT_LABEL, EntryKind::Quit));
    } else {
        entries.push(ActionCatalogEntry::special(BACK_LABEL, EntryKind::Back));
    }
    entries
}
