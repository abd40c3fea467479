//! The capability table.
//!
//! A capability family is a conceptual trait a resource kind may or may not
//! implement (listable, creatable, subscribable, ...). Each family brings a
//! fixed, ordered list of [`Capability`] entries, and each entry names the
//! operation [`Selector`] that carries it out.
//!
//! The table is pure data. The order of [`CAPABILITY_TABLE`] is the order in
//! which actions appear in menus, so adding, removing or moving an entry here
//! changes the operator-visible surface without touching the catalog builder
//! or the handler registry.

use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Selector
// ============================================================================

/// Stable identifier of an operation, shared by every node that exposes it.
///
/// The selector is the accessible name of the underlying operation and is
/// used to look up both the capability definition and the handler that
/// collects its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector(&'static str);

impl Selector {
    /// Fetch every item of a collection.
    pub const LIST: Selector = Selector("list");
    /// Fetch one item (by ID, or the single object of an ID-less manager).
    pub const GET: Selector = Selector("get");
    /// Re-read the object from the remote service.
    pub const REFRESH: Selector = Selector("refresh");
    /// Create a new item from a payload.
    pub const CREATE: Selector = Selector("create");
    /// Update an existing item from a payload.
    pub const UPDATE: Selector = Selector("update");
    /// Set a key to a value.
    pub const SET: Selector = Selector("set");
    /// Delete an item (or the object itself).
    pub const DELETE: Selector = Selector("delete");
    /// Persist pending changes of an object.
    pub const SAVE: Selector = Selector("save");
    /// Spam-check detail of the object's author.
    pub const USER_AGENT_DETAIL: Selector = Selector("user_agent_detail");
    /// Approve an access request.
    pub const APPROVE: Selector = Selector("approve");
    /// Download raw content.
    pub const DOWNLOAD: Selector = Selector("download");
    /// Subscribe to notifications.
    pub const SUBSCRIBE: Selector = Selector("subscribe");
    /// Unsubscribe from notifications.
    pub const UNSUBSCRIBE: Selector = Selector("unsubscribe");
    /// Create a todo for the current user.
    pub const TODO: Selector = Selector("todo");
    /// Read time-tracking statistics.
    pub const TIME_STATS: Selector = Selector("time_stats");
    /// Set a time estimate.
    pub const TIME_ESTIMATE: Selector = Selector("time_estimate");
    /// Reset the time estimate.
    pub const RESET_TIME_ESTIMATE: Selector = Selector("reset_time_estimate");
    /// Add spent time.
    pub const ADD_SPENT_TIME: Selector = Selector("add_spent_time");
    /// Reset spent time.
    pub const RESET_SPENT_TIME: Selector = Selector("reset_spent_time");
    /// List participants.
    pub const PARTICIPANTS: Selector = Selector("participants");
    /// Render a badge preview.
    pub const RENDER: Selector = Selector("render");

    /// Create a selector for an operation outside the standard table.
    pub const fn custom(name: &'static str) -> Self {
        Self(name)
    }

    /// The operation name.
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// ============================================================================
// Family
// ============================================================================

/// A capability family. Variant order is the declaration order of the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Collection can be listed.
    List,
    /// Collection items can be fetched by ID.
    Get,
    /// Manager exposes a single object without an ID.
    GetWithoutId,
    /// Object can be re-read.
    Refresh,
    /// Composite: List + Get.
    Retrieve,
    /// Collection accepts new items.
    Create,
    /// Collection items can be updated.
    Update,
    /// Collection supports key/value assignment.
    Set,
    /// Collection items can be deleted by ID.
    Delete,
    /// Composite: Retrieve + Create + Update + Delete.
    Crud,
    /// Composite: Retrieve + Create + Delete.
    NoUpdate,
    /// Object can persist pending changes.
    Save,
    /// Object can delete itself.
    ObjectDelete,
    /// Object exposes user agent detail.
    UserAgentDetail,
    /// Object is an approvable access request.
    AccessRequest,
    /// Object has downloadable content.
    Download,
    /// Object supports notification subscriptions.
    Subscribable,
    /// Object can be added to the todo list.
    Todo,
    /// Object supports time tracking.
    TimeTracking,
    /// Object has participants.
    Participants,
    /// Collection can render badges.
    BadgeRender,
}

impl Family {
    /// Families this family is composed of. Empty for leaf families.
    pub fn includes(self) -> &'static [Family] {
        match self {
            Family::Retrieve => &[Family::List, Family::Get],
            Family::Crud => &[Family::Retrieve, Family::Create, Family::Update, Family::Delete],
            Family::NoUpdate => &[Family::Retrieve, Family::Create, Family::Delete],
            _ => &[],
        }
    }

    /// Whether the family only exists to be decomposed.
    pub fn is_composite(self) -> bool {
        !self.includes().is_empty()
    }

    /// Name of the family as shown when qualifying duplicate labels.
    pub fn name(self) -> &'static str {
        match self {
            Family::List => "List",
            Family::Get => "Get",
            Family::GetWithoutId => "GetWithoutId",
            Family::Refresh => "Refresh",
            Family::Retrieve => "Retrieve",
            Family::Create => "Create",
            Family::Update => "Update",
            Family::Set => "Set",
            Family::Delete => "Delete",
            Family::Crud => "Crud",
            Family::NoUpdate => "NoUpdate",
            Family::Save => "Save",
            Family::ObjectDelete => "ObjectDelete",
            Family::UserAgentDetail => "UserAgentDetail",
            Family::AccessRequest => "AccessRequest",
            Family::Download => "Download",
            Family::Subscribable => "Subscribable",
            Family::Todo => "Todo",
            Family::TimeTracking => "TimeTracking",
            Family::Participants => "Participants",
            Family::BadgeRender => "BadgeRender",
        }
    }
}

// ============================================================================
// Capability table
// ============================================================================

/// One potential operation a family brings in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capability {
    /// Stable key, unique across the table.
    pub key: &'static str,
    /// Menu label.
    pub label: &'static str,
    /// Operation that carries it out.
    pub selector: Selector,
}

/// A family together with the capabilities it declares.
#[derive(Clone, Copy, Debug)]
pub struct FamilyEntry {
    /// The family.
    pub family: Family,
    /// Declared capabilities, in menu order.
    pub capabilities: &'static [Capability],
}

const fn cap(key: &'static str, label: &'static str, selector: Selector) -> Capability {
    Capability {
        key,
        label,
        selector,
    }
}

/// The full capability table in declaration order.
pub static CAPABILITY_TABLE: &[FamilyEntry] = &[
    FamilyEntry {
        family: Family::List,
        capabilities: &[cap("list", "List all items", Selector::LIST)],
    },
    FamilyEntry {
        family: Family::Get,
        capabilities: &[cap("get", "Get by ID", Selector::GET)],
    },
    FamilyEntry {
        family: Family::GetWithoutId,
        capabilities: &[cap("get-without-id", "Get single object", Selector::GET)],
    },
    FamilyEntry {
        family: Family::Refresh,
        capabilities: &[cap("refresh", "Refresh resource", Selector::REFRESH)],
    },
    FamilyEntry {
        family: Family::Retrieve,
        capabilities: &[],
    },
    FamilyEntry {
        family: Family::Create,
        capabilities: &[cap("create", "Create new item", Selector::CREATE)],
    },
    FamilyEntry {
        family: Family::Update,
        capabilities: &[cap("update", "Update existing", Selector::UPDATE)],
    },
    FamilyEntry {
        family: Family::Set,
        capabilities: &[cap("set", "Set attribute", Selector::SET)],
    },
    FamilyEntry {
        family: Family::Delete,
        capabilities: &[cap("delete", "Delete item", Selector::DELETE)],
    },
    FamilyEntry {
        family: Family::Crud,
        capabilities: &[],
    },
    FamilyEntry {
        family: Family::NoUpdate,
        capabilities: &[],
    },
    FamilyEntry {
        family: Family::Save,
        capabilities: &[cap("save", "Save changes", Selector::SAVE)],
    },
    FamilyEntry {
        family: Family::ObjectDelete,
        capabilities: &[cap("delete-object", "Delete object", Selector::DELETE)],
    },
    FamilyEntry {
        family: Family::UserAgentDetail,
        capabilities: &[cap(
            "user-agent-detail",
            "User agent detail",
            Selector::USER_AGENT_DETAIL,
        )],
    },
    FamilyEntry {
        family: Family::AccessRequest,
        capabilities: &[cap("approve", "Approve access req.", Selector::APPROVE)],
    },
    FamilyEntry {
        family: Family::Download,
        capabilities: &[cap("download", "Download resource", Selector::DOWNLOAD)],
    },
    FamilyEntry {
        family: Family::Subscribable,
        capabilities: &[
            cap("subscribe", "Subscribe", Selector::SUBSCRIBE),
            cap("unsubscribe", "Unsubscribe", Selector::UNSUBSCRIBE),
        ],
    },
    FamilyEntry {
        family: Family::Todo,
        capabilities: &[cap("todo", "Create todo", Selector::TODO)],
    },
    FamilyEntry {
        family: Family::TimeTracking,
        capabilities: &[
            cap("time-stats", "Get time stats", Selector::TIME_STATS),
            cap("set-time-estimate", "Set time estimate", Selector::TIME_ESTIMATE),
            cap(
                "reset-time-estimate",
                "Reset time estimate",
                Selector::RESET_TIME_ESTIMATE,
            ),
            cap("add-spent-time", "Add spent time", Selector::ADD_SPENT_TIME),
            cap("reset-spent-time", "Reset spent time", Selector::RESET_SPENT_TIME),
        ],
    },
    FamilyEntry {
        family: Family::Participants,
        capabilities: &[cap("participants", "List participants", Selector::PARTICIPANTS)],
    },
    FamilyEntry {
        family: Family::BadgeRender,
        capabilities: &[cap("render", "Render badge", Selector::RENDER)],
    },
];

/// Capabilities declared directly by a family.
pub fn capabilities_of(family: Family) -> &'static [Capability] {
    CAPABILITY_TABLE
        .iter()
        .find(|entry| entry.family == family)
        .map(|entry| entry.capabilities)
        .unwrap_or(&[])
}

/// Expand declared families into the full family ancestry.
///
/// Composite families are kept in the set (they are part of the ancestry)
/// and their components are added recursively. The set iterates in
/// declaration order.
pub fn ancestry(declared: &[Family]) -> BTreeSet<Family> {
    let mut out = BTreeSet::new();
    let mut pending: Vec<Family> = declared.to_vec();
    while let Some(family) = pending.pop() {
        if out.insert(family) {
            pending.extend_from_slice(family.includes());
        }
    }
    out
}
