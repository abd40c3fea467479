//! The resource graph seen by the explorer.
//!
//! A remote API is modelled as a tree of three node shapes:
//!
//! - the [`RemoteClient`] at the root, owning the top-level collections,
//! - [`Collection`]s, typed managers over objects of one resource kind,
//! - [`Object`]s, single resource instances owning nested collections.
//!
//! Collections and objects are both [`Resource`]s: they carry a
//! [`ResourceKind`] declaring their capability families, and answer
//! [`Resource::operation`] for the selectors they currently expose. Nodes are
//! shared through `Arc` and never hold a pointer to their parent node.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::capability::{Family, Selector};
use crate::operation::{Args, OperationDescriptor, Outcome};
use crate::{Error, Result};

// ============================================================================
// Record
// ============================================================================

/// Attributes that identify an item, most specific first. GitLab keys most
/// resources by `id`, project-scoped ones by `iid`, variables and custom
/// attributes by `key`, and some user listings by `username`.
pub const IDENTITY_KEYS: &[&str] = &["id", "iid", "key", "username"];

/// Attribute set of one remote object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an attribute map.
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// All attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Attribute by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Attribute rendered as text; numbers and strings only.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The `id` attribute as text.
    pub fn id(&self) -> Option<String> {
        self.text("id")
    }

    /// The first identifying attribute present, in [`IDENTITY_KEYS`] order.
    pub fn identity(&self) -> Option<String> {
        IDENTITY_KEYS.iter().find_map(|key| self.text(key))
    }

    /// `name`, falling back to `title`.
    pub fn display_name(&self) -> Option<String> {
        self.text("name").or_else(|| self.text("title"))
    }

    /// One menu line: `"<identity>\t<name-or-title>"`, empty parts when
    /// absent. Line breaks inside the name are flattened to spaces.
    pub fn menu_line(&self) -> String {
        let name = self.display_name().unwrap_or_default();
        format!(
            "{}\t{}",
            self.identity().unwrap_or_default(),
            name.replace(['\r', '\n'], " ")
        )
    }

    /// Attributes as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::invalid_data(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

// ============================================================================
// Resource kinds
// ============================================================================

/// Declared identity and capability families of a resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceKind {
    /// Concrete type name, e.g. `ProjectIssueManager`.
    pub name: &'static str,
    /// Declared families; composites are expanded by the catalog builder.
    pub families: &'static [Family],
}

impl ResourceKind {
    /// Create a kind descriptor.
    pub const fn new(name: &'static str, families: &'static [Family]) -> Self {
        Self { name, families }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Anything that exposes operations: collections and objects.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Declared kind of this resource.
    fn kind(&self) -> ResourceKind;

    /// The operation exposed under `selector` right now, if any.
    ///
    /// A family may declare a capability that a particular instance does
    /// not expose; callers must check here rather than trust the family.
    fn operation(&self, selector: Selector) -> Option<OperationDescriptor>;

    /// Invoke an exposed operation.
    async fn invoke(&self, selector: Selector, args: Args) -> Result<Outcome>;
}

/// The object a nested collection hangs off, with the collection it was
/// listed from.
#[derive(Clone)]
pub struct ParentContext {
    /// Attributes of the owning object.
    pub record: Record,
    /// Collection the owning object belongs to.
    pub origin: Arc<dyn Collection>,
}

/// A typed manager over objects of one resource kind.
#[async_trait]
pub trait Collection: Resource {
    /// Attribute name under its owner, e.g. `merge_requests`.
    fn attribute(&self) -> &str;

    /// Fetch every item, following all pages.
    async fn list_all(&self) -> Result<Vec<Arc<dyn Object>>>;

    /// The object this collection is nested under, if any.
    fn parent(&self) -> Option<ParentContext> {
        None
    }
}

/// One concrete resource instance.
pub trait Object: Resource {
    /// Current attributes. Reflects the latest `refresh`/`save`.
    fn record(&self) -> Record;

    /// Nested collections, in declaration order.
    fn collections(&self) -> Vec<Arc<dyn Collection>>;
}

/// The authenticated client at the root of the graph.
pub trait RemoteClient: Send + Sync {
    /// Display name of the root, e.g. `GitLab`.
    fn name(&self) -> &str;

    /// Top-level collections, in declaration order.
    fn collections(&self) -> Vec<Arc<dyn Collection>>;
}

// ============================================================================
// ResourceNode
// ============================================================================

/// A node of the resource graph the explorer is looking at.
#[derive(Clone)]
pub enum ResourceNode {
    /// The authenticated client.
    Root(Arc<dyn RemoteClient>),
    /// A collection.
    Collection(Arc<dyn Collection>),
    /// An object.
    Object(Arc<dyn Object>),
}

impl ResourceNode {
    /// The node as an operation-bearing resource; `None` for the root.
    pub fn resource(&self) -> Option<&dyn Resource> {
        match self {
            ResourceNode::Root(_) => None,
            ResourceNode::Collection(c) => Some(c.as_ref()),
            ResourceNode::Object(o) => Some(o.as_ref()),
        }
    }

    /// Concrete type name of the node.
    pub fn kind_name(&self) -> &str {
        match self {
            ResourceNode::Root(client) => client.name(),
            ResourceNode::Collection(c) => c.kind().name,
            ResourceNode::Object(o) => o.kind().name,
        }
    }

    /// Collections reachable one level down. Collections themselves have
    /// none; their children are objects reached by browsing.
    pub fn sub_collections(&self) -> Vec<Arc<dyn Collection>> {
        match self {
            ResourceNode::Root(client) => client.collections(),
            ResourceNode::Collection(_) => Vec::new(),
            ResourceNode::Object(o) => o.collections(),
        }
    }

    /// Whether the node is the root.
    pub fn is_root(&self) -> bool {
        matches!(self, ResourceNode::Root(_))
    }

    /// The node as a collection.
    pub fn as_collection(&self) -> Option<&Arc<dyn Collection>> {
        match self {
            ResourceNode::Collection(c) => Some(c),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceNode::Root(client) => write!(f, "Root({})", client.name()),
            ResourceNode::Collection(c) => write!(f, "Collection({})", c.kind().name),
            ResourceNode::Object(o) => write!(f, "Object({})", o.kind().name),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn test_menu_line_prefers_name() {
        let r = record(json!({"id": 2, "name": "B", "title": "ignored"}));
        assert_eq!(r.menu_line(), "2\tB");
    }

    #[test]
    fn test_menu_line_falls_back_to_title() {
        let r = record(json!({"id": "abc", "title": "Fix login"}));
        assert_eq!(r.menu_line(), "abc\tFix login");
    }

    #[test]
    fn test_menu_line_uses_key_when_there_is_no_id() {
        let r = record(json!({"key": "TOKEN", "value": "secret"}));
        assert_eq!(r.identity().as_deref(), Some("TOKEN"));
        assert_eq!(r.menu_line(), "TOKEN\t");
        let r = record(json!({"iid": 4, "title": "Bug"}));
        assert_eq!(r.menu_line(), "4\tBug");
    }

    #[test]
    fn test_menu_line_missing_parts() {
        let r = record(json!({"description": "no id"}));
        assert_eq!(r.menu_line(), "\t");
    }

    #[test]
    fn test_record_rejects_non_objects() {
        assert!(Record::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_record_text_ignores_structures() {
        let r = record(json!({"id": 7, "labels": ["a"]}));
        assert_eq!(r.id().as_deref(), Some("7"));
        assert!(r.text("labels").is_none());
    }
}
