//! In-memory resource graph for testing.
//!
//! [`MockClient`], [`MockCollection`] and [`MockObject`] implement the
//! resource traits over fixed data. Every invocation is recorded so tests
//! can assert exactly which operations ran with which arguments, and
//! failures can be scripted per selector.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::capability::{Selector, ancestry, capabilities_of};
use crate::operation::{Args, OperationDescriptor, Outcome, Param, ParamKind};
use crate::resource::{
    Collection, Object, ParentContext, Record, RemoteClient, Resource, ResourceKind,
};
use crate::{Error, Result};

/// Scripted failure returned by a mock invocation.
#[derive(Clone, Debug)]
pub enum MockFailure {
    /// Fails with [`Error::NotFound`].
    NotFound(String),
    /// Fails with [`Error::Remote`].
    Remote(u16, String),
}

impl MockFailure {
    fn to_error(&self) -> Error {
        match self {
            MockFailure::NotFound(msg) => Error::not_found(msg.clone()),
            MockFailure::Remote(status, msg) => Error::remote(*status, msg.clone()),
        }
    }
}

/// The descriptor a typical binding would give `selector`.
///
/// `on_object` distinguishes object-level operations (which act on the
/// object itself and take no ID) from collection-level ones.
pub fn standard_operation(selector: Selector, on_object: bool) -> OperationDescriptor {
    let op = OperationDescriptor::new(selector);
    match selector.name() {
        "get" if !on_object => op.with_param(Param::required("id", ParamKind::Text)),
        "create" => op.with_param(Param::required("data", ParamKind::Json)),
        "update" => op
            .with_param(Param::required("id", ParamKind::Text))
            .with_param(Param::optional("new_data", ParamKind::Json, serde_json::json!({}))),
        "set" => op
            .with_param(Param::required("key", ParamKind::Text))
            .with_param(Param::required("value", ParamKind::Text)),
        "delete" if !on_object => op.with_param(Param::required("id", ParamKind::Text)),
        "approve" => op.with_param(Param::optional("access_level", ParamKind::Integer, 30)),
        "time_estimate" => op.with_param(Param::required("duration", ParamKind::Text)),
        "add_spent_time" => op
            .with_param(Param::required("duration", ParamKind::Text))
            .with_param(Param::optional("summary", ParamKind::Text, "")),
        "render" => op
            .with_param(Param::required("link_url", ParamKind::Text))
            .with_param(Param::required("image_url", ParamKind::Text)),
        _ => op,
    }
}

fn standard_operations(kind: &ResourceKind, on_object: bool) -> Vec<OperationDescriptor> {
    let mut ops: Vec<OperationDescriptor> = Vec::new();
    for family in ancestry(kind.families) {
        for cap in capabilities_of(family) {
            if !ops.iter().any(|op| op.selector == cap.selector) {
                ops.push(standard_operation(cap.selector, on_object));
            }
        }
    }
    ops
}

/// Shared invocation bookkeeping for collections and objects.
#[derive(Default)]
struct Script {
    outcomes: HashMap<Selector, Outcome>,
    failures: HashMap<Selector, MockFailure>,
    calls: Mutex<Vec<(Selector, Args)>>,
}

impl Script {
    async fn record(&self, selector: Selector, args: Args) -> Result<Option<Outcome>> {
        self.calls.lock().await.push((selector, args));
        if let Some(failure) = self.failures.get(&selector) {
            return Err(failure.to_error());
        }
        Ok(self.outcomes.get(&selector).cloned())
    }
}

// ============================================================================
// MockCollection
// ============================================================================

/// In-memory collection.
pub struct MockCollection {
    attribute: String,
    kind: ResourceKind,
    operations: Vec<OperationDescriptor>,
    items: Vec<Arc<MockObject>>,
    parent: Option<ParentContext>,
    script: Script,
}

impl MockCollection {
    /// Create a collection exposing no operations.
    pub fn new(attribute: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            operations: Vec::new(),
            items: Vec::new(),
            parent: None,
            script: Script::default(),
        }
    }

    /// Expose the standard operation for every capability of the kind.
    pub fn with_standard_operations(mut self) -> Self {
        self.operations = standard_operations(&self.kind, false);
        self
    }

    /// Expose (or replace) one operation.
    pub fn with_operation(mut self, op: OperationDescriptor) -> Self {
        self.operations.retain(|o| o.selector != op.selector);
        self.operations.push(op);
        self
    }

    /// Stop exposing an operation even if a family declares it.
    pub fn without_operation(mut self, selector: Selector) -> Self {
        self.operations.retain(|o| o.selector != selector);
        self
    }

    /// Items returned by `list` and browsing.
    pub fn with_items(mut self, items: Vec<MockObject>) -> Self {
        self.items = items.into_iter().map(Arc::new).collect();
        self
    }

    /// Outcome returned when `selector` is invoked.
    pub fn with_outcome(mut self, selector: Selector, outcome: Outcome) -> Self {
        self.script.outcomes.insert(selector, outcome);
        self
    }

    /// Make `selector` fail.
    pub fn with_failure(mut self, selector: Selector, failure: MockFailure) -> Self {
        self.script.failures.insert(selector, failure);
        self
    }

    /// Nest the collection under an object.
    pub fn with_parent(mut self, parent: ParentContext) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Invocations so far, in order.
    pub async fn calls(&self) -> Vec<(Selector, Args)> {
        self.script.calls.lock().await.clone()
    }

    fn records(&self) -> Vec<Record> {
        self.items.iter().map(|item| item.record.clone()).collect()
    }
}

#[async_trait]
impl Resource for MockCollection {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn operation(&self, selector: Selector) -> Option<OperationDescriptor> {
        self.operations.iter().find(|o| o.selector == selector).cloned()
    }

    async fn invoke(&self, selector: Selector, args: Args) -> Result<Outcome> {
        if self.operation(selector).is_none() {
            return Err(Error::operation(format!(
                "{} does not expose '{selector}'",
                self.kind.name
            )));
        }
        match self.script.record(selector, args).await? {
            Some(outcome) => Ok(outcome),
            None if selector == Selector::LIST => Ok(Outcome::Records(self.records())),
            None => Ok(Outcome::Done),
        }
    }
}

#[async_trait]
impl Collection for MockCollection {
    fn attribute(&self) -> &str {
        &self.attribute
    }

    async fn list_all(&self) -> Result<Vec<Arc<dyn Object>>> {
        if let Some(failure) = self.script.failures.get(&Selector::LIST) {
            return Err(failure.to_error());
        }
        Ok(self
            .items
            .iter()
            .map(|item| Arc::clone(item) as Arc<dyn Object>)
            .collect())
    }

    fn parent(&self) -> Option<ParentContext> {
        self.parent.clone()
    }
}

// ============================================================================
// MockObject
// ============================================================================

/// In-memory object.
pub struct MockObject {
    kind: ResourceKind,
    record: Record,
    operations: Vec<OperationDescriptor>,
    collections: Vec<Arc<MockCollection>>,
    script: Script,
}

impl MockObject {
    /// Create an object from a JSON attribute map.
    ///
    /// Non-object values produce an empty record.
    pub fn new(kind: ResourceKind, attributes: serde_json::Value) -> Self {
        Self {
            kind,
            record: Record::try_from(attributes).unwrap_or_default(),
            operations: Vec::new(),
            collections: Vec::new(),
            script: Script::default(),
        }
    }

    /// Expose the standard object-level operation for every capability.
    pub fn with_standard_operations(mut self) -> Self {
        self.operations = standard_operations(&self.kind, true);
        self
    }

    /// Expose (or replace) one operation.
    pub fn with_operation(mut self, op: OperationDescriptor) -> Self {
        self.operations.retain(|o| o.selector != op.selector);
        self.operations.push(op);
        self
    }

    /// Attach a nested collection.
    pub fn with_collection(mut self, collection: Arc<MockCollection>) -> Self {
        self.collections.push(collection);
        self
    }

    /// Outcome returned when `selector` is invoked.
    pub fn with_outcome(mut self, selector: Selector, outcome: Outcome) -> Self {
        self.script.outcomes.insert(selector, outcome);
        self
    }

    /// Make `selector` fail.
    pub fn with_failure(mut self, selector: Selector, failure: MockFailure) -> Self {
        self.script.failures.insert(selector, failure);
        self
    }

    /// Invocations so far, in order.
    pub async fn calls(&self) -> Vec<(Selector, Args)> {
        self.script.calls.lock().await.clone()
    }
}

#[async_trait]
impl Resource for MockObject {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn operation(&self, selector: Selector) -> Option<OperationDescriptor> {
        self.operations.iter().find(|o| o.selector == selector).cloned()
    }

    async fn invoke(&self, selector: Selector, args: Args) -> Result<Outcome> {
        if self.operation(selector).is_none() {
            return Err(Error::operation(format!(
                "{} does not expose '{selector}'",
                self.kind.name
            )));
        }
        Ok(self
            .script
            .record(selector, args)
            .await?
            .unwrap_or(Outcome::Done))
    }
}

impl Object for MockObject {
    fn record(&self) -> Record {
        self.record.clone()
    }

    fn collections(&self) -> Vec<Arc<dyn Collection>> {
        self.collections
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn Collection>)
            .collect()
    }
}

// ============================================================================
// MockClient
// ============================================================================

/// In-memory root client.
pub struct MockClient {
    name: String,
    collections: Vec<Arc<MockCollection>>,
}

impl MockClient {
    /// Create a client with no collections.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: Vec::new(),
        }
    }

    /// Attach a top-level collection.
    pub fn with_collection(mut self, collection: Arc<MockCollection>) -> Self {
        self.collections.push(collection);
        self
    }
}

impl RemoteClient for MockClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn collections(&self) -> Vec<Arc<dyn Collection>> {
        self.collections
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn Collection>)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capability::Family;
    use serde_json::json;

    const ISSUES: ResourceKind = ResourceKind::new("ProjectIssueManager", &[Family::Crud]);
    const ISSUE: ResourceKind = ResourceKind::new("ProjectIssue", &[Family::Save]);

    #[tokio::test]
    async fn test_list_returns_item_records() {
        let coll = MockCollection::new("issues", ISSUES)
            .with_standard_operations()
            .with_items(vec![MockObject::new(ISSUE, json!({"id": 1, "title": "A"}))]);
        let outcome = coll.invoke(Selector::LIST, Args::new()).await.unwrap();
        let records = outcome.into_records().unwrap();
        assert_eq!(records[0].menu_line(), "1\tA");
        assert_eq!(coll.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unexposed_operation_is_rejected() {
        let coll = MockCollection::new("issues", ISSUES)
            .with_standard_operations()
            .without_operation(Selector::DELETE);
        let err = coll
            .invoke(Selector::DELETE, Args::new().with("id", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
        assert!(coll.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let coll = MockCollection::new("issues", ISSUES)
            .with_standard_operations()
            .with_failure(Selector::DELETE, MockFailure::NotFound("404 Issue".into()));
        let err = coll
            .invoke(Selector::DELETE, Args::new().with("id", "9"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(coll.calls().await.len(), 1);
    }

    #[test]
    fn test_standard_operations_follow_ancestry() {
        let coll = MockCollection::new("issues", ISSUES).with_standard_operations();
        assert!(coll.operation(Selector::LIST).is_some());
        assert!(coll.operation(Selector::UPDATE).is_some());
        assert!(coll.operation(Selector::SAVE).is_none());
        assert!(coll.operation(Selector::DELETE).unwrap().takes("id"));
    }

    #[test]
    fn test_object_delete_takes_no_id() {
        let kind = ResourceKind::new("ProjectIssue", &[Family::ObjectDelete]);
        let obj = MockObject::new(kind, json!({"id": 1})).with_standard_operations();
        assert!(!obj.operation(Selector::DELETE).unwrap().takes("id"));
    }
}
