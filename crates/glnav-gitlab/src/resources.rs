//! REST-backed implementation of the resource graph.
//!
//! [`Gitlab`] is the root, [`RestCollection`] a manager bound to one
//! collection path and [`RestObject`] one listed item. Each capability
//! selector a node declares is bound to a single REST request; a selector
//! without a binding is simply not exposed.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use glnav_core::capability::{ancestry, capabilities_of};
use glnav_core::{
    Args, Collection, Error, Family, Object, OperationDescriptor, Outcome, Param, ParamKind,
    ParentContext, Record, RemoteClient, Resource, ResourceKind, Result, Selector,
};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::GitlabClient;
use crate::schema::{CollectionSpec, ObjectSpec, TOP_LEVEL};

/// Display name of the root node.
pub const ROOT_NAME: &str = "GitLab";

/// Whether any family in the ancestry of `kind` declares `selector`.
fn declares(kind: &ResourceKind, selector: Selector) -> bool {
    ancestry(kind.families)
        .into_iter()
        .any(|family| capabilities_of(family).iter().any(|cap| cap.selector == selector))
}

fn unexposed(kind: &ResourceKind, selector: Selector) -> Error {
    Error::operation(format!("{} does not expose '{selector}'", kind.name))
}

fn child_path(segments: &[String], tail: &str) -> Vec<String> {
    let mut path = segments.to_vec();
    path.extend(tail.split('/').filter(|s| !s.is_empty()).map(str::to_string));
    path
}

fn require(args: &Args, name: &str) -> Result<Value> {
    args.get(name)
        .cloned()
        .ok_or_else(|| Error::invalid_input(format!("missing argument '{name}'")))
}

fn records(values: Vec<Value>) -> Result<Vec<Record>> {
    values.into_iter().map(Record::try_from).collect()
}

// ============================================================================
// Root
// ============================================================================

/// The authenticated GitLab instance.
#[derive(Clone, Debug)]
pub struct Gitlab {
    client: Arc<GitlabClient>,
}

impl Gitlab {
    /// Wrap an HTTP client.
    pub fn new(client: GitlabClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl RemoteClient for Gitlab {
    fn name(&self) -> &str {
        ROOT_NAME
    }

    fn collections(&self) -> Vec<Arc<dyn Collection>> {
        TOP_LEVEL
            .iter()
            .map(|spec| {
                let collection = RestCollection::new(Arc::clone(&self.client), spec, Vec::new(), None);
                Arc::new(collection) as Arc<dyn Collection>
            })
            .collect()
    }
}

// ============================================================================
// Collections
// ============================================================================

/// A collection bound to its REST path.
#[derive(Clone)]
pub struct RestCollection {
    client: Arc<GitlabClient>,
    spec: &'static CollectionSpec,
    segments: Vec<String>,
    parent: Option<ParentContext>,
}

impl RestCollection {
    /// Bind `spec` under the owner at `owner` path segments.
    pub fn new(
        client: Arc<GitlabClient>,
        spec: &'static CollectionSpec,
        owner: Vec<String>,
        parent: Option<ParentContext>,
    ) -> Self {
        let segments = child_path(&owner, spec.path);
        Self {
            client,
            spec,
            segments,
            parent,
        }
    }

    fn item_path(&self, args: &Args) -> Result<Vec<String>> {
        let mut path = self.segments.clone();
        path.push(args.require_text("id")?);
        Ok(path)
    }

    fn object(&self, record: Record, origin: &Arc<dyn Collection>) -> Result<Arc<dyn Object>> {
        let id_field = self.spec.object.id_field;
        let id = record.text(id_field).ok_or_else(|| {
            Error::invalid_data(format!(
                "{} item has no '{id_field}' attribute",
                self.spec.kind.name
            ))
        })?;
        let mut segments = self.segments.clone();
        segments.push(id);
        let object: Arc<dyn Object> = Arc::new(RestObject::new(
            Arc::clone(&self.client),
            &self.spec.object,
            segments,
            record,
            Arc::clone(origin),
        ));
        Ok(object)
    }
}

#[async_trait]
impl Resource for RestCollection {
    fn kind(&self) -> ResourceKind {
        self.spec.kind
    }

    fn operation(&self, selector: Selector) -> Option<OperationDescriptor> {
        let kind = &self.spec.kind;
        if !declares(kind, selector) {
            return None;
        }
        let op = OperationDescriptor::new(selector);
        let id = || Param::required("id", ParamKind::Text);
        let op = match selector {
            Selector::LIST => op,
            Selector::GET if ancestry(kind.families).contains(&Family::Get) => op.with_param(id()),
            Selector::GET => op,
            Selector::CREATE => op.with_param(Param::required("data", ParamKind::Json)),
            Selector::UPDATE => op
                .with_param(id())
                .with_param(Param::optional("new_data", ParamKind::Json, json!({}))),
            Selector::SET => op
                .with_param(Param::required("key", ParamKind::Text))
                .with_param(Param::required("value", ParamKind::Text)),
            Selector::DELETE => op.with_param(id()),
            Selector::RENDER => op
                .with_param(Param::required("link_url", ParamKind::Text))
                .with_param(Param::required("image_url", ParamKind::Text)),
            _ => return None,
        };
        Some(op)
    }

    async fn invoke(&self, selector: Selector, args: Args) -> Result<Outcome> {
        let Some(op) = self.operation(selector) else {
            return Err(unexposed(&self.spec.kind, selector));
        };
        debug!(collection = self.spec.kind.name, %selector, "invoke");
        let client = &self.client;
        match selector {
            Selector::LIST => {
                let items = client.get_all(&self.segments).await?;
                Ok(Outcome::Records(records(items)?))
            }
            Selector::GET => {
                let path = if op.takes("id") {
                    self.item_path(&args)?
                } else {
                    self.segments.clone()
                };
                Ok(Outcome::Value(client.get(&path, &[]).await?))
            }
            Selector::CREATE => {
                let data = require(&args, "data")?;
                Ok(Outcome::Value(client.post(&self.segments, Some(&data)).await?))
            }
            Selector::UPDATE => {
                let path = self.item_path(&args)?;
                let data = args.get("new_data").cloned().unwrap_or_else(|| json!({}));
                Ok(Outcome::Value(client.put(&path, &data).await?))
            }
            Selector::SET => {
                let mut path = self.segments.clone();
                path.push(args.require_text("key")?);
                let body = json!({ "value": require(&args, "value")? });
                Ok(Outcome::Value(client.put(&path, &body).await?))
            }
            Selector::DELETE => {
                client.delete(&self.item_path(&args)?).await?;
                Ok(Outcome::Done)
            }
            Selector::RENDER => {
                let path = child_path(&self.segments, "render");
                let query = [
                    ("link_url", args.require_text("link_url")?),
                    ("image_url", args.require_text("image_url")?),
                ];
                Ok(Outcome::Value(client.get(&path, &query).await?))
            }
            _ => Err(unexposed(&self.spec.kind, selector)),
        }
    }
}

#[async_trait]
impl Collection for RestCollection {
    fn attribute(&self) -> &str {
        self.spec.attribute
    }

    async fn list_all(&self) -> Result<Vec<Arc<dyn Object>>> {
        if !declares(&self.spec.kind, Selector::LIST) {
            return Err(unexposed(&self.spec.kind, Selector::LIST));
        }
        let values = self.client.get_all(&self.segments).await?;
        let origin: Arc<dyn Collection> = Arc::new(self.clone());
        records(values)?
            .into_iter()
            .map(|record| self.object(record, &origin))
            .collect()
    }

    fn parent(&self) -> Option<ParentContext> {
        self.parent.clone()
    }
}

// ============================================================================
// Objects
// ============================================================================

/// One listed object with its current attributes.
///
/// Attribute changes are staged with [`RestObject::stage`] and sent by the
/// `save` operation.
pub struct RestObject {
    client: Arc<GitlabClient>,
    spec: &'static ObjectSpec,
    segments: Vec<String>,
    record: RwLock<Record>,
    pending: Mutex<Map<String, Value>>,
    origin: Arc<dyn Collection>,
}

impl RestObject {
    fn new(
        client: Arc<GitlabClient>,
        spec: &'static ObjectSpec,
        segments: Vec<String>,
        record: Record,
        origin: Arc<dyn Collection>,
    ) -> Self {
        Self {
            client,
            spec,
            segments,
            record: RwLock::new(record),
            pending: Mutex::new(Map::new()),
            origin,
        }
    }

    /// Stage an attribute change for the next `save`.
    pub fn stage(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut record = self.record.write().unwrap_or_else(PoisonError::into_inner);
        let mut attributes = record.attributes().clone();
        attributes.insert(key.clone(), value.clone());
        *record = Record::new(attributes);
        drop(record);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Changes staged since the last `save`.
    pub fn pending(&self) -> Map<String, Value> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn clear_pending(&self) {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Replace the attributes with a fresh server representation. Anything
    /// that is not an object (an empty 204 body) leaves them untouched.
    fn absorb(&self, value: &Value) {
        if let Value::Object(map) = value {
            *self.record.write().unwrap_or_else(PoisonError::into_inner) = Record::new(map.clone());
        }
    }

    fn action(&self, name: &str) -> Vec<String> {
        child_path(&self.segments, name)
    }
}

#[async_trait]
impl Resource for RestObject {
    fn kind(&self) -> ResourceKind {
        self.spec.kind
    }

    fn operation(&self, selector: Selector) -> Option<OperationDescriptor> {
        if !declares(&self.spec.kind, selector) {
            return None;
        }
        let op = OperationDescriptor::new(selector);
        let op = match selector {
            Selector::REFRESH
            | Selector::SAVE
            | Selector::DELETE
            | Selector::USER_AGENT_DETAIL
            | Selector::SUBSCRIBE
            | Selector::UNSUBSCRIBE
            | Selector::TODO
            | Selector::TIME_STATS
            | Selector::RESET_TIME_ESTIMATE
            | Selector::RESET_SPENT_TIME
            | Selector::PARTICIPANTS => op,
            Selector::DOWNLOAD if self.spec.download.is_some() => op,
            Selector::APPROVE => op.with_param(Param::optional("access_level", ParamKind::Integer, 30)),
            Selector::TIME_ESTIMATE => op.with_param(Param::required("duration", ParamKind::Text)),
            Selector::ADD_SPENT_TIME => op
                .with_param(Param::required("duration", ParamKind::Text))
                .with_param(Param::optional("summary", ParamKind::Text, "")),
            _ => return None,
        };
        Some(op)
    }

    async fn invoke(&self, selector: Selector, args: Args) -> Result<Outcome> {
        if self.operation(selector).is_none() {
            return Err(unexposed(&self.spec.kind, selector));
        }
        debug!(object = self.spec.kind.name, path = %self.segments.join("/"), %selector, "invoke");
        let client = &self.client;
        match selector {
            Selector::REFRESH => {
                let value = client.get(&self.segments, &[]).await?;
                self.absorb(&value);
                Ok(Outcome::Done)
            }
            Selector::SAVE => {
                let changes = self.pending();
                if changes.is_empty() {
                    debug!(object = self.spec.kind.name, "nothing to save");
                    return Ok(Outcome::Done);
                }
                let value = client.put(&self.segments, &Value::Object(changes)).await?;
                self.clear_pending();
                self.absorb(&value);
                Ok(Outcome::Done)
            }
            Selector::DELETE => {
                client.delete(&self.segments).await?;
                Ok(Outcome::Done)
            }
            Selector::USER_AGENT_DETAIL => {
                let value = client.get(&self.action("user_agent_detail"), &[]).await?;
                Ok(Outcome::Value(value))
            }
            Selector::APPROVE => {
                let level = args.get("access_level").cloned().unwrap_or_else(|| Value::from(30));
                let body = json!({ "access_level": level });
                client.put(&self.action("approve"), &body).await?;
                Ok(Outcome::Done)
            }
            Selector::DOWNLOAD => {
                let tail = self.spec.download.unwrap_or_default();
                let bytes = client.get_bytes(&self.action(tail)).await?;
                Ok(Outcome::Bytes(bytes))
            }
            Selector::SUBSCRIBE | Selector::UNSUBSCRIBE => {
                let value = client.post(&self.action(selector.name()), None).await?;
                self.absorb(&value);
                Ok(Outcome::Done)
            }
            Selector::TODO => {
                client.post(&self.action("todo"), None).await?;
                Ok(Outcome::Done)
            }
            Selector::TIME_STATS | Selector::PARTICIPANTS => {
                let value = client.get(&self.action(selector.name()), &[]).await?;
                Ok(Outcome::Value(value))
            }
            Selector::TIME_ESTIMATE => {
                let body = json!({ "duration": args.require_text("duration")? });
                Ok(Outcome::Value(client.post(&self.action("time_estimate"), Some(&body)).await?))
            }
            Selector::ADD_SPENT_TIME => {
                let mut body = Map::new();
                body.insert("duration".into(), Value::String(args.require_text("duration")?));
                if let Some(summary) = args.text("summary").filter(|s| !s.is_empty()) {
                    body.insert("summary".into(), Value::String(summary));
                }
                let value = client
                    .post(&self.action("add_spent_time"), Some(&Value::Object(body)))
                    .await?;
                Ok(Outcome::Value(value))
            }
            Selector::RESET_TIME_ESTIMATE | Selector::RESET_SPENT_TIME => {
                let value = client.post(&self.action(selector.name()), None).await?;
                Ok(Outcome::Value(value))
            }
            _ => Err(unexposed(&self.spec.kind, selector)),
        }
    }
}

impl Object for RestObject {
    fn record(&self) -> Record {
        self.record.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn collections(&self) -> Vec<Arc<dyn Collection>> {
        let parent = ParentContext {
            record: self.record(),
            origin: Arc::clone(&self.origin),
        };
        self.spec
            .children
            .iter()
            .map(|spec| {
                let collection = RestCollection::new(
                    Arc::clone(&self.client),
                    spec,
                    self.segments.clone(),
                    Some(parent.clone()),
                );
                Arc::new(collection) as Arc<dyn Collection>
            })
            .collect()
    }
}
