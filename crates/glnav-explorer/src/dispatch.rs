//! Action dispatch.
//!
//! A [`HandlerRegistry`] maps a chosen operation to the [`Handler`] that
//! collects its arguments, invokes it and reports the result. Resolution is
//! a fixed three-step lookup:
//!
//! 1. an override registered for the owning resource kind and selector,
//! 2. the named handler registered for the selector,
//! 3. the fallback handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use glnav_core::{Error, OperationDescriptor, Resource, ResourceNode, Result, Selector};
use tracing::debug;

use crate::handlers::{GenericHandler, Protocol};
use crate::menu::MenuAdapter;
use crate::operator::Operator;

/// The operator-facing channels a handler may use.
#[derive(Clone)]
pub struct Console {
    menu: MenuAdapter,
    operator: Arc<dyn Operator>,
}

impl Console {
    /// Bundle a menu adapter and an operator.
    pub fn new(menu: MenuAdapter, operator: Arc<dyn Operator>) -> Self {
        Self { menu, operator }
    }

    /// Picker-backed menus.
    pub fn menu(&self) -> &MenuAdapter {
        &self.menu
    }

    /// Prompts and output.
    pub fn operator(&self) -> &dyn Operator {
        self.operator.as_ref()
    }
}

/// One operation about to be carried out.
pub struct Invocation<'a> {
    /// Node the operation was chosen on.
    pub node: &'a ResourceNode,
    /// The node as a resource.
    pub target: &'a dyn Resource,
    /// Descriptor of the chosen operation.
    pub operation: OperationDescriptor,
}

impl Invocation<'_> {
    /// Selector of the chosen operation.
    pub fn selector(&self) -> Selector {
        self.operation.selector
    }
}

/// Carries out one operation end to end.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Collect arguments, invoke the operation and report the result.
    async fn handle(&self, call: &Invocation<'_>, console: &Console) -> Result<()>;
}

/// Which registry step produced a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Kind-specific override.
    Override,
    /// Named handler for the selector.
    Named,
    /// Generic fallback.
    Fallback,
}

/// Handlers keyed by selector, with per-kind overrides and a fallback.
#[derive(Clone)]
pub struct HandlerRegistry {
    overrides: HashMap<(String, Selector), Arc<dyn Handler>>,
    named: HashMap<Selector, Arc<dyn Handler>>,
    fallback: Arc<dyn Handler>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl HandlerRegistry {
    /// Empty registry; everything resolves to `fallback`.
    pub fn new(fallback: Arc<dyn Handler>) -> Self {
        Self {
            overrides: HashMap::new(),
            named: HashMap::new(),
            fallback,
        }
    }

    /// Registry with the built-in named handlers and the generic fallback.
    pub fn standard() -> Self {
        Protocol::standard_set().into_iter().fold(
            Self::new(Arc::new(GenericHandler)),
            |registry, (selector, protocol)| registry.with_named(selector, Arc::new(protocol)),
        )
    }

    /// Register (or replace) the named handler for `selector`.
    pub fn with_named(mut self, selector: Selector, handler: Arc<dyn Handler>) -> Self {
        self.named.insert(selector, handler);
        self
    }

    /// Register an override for `selector` on resources of kind `kind_name`.
    pub fn with_override(
        mut self,
        kind_name: impl Into<String>,
        selector: Selector,
        handler: Arc<dyn Handler>,
    ) -> Self {
        self.overrides.insert((kind_name.into(), selector), handler);
        self
    }

    /// Resolve the handler for `selector` on a resource of kind `kind_name`.
    pub fn resolve(&self, kind_name: &str, selector: Selector) -> (&Arc<dyn Handler>, Resolution) {
        if let Some(handler) = self.overrides.get(&(kind_name.to_string(), selector)) {
            return (handler, Resolution::Override);
        }
        if let Some(handler) = self.named.get(&selector) {
            return (handler, Resolution::Named);
        }
        (&self.fallback, Resolution::Fallback)
    }

    /// Run `selector` on `node`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Operation`] when the node exposes no such
    /// operation, and otherwise with whatever the handler reports.
    pub async fn dispatch(
        &self,
        node: &ResourceNode,
        selector: Selector,
        console: &Console,
    ) -> Result<()> {
        let target = node
            .resource()
            .ok_or_else(|| Error::operation(format!("{} has no operations", node.kind_name())))?;
        let kind = target.kind();
        let operation = target.operation(selector).ok_or_else(|| {
            Error::operation(format!("{} does not expose '{selector}'", kind.name))
        })?;

        let (handler, resolution) = self.resolve(kind.name, selector);
        debug!(kind = kind.name, %selector, ?resolution, "dispatching");

        let call = Invocation {
            node,
            target,
            operation,
        };
        handler.handle(&call, console).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockOperator, MockPicker};
    use glnav_core::capability::Family;
    use glnav_core::mock::MockCollection;
    use glnav_core::ResourceKind;
    use tokio::sync::Mutex;

    const PROJECTS: ResourceKind = ResourceKind::new("ProjectManager", &[Family::Crud]);

    /// Records which handler ran.
    struct Marker {
        name: &'static str,
        hits: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Handler for Marker {
        async fn handle(&self, _call: &Invocation<'_>, _console: &Console) -> Result<()> {
            self.hits.lock().await.push(self.name);
            Ok(())
        }
    }

    fn marker(name: &'static str, hits: &Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Handler> {
        Arc::new(Marker {
            name,
            hits: Arc::clone(hits),
        })
    }

    fn console() -> Console {
        Console::new(
            MenuAdapter::new(Arc::new(MockPicker::new())),
            Arc::new(MockOperator::new()),
        )
    }

    #[test]
    fn test_resolution_order() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::new(marker("fallback", &hits))
            .with_named(Selector::CREATE, marker("named", &hits))
            .with_override("ProjectIssueLinkManager", Selector::CREATE, marker("override", &hits));

        assert_eq!(
            registry.resolve("ProjectIssueLinkManager", Selector::CREATE).1,
            Resolution::Override
        );
        assert_eq!(
            registry.resolve("ProjectIssueManager", Selector::CREATE).1,
            Resolution::Named
        );
        assert_eq!(
            registry.resolve("ProjectIssueManager", Selector::custom("archive")).1,
            Resolution::Fallback
        );
    }

    #[test]
    fn test_standard_registry_names_builtin_selectors() {
        let registry = HandlerRegistry::standard();
        for selector in [
            Selector::LIST,
            Selector::GET,
            Selector::CREATE,
            Selector::UPDATE,
            Selector::DELETE,
            Selector::REFRESH,
            Selector::SAVE,
            Selector::SET,
            Selector::APPROVE,
            Selector::DOWNLOAD,
            Selector::SUBSCRIBE,
            Selector::UNSUBSCRIBE,
            Selector::TODO,
            Selector::TIME_STATS,
            Selector::TIME_ESTIMATE,
            Selector::RESET_TIME_ESTIMATE,
            Selector::ADD_SPENT_TIME,
            Selector::RESET_SPENT_TIME,
            Selector::PARTICIPANTS,
            Selector::RENDER,
        ] {
            assert_eq!(registry.resolve("Any", selector).1, Resolution::Named, "{selector}");
        }
        assert_eq!(
            registry.resolve("Any", Selector::USER_AGENT_DETAIL).1,
            Resolution::Fallback
        );
    }

    #[tokio::test]
    async fn test_dispatch_runs_override_for_matching_kind() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::new(marker("fallback", &hits))
            .with_override("ProjectManager", Selector::LIST, marker("override", &hits));
        let node = ResourceNode::Collection(Arc::new(
            MockCollection::new("projects", PROJECTS).with_standard_operations(),
        ));

        registry.dispatch(&node, Selector::LIST, &console()).await.unwrap();
        registry.dispatch(&node, Selector::GET, &console()).await.unwrap();
        assert_eq!(*hits.lock().await, vec!["override", "fallback"]);
    }

    #[tokio::test]
    async fn test_dispatch_unexposed_operation_fails_without_invoking() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::new(marker("fallback", &hits));
        let coll = Arc::new(
            MockCollection::new("projects", PROJECTS)
                .with_standard_operations()
                .without_operation(Selector::DELETE),
        );
        let node = ResourceNode::Collection(coll.clone());

        let err = registry
            .dispatch(&node, Selector::DELETE, &console())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
        assert!(hits.lock().await.is_empty());
        assert!(coll.calls().await.is_empty());
    }
}
