//! The recursive explorer loop.
//!
//! Every node gets the same menu: its nested collections (humanized
//! attribute names) followed by its action catalog. Choosing a collection
//! or browsing into an object recurses one level; choosing an action runs
//! it through the [`HandlerRegistry`] and redraws the same node. Back
//! navigation is returning from the recursive call, so no node ever needs a
//! parent pointer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use glnav_core::{Collection, Error, RemoteClient, ResourceNode, Result, Selector};
use tracing::{debug, info, warn};

use crate::catalog::{EntryKind, build_catalog};
use crate::dispatch::{Console, HandlerRegistry};

/// How a level of the explorer was left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Return to the parent level.
    Back,
    /// End the session.
    Quit,
}

type FlowFuture<'a> = Pin<Box<dyn Future<Output = Result<Flow>> + 'a>>;

/// What one menu line leads to.
#[derive(Clone)]
enum Choice {
    Enter(Arc<dyn Collection>),
    Action(Selector),
    Browse,
    Back,
    Quit,
}

/// The rendered menu of one node.
struct Menu {
    labels: Vec<String>,
    choices: Vec<Choice>,
}

impl Menu {
    fn push(&mut self, label: String, choice: Choice) {
        let label = if self.labels.contains(&label) {
            let mut n = 2;
            while self.labels.contains(&format!("{label} ({n})")) {
                n += 1;
            }
            format!("{label} ({n})")
        } else {
            label
        };
        self.labels.push(label);
        self.choices.push(choice);
    }
}

/// `merge_requests` → `Merge Requests`.
pub fn humanize(attribute: &str) -> String {
    attribute
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Header of the item picker for a collection labelled `label`.
pub fn browse_header(label: &str) -> String {
    format!("Select from {label}")
}

/// Menu for `node`: nested collections, then the action catalog.
fn menu_for(node: &ResourceNode) -> Menu {
    let mut menu = Menu {
        labels: Vec::new(),
        choices: Vec::new(),
    };
    for collection in node.sub_collections() {
        let label = humanize(collection.attribute());
        menu.push(label, Choice::Enter(collection));
    }
    for entry in build_catalog(node) {
        let choice = match entry.kind {
            EntryKind::Action => match entry.selector {
                Some(selector) => Choice::Action(selector),
                None => continue,
            },
            EntryKind::Browse => Choice::Browse,
            EntryKind::Back => Choice::Back,
            EntryKind::Quit => Choice::Quit,
        };
        menu.push(entry.label, choice);
    }
    menu
}

/// Labels the explorer would show for `node`.
pub fn menu_labels(node: &ResourceNode) -> Vec<String> {
    menu_for(node).labels
}

/// Interactive explorer over a remote resource graph.
pub struct Navigator {
    client: Arc<dyn RemoteClient>,
    registry: HandlerRegistry,
    console: Console,
}

impl Navigator {
    /// Create a navigator rooted at `client`.
    pub fn new(client: Arc<dyn RemoteClient>, registry: HandlerRegistry, console: Console) -> Self {
        Self {
            client,
            registry,
            console,
        }
    }

    /// Run until the operator quits.
    ///
    /// # Errors
    ///
    /// Only non-recoverable failures end the session with an error: picker
    /// or terminal failures, and environment errors raised mid-session.
    pub async fn run(&self) -> Result<()> {
        let root = ResourceNode::Root(Arc::clone(&self.client));
        let label = self.client.name().to_string();
        info!(root = %label, "session started");
        self.explore(root, label).await?;
        info!("session ended");
        Ok(())
    }

    fn explore(&self, node: ResourceNode, label: String) -> FlowFuture<'_> {
        Box::pin(async move {
            let header = format!("{label}>");
            loop {
                let menu = menu_for(&node);
                let Some(index) = self.console.menu().select(&menu.labels, &header).await? else {
                    debug!(node = %label, "selection cancelled");
                    return Ok(if node.is_root() { Flow::Quit } else { Flow::Back });
                };
                let chosen = menu.labels[index].clone();
                debug!(node = %label, choice = %chosen, "selected");

                let flow = match &menu.choices[index] {
                    Choice::Enter(collection) => {
                        let child = ResourceNode::Collection(Arc::clone(collection));
                        self.explore(child, chosen).await?
                    }
                    Choice::Browse => self.browse(&node, &label).await?,
                    Choice::Action(selector) => {
                        self.run_action(&node, *selector).await?;
                        Flow::Back
                    }
                    Choice::Back => return Ok(Flow::Back),
                    Choice::Quit => {
                        self.console.operator().info("Goodbye!");
                        return Ok(Flow::Quit);
                    }
                };
                if flow == Flow::Quit {
                    return Ok(Flow::Quit);
                }
            }
        })
    }

    /// List every item of the collection, let the operator pick one and
    /// explore it. `Back` means "stay at this collection".
    async fn browse(&self, node: &ResourceNode, label: &str) -> Result<Flow> {
        let Some(collection) = node.as_collection() else {
            return Ok(Flow::Back);
        };
        let operator = self.console.operator();

        let items = match collection.list_all().await {
            Ok(items) => items,
            Err(e) => return self.recover(label, e),
        };
        if items.is_empty() {
            operator.info("No items.");
            return Ok(Flow::Back);
        }

        let lines: Vec<String> = items.iter().map(|item| item.record().menu_line()).collect();
        let picked = match self.console.menu().select(&lines, &browse_header(label)).await {
            Ok(picked) => picked,
            Err(e) => return self.recover(label, e),
        };
        let Some(index) = picked else {
            return Ok(Flow::Back);
        };

        let object = Arc::clone(&items[index]);
        let record = object.record();
        operator.info(&format!(
            "Selected: {}",
            record.display_name().unwrap_or_default()
        ));
        let child_label = format!("{label}:{}", record.identity().unwrap_or_default());
        self.explore(ResourceNode::Object(object), child_label).await
    }

    /// Report a recoverable browse failure and stay at the collection.
    fn recover(&self, label: &str, e: Error) -> Result<Flow> {
        if !e.is_recoverable() {
            return Err(e);
        }
        warn!(collection = %label, error = %e, "browse failed");
        self.console.operator().error(&format!("Error fetching items: {e}"));
        Ok(Flow::Back)
    }

    /// Dispatch one action; recoverable failures are reported and swallowed.
    async fn run_action(&self, node: &ResourceNode, selector: Selector) -> Result<()> {
        match self.registry.dispatch(node, selector, &self.console).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_recoverable() => {
                warn!(node = node.kind_name(), %selector, error = %e, "action failed");
                self.console.operator().error(&e.to_string());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::menu::MenuAdapter;
    use crate::mock::{MockOperator, MockPicker};
    use glnav_core::ResourceKind;
    use glnav_core::capability::Family;
    use glnav_core::mock::{MockClient, MockCollection, MockObject};
    use serde_json::json;

    const PROJECTS: ResourceKind = ResourceKind::new("ProjectManager", &[Family::Crud]);
    const PROJECT: ResourceKind = ResourceKind::new("Project", &[Family::Save]);
    const ISSUES: ResourceKind = ResourceKind::new("ProjectIssueManager", &[Family::Crud]);

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("merge_requests"), "Merge Requests");
        assert_eq!(humanize("projects"), "Projects");
        assert_eq!(humanize("user_agent__detail"), "User Agent Detail");
    }

    #[test]
    fn test_browse_header_names_the_collection() {
        assert_eq!(browse_header("Projects"), "Select from Projects");
        assert_eq!(browse_header("Issues"), "Select from Issues");
        assert_eq!(browse_header("Todos"), "Select from Todos");
    }

    #[test]
    fn test_root_menu_lists_collections_then_quit() {
        let client = MockClient::new("GitLab")
            .with_collection(Arc::new(MockCollection::new("projects", PROJECTS)))
            .with_collection(Arc::new(MockCollection::new("merge_requests", ISSUES)));
        let node = ResourceNode::Root(Arc::new(client));
        assert_eq!(menu_labels(&node), vec!["Projects", "Merge Requests", "Quit"]);
    }

    #[test]
    fn test_object_menu_has_collections_actions_and_back() {
        let issues = Arc::new(MockCollection::new("issues", ISSUES).with_standard_operations());
        let obj = MockObject::new(PROJECT, json!({"id": 1}))
            .with_standard_operations()
            .with_collection(issues);
        let node = ResourceNode::Object(Arc::new(obj));
        assert_eq!(menu_labels(&node), vec!["Issues", "Save changes", "← Back"]);
    }

    #[tokio::test]
    async fn test_quit_from_root() {
        let client = Arc::new(MockClient::new("GitLab"));
        let picker = Arc::new(MockPicker::new().then_pick(["Quit"]));
        let operator = Arc::new(MockOperator::new());
        let console = Console::new(MenuAdapter::new(picker.clone()), operator.clone());

        Navigator::new(client, HandlerRegistry::standard(), console)
            .run()
            .await
            .unwrap();

        assert_eq!(picker.headers().await, vec!["GitLab>"]);
        assert_eq!(operator.messages(), vec!["Goodbye!"]);
    }

    #[tokio::test]
    async fn test_cancel_at_root_quits() {
        let client = Arc::new(MockClient::new("GitLab"));
        let picker = Arc::new(MockPicker::new());
        let console = Console::new(MenuAdapter::new(picker.clone()), Arc::new(MockOperator::new()));

        Navigator::new(client, HandlerRegistry::standard(), console)
            .run()
            .await
            .unwrap();
        assert_eq!(picker.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_browse_drills_into_object_label() {
        let projects = Arc::new(
            MockCollection::new("projects", PROJECTS)
                .with_standard_operations()
                .with_items(vec![
                    MockObject::new(PROJECT, json!({"id": 5, "name": "glnav"}))
                        .with_standard_operations(),
                ]),
        );
        let client = Arc::new(MockClient::new("GitLab").with_collection(projects));
        let picker = Arc::new(
            MockPicker::new()
                .then_pick(["Projects"])
                .then_pick(["Browse items"])
                .then_pick(["5\tglnav"])
                .then_pick(["← Back"])
                .then_pick(["← Back"])
                .then_pick(["Quit"]),
        );
        let operator = Arc::new(MockOperator::new());
        let console = Console::new(MenuAdapter::new(picker.clone()), operator.clone());

        Navigator::new(client, HandlerRegistry::standard(), console)
            .run()
            .await
            .unwrap();

        assert_eq!(
            picker.headers().await,
            vec![
                "GitLab>",
                "Projects>",
                "Select from Projects",
                "Projects:5>",
                "Projects>",
                "GitLab>",
            ]
        );
        assert!(operator.messages().contains(&"Selected: glnav".to_string()));
    }
}
