//! GitLab-specific handler overrides.
//!
//! Linking issues by typing raw JSON is unusable, so `create` on an issue's
//! link collection offers the other issues of the same project in a
//! multi-select picker and creates one link per selection.

use std::sync::Arc;

use async_trait::async_trait;
use glnav_core::{Args, Error, ParamKind, Record, Result, Selector};
use glnav_explorer::{Console, Handler, HandlerRegistry, Invocation};
use serde_json::{Value, json};
use tracing::debug;

use crate::schema::ISSUE_LINKS;

/// Multi-select issue picker for `create` on issue links.
#[derive(Clone, Copy, Debug, Default)]
pub struct IssueLinkCreate;

/// `"<iid>\t<title>"`, falling back to the description.
fn candidate_line(record: &Record) -> String {
    let summary = [record.text("title"), record.text("description")]
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
        .unwrap_or_default();
    format!(
        "{}\t{}",
        record.text("iid").unwrap_or_default(),
        summary.replace(['\r', '\n'], " ")
    )
}

#[async_trait]
impl Handler for IssueLinkCreate {
    async fn handle(&self, call: &Invocation<'_>, console: &Console) -> Result<()> {
        let operator = console.operator();
        let parent = call
            .node
            .as_collection()
            .and_then(|links| links.parent())
            .ok_or_else(|| Error::operation("issue links are only reachable from an issue"))?;
        let source = parent
            .record
            .text("iid")
            .ok_or_else(|| Error::invalid_data("source issue has no 'iid'"))?;
        let project_id = parent.record.get("project_id").cloned().unwrap_or(Value::Null);

        let candidates: Vec<Record> = parent
            .origin
            .list_all()
            .await?
            .iter()
            .map(|issue| issue.record())
            .filter(|record| record.text("iid").as_deref() != Some(source.as_str()))
            .collect();
        let lines: Vec<String> = candidates.iter().map(candidate_line).collect();

        let header = format!("Pick issues to relate to {source} (TAB for multi; ENTER when done)");
        let picked = console.menu().select_many(&lines, &header).await?;
        if picked.is_empty() {
            operator.info("No targets selected, aborting.");
            return Ok(());
        }

        let payload = call
            .operation
            .params
            .iter()
            .find(|p| p.kind == ParamKind::Json)
            .map_or("data", |p| p.name.as_str());
        for index in picked {
            let target = candidates[index].get("iid").cloned().unwrap_or(Value::Null);
            let data = json!({
                "target_project_id": project_id,
                "target_issue_iid": target,
            });
            debug!(from = %source, to = %target, "linking issues");
            call.target
                .invoke(call.selector(), Args::new().with(payload, data))
                .await?;
            operator.success(&format!("🔗 Linked issue {source} → {target}"));
        }
        Ok(())
    }
}

/// The standard registry plus every GitLab override.
pub fn handler_registry() -> HandlerRegistry {
    HandlerRegistry::standard().with_override(ISSUE_LINKS, Selector::CREATE, Arc::new(IssueLinkCreate))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use glnav_core::mock::{MockCollection, MockObject};
    use glnav_core::{Collection, Family, ParentContext, ResourceKind, ResourceNode};
    use glnav_explorer::{MenuAdapter, Resolution};
    use glnav_explorer::mock::{MockOperator, MockPicker};

    const ISSUES: ResourceKind = ResourceKind::new("ProjectIssueManager", &[Family::Crud]);
    const ISSUE: ResourceKind = ResourceKind::new("ProjectIssue", &[Family::Save]);
    const LINKS: ResourceKind = ResourceKind::new(ISSUE_LINKS, &[Family::List, Family::Create, Family::Delete]);

    fn issue(iid: i64, title: &str) -> MockObject {
        MockObject::new(ISSUE, json!({"id": 100 + iid, "iid": iid, "title": title, "project_id": 5}))
    }

    /// Links of issue #1, whose project has issues #1..#3.
    fn links() -> Arc<MockCollection> {
        let issues: Arc<dyn Collection> = Arc::new(MockCollection::new("issues", ISSUES).with_items(vec![
            issue(1, "Crash on start"),
            issue(2, "Slow\nstartup"),
            MockObject::new(ISSUE, json!({"iid": 3, "title": "", "description": "no title", "project_id": 5})),
        ]));
        let parent = ParentContext {
            record: Record::try_from(json!({"id": 101, "iid": 1, "project_id": 5})).unwrap(),
            origin: issues,
        };
        Arc::new(
            MockCollection::new("links", LINKS)
                .with_standard_operations()
                .with_parent(parent),
        )
    }

    fn console(picker: &Arc<MockPicker>, operator: &Arc<MockOperator>) -> Console {
        Console::new(MenuAdapter::new(picker.clone()), operator.clone())
    }

    #[test]
    fn test_registry_overrides_link_create_only() {
        let registry = handler_registry();
        assert_eq!(registry.resolve(ISSUE_LINKS, Selector::CREATE).1, Resolution::Override);
        assert_eq!(registry.resolve(ISSUE_LINKS, Selector::DELETE).1, Resolution::Named);
        assert_eq!(
            registry.resolve("ProjectIssueManager", Selector::CREATE).1,
            Resolution::Named
        );
    }

    #[test]
    fn test_candidate_line_falls_back_to_description() {
        let record = Record::try_from(json!({"iid": 3, "title": "", "description": "a\nb"})).unwrap();
        assert_eq!(candidate_line(&record), "3\ta b");
    }

    #[tokio::test]
    async fn test_links_each_selected_issue() {
        let links = links();
        let picker = Arc::new(MockPicker::new().then_pick(["2\tSlow startup", "3\tno title"]));
        let operator = Arc::new(MockOperator::new());
        let node = ResourceNode::Collection(links.clone());

        handler_registry()
            .dispatch(&node, Selector::CREATE, &console(&picker, &operator))
            .await
            .unwrap();

        let requests = picker.requests().await;
        let request = &requests[0];
        assert!(request.multi);
        assert_eq!(
            request.header,
            "Pick issues to relate to 1 (TAB for multi; ENTER when done)"
        );
        assert_eq!(request.choices, vec!["2\tSlow startup", "3\tno title"]);

        let calls = links.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Selector::CREATE);
        assert_eq!(
            calls[0].1.get("data"),
            Some(&json!({"target_project_id": 5, "target_issue_iid": 2}))
        );
        assert_eq!(
            calls[1].1.get("data"),
            Some(&json!({"target_project_id": 5, "target_issue_iid": 3}))
        );
        assert_eq!(
            operator.messages(),
            vec!["🔗 Linked issue 1 → 2", "🔗 Linked issue 1 → 3"]
        );
        assert!(operator.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pick_aborts_without_linking() {
        let links = links();
        let picker = Arc::new(MockPicker::new().then_cancel());
        let operator = Arc::new(MockOperator::new());
        let node = ResourceNode::Collection(links.clone());

        handler_registry()
            .dispatch(&node, Selector::CREATE, &console(&picker, &operator))
            .await
            .unwrap();

        assert!(links.calls().await.is_empty());
        assert_eq!(operator.messages(), vec!["No targets selected, aborting."]);
    }

    #[tokio::test]
    async fn test_links_without_parent_is_operation_error() {
        let orphan = Arc::new(MockCollection::new("links", LINKS).with_standard_operations());
        let picker = Arc::new(MockPicker::new());
        let operator = Arc::new(MockOperator::new());
        let node = ResourceNode::Collection(orphan);

        let err = handler_registry()
            .dispatch(&node, Selector::CREATE, &console(&picker, &operator))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Operation(_)));
        assert!(picker.requests().await.is_empty());
    }
}
