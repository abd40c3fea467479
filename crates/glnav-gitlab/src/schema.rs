//! The GitLab resource manifest.
//!
//! Static descriptors for every collection glnav exposes: where it lives
//! under its owner, which capability families the collection declares,
//! and what its objects look like (families, ID attribute, nested
//! collections). Kind names follow the GitLab object model
//! (`ProjectIssueManager`, `ProjectIssue`, ...).

use glnav_core::{Family, ResourceKind};

/// A collection under the root or under an object.
#[derive(Clone, Copy, Debug)]
pub struct CollectionSpec {
    /// Attribute name under the owner; humanized for menus.
    pub attribute: &'static str,
    /// Path below the owner, `/`-separated.
    pub path: &'static str,
    /// Collection kind and families.
    pub kind: ResourceKind,
    /// Shape of the listed objects.
    pub object: ObjectSpec,
}

/// Objects listed from a collection.
#[derive(Clone, Copy, Debug)]
pub struct ObjectSpec {
    /// Object kind and families.
    pub kind: ResourceKind,
    /// Attribute addressing the object under its collection.
    pub id_field: &'static str,
    /// Sub-path of the raw content, for downloadable objects.
    pub download: Option<&'static str>,
    /// Nested collections.
    pub children: &'static [CollectionSpec],
}

/// Kind name of the issue link collection.
pub const ISSUE_LINKS: &str = "ProjectIssueLinkManager";

const fn collection(
    attribute: &'static str,
    path: &'static str,
    kind: ResourceKind,
    object: ObjectSpec,
) -> CollectionSpec {
    CollectionSpec {
        attribute,
        path,
        kind,
        object,
    }
}

const fn object(kind: ResourceKind, id_field: &'static str) -> ObjectSpec {
    ObjectSpec {
        kind,
        id_field,
        download: None,
        children: &[],
    }
}

const fn parent(kind: ResourceKind, id_field: &'static str, children: &'static [CollectionSpec]) -> ObjectSpec {
    ObjectSpec {
        kind,
        id_field,
        download: None,
        children,
    }
}

const fn downloadable(kind: ResourceKind, id_field: &'static str, download: &'static str) -> ObjectSpec {
    ObjectSpec {
        kind,
        id_field,
        download: Some(download),
        children: &[],
    }
}

const fn kind(name: &'static str, families: &'static [Family]) -> ResourceKind {
    ResourceKind::new(name, families)
}

use Family::*;

const EDITABLE: &[Family] = &[Save, ObjectDelete];

// ============================================================================
// Nested under issues and merge requests
// ============================================================================

const ISSUE_CHILDREN: &[CollectionSpec] = &[
    collection(
        "links",
        "links",
        kind(ISSUE_LINKS, &[List, Create, Delete]),
        object(kind("ProjectIssueLink", &[ObjectDelete]), "issue_link_id"),
    ),
    collection(
        "notes",
        "notes",
        kind("ProjectIssueNoteManager", &[Crud]),
        object(kind("ProjectIssueNote", EDITABLE), "id"),
    ),
];

const MERGE_REQUEST_CHILDREN: &[CollectionSpec] = &[collection(
    "notes",
    "notes",
    kind("ProjectMergeRequestNoteManager", &[Crud]),
    object(kind("ProjectMergeRequestNote", EDITABLE), "id"),
)];

// ============================================================================
// Nested under projects
// ============================================================================

const PROJECT_CHILDREN: &[CollectionSpec] = &[
    collection(
        "issues",
        "issues",
        kind("ProjectIssueManager", &[Crud]),
        parent(
            kind(
                "ProjectIssue",
                &[
                    Refresh,
                    Save,
                    ObjectDelete,
                    UserAgentDetail,
                    Subscribable,
                    Todo,
                    TimeTracking,
                    Participants,
                ],
            ),
            "iid",
            ISSUE_CHILDREN,
        ),
    ),
    collection(
        "merge_requests",
        "merge_requests",
        kind("ProjectMergeRequestManager", &[Crud]),
        parent(
            kind(
                "ProjectMergeRequest",
                &[Refresh, Save, Subscribable, Todo, TimeTracking, Participants],
            ),
            "iid",
            MERGE_REQUEST_CHILDREN,
        ),
    ),
    collection(
        "members",
        "members",
        kind("ProjectMemberManager", &[Crud]),
        object(kind("ProjectMember", EDITABLE), "id"),
    ),
    collection(
        "access_requests",
        "access_requests",
        kind("ProjectAccessRequestManager", &[List, Create, Delete]),
        object(kind("ProjectAccessRequest", &[AccessRequest, ObjectDelete]), "id"),
    ),
    collection(
        "badges",
        "badges",
        kind("ProjectBadgeManager", &[BadgeRender, Crud]),
        object(kind("ProjectBadge", EDITABLE), "id"),
    ),
    collection(
        "pipelines",
        "pipelines",
        kind("ProjectPipelineManager", &[Retrieve, Create, Delete]),
        object(kind("ProjectPipeline", &[Refresh, ObjectDelete]), "id"),
    ),
    collection(
        "jobs",
        "jobs",
        kind("ProjectJobManager", &[Retrieve]),
        downloadable(kind("ProjectJob", &[Refresh, Download]), "id", "artifacts"),
    ),
    collection(
        "branches",
        "repository/branches",
        kind("ProjectBranchManager", &[NoUpdate]),
        object(kind("ProjectBranch", &[ObjectDelete]), "name"),
    ),
    collection(
        "tags",
        "repository/tags",
        kind("ProjectTagManager", &[NoUpdate]),
        object(kind("ProjectTag", &[ObjectDelete]), "name"),
    ),
    collection(
        "labels",
        "labels",
        kind("ProjectLabelManager", &[Crud]),
        object(kind("ProjectLabel", &[Subscribable, Save, ObjectDelete]), "id"),
    ),
    collection(
        "milestones",
        "milestones",
        kind("ProjectMilestoneManager", &[Crud]),
        object(kind("ProjectMilestone", EDITABLE), "id"),
    ),
    collection(
        "variables",
        "variables",
        kind("ProjectVariableManager", &[Crud]),
        object(kind("ProjectVariable", EDITABLE), "key"),
    ),
    collection(
        "snippets",
        "snippets",
        kind("ProjectSnippetManager", &[Crud]),
        downloadable(
            kind("ProjectSnippet", &[Save, ObjectDelete, UserAgentDetail, Download]),
            "id",
            "raw",
        ),
    ),
    collection(
        "custom_attributes",
        "custom_attributes",
        kind("ProjectCustomAttributeManager", &[Retrieve, Set, Delete]),
        object(kind("ProjectCustomAttribute", &[ObjectDelete]), "key"),
    ),
];

// ============================================================================
// Nested under groups and users
// ============================================================================

const GROUP_CHILDREN: &[CollectionSpec] = &[
    collection(
        "epics",
        "epics",
        kind("GroupEpicManager", &[Crud]),
        object(kind("GroupEpic", EDITABLE), "iid"),
    ),
    collection(
        "members",
        "members",
        kind("GroupMemberManager", &[Crud]),
        object(kind("GroupMember", EDITABLE), "id"),
    ),
    collection(
        "subgroups",
        "subgroups",
        kind("GroupSubgroupManager", &[List]),
        object(kind("GroupSubgroup", &[]), "id"),
    ),
    collection(
        "access_requests",
        "access_requests",
        kind("GroupAccessRequestManager", &[List, Create, Delete]),
        object(kind("GroupAccessRequest", &[AccessRequest, ObjectDelete]), "id"),
    ),
    collection(
        "badges",
        "badges",
        kind("GroupBadgeManager", &[BadgeRender, Crud]),
        object(kind("GroupBadge", EDITABLE), "id"),
    ),
    collection(
        "labels",
        "labels",
        kind("GroupLabelManager", &[Crud]),
        object(kind("GroupLabel", &[Subscribable, Save, ObjectDelete]), "id"),
    ),
    collection(
        "milestones",
        "milestones",
        kind("GroupMilestoneManager", &[Crud]),
        object(kind("GroupMilestone", EDITABLE), "id"),
    ),
    collection(
        "variables",
        "variables",
        kind("GroupVariableManager", &[Crud]),
        object(kind("GroupVariable", EDITABLE), "key"),
    ),
];

const USER_CHILDREN: &[CollectionSpec] = &[collection(
    "custom_attributes",
    "custom_attributes",
    kind("UserCustomAttributeManager", &[Retrieve, Set, Delete]),
    object(kind("UserCustomAttribute", &[ObjectDelete]), "key"),
)];

// ============================================================================
// Top level
// ============================================================================

/// Collections reachable from the root, in menu order.
pub static TOP_LEVEL: &[CollectionSpec] = &[
    collection(
        "projects",
        "projects",
        kind("ProjectManager", &[Crud]),
        parent(kind("Project", &[Refresh, Save, ObjectDelete]), "id", PROJECT_CHILDREN),
    ),
    collection(
        "groups",
        "groups",
        kind("GroupManager", &[Crud]),
        parent(kind("Group", &[Refresh, Save, ObjectDelete]), "id", GROUP_CHILDREN),
    ),
    collection(
        "users",
        "users",
        kind("UserManager", &[Crud]),
        parent(kind("User", &[Refresh, Save, ObjectDelete]), "id", USER_CHILDREN),
    ),
    collection(
        "user",
        "user",
        kind("CurrentUserManager", &[GetWithoutId]),
        object(kind("CurrentUser", &[Refresh]), "id"),
    ),
    collection(
        "issues",
        "issues",
        kind("IssueManager", &[List]),
        object(kind("Issue", &[]), "id"),
    ),
    collection(
        "merge_requests",
        "merge_requests",
        kind("MergeRequestManager", &[List]),
        object(kind("MergeRequest", &[]), "id"),
    ),
    collection(
        "snippets",
        "snippets",
        kind("SnippetManager", &[Crud]),
        downloadable(
            kind("Snippet", &[Refresh, Save, ObjectDelete, UserAgentDetail, Download]),
            "id",
            "raw",
        ),
    ),
    collection(
        "todos",
        "todos",
        kind("TodoManager", &[List]),
        object(kind("Todo", &[]), "id"),
    ),
];

/// Visit every collection spec in the manifest, depth first.
pub fn walk(visit: &mut dyn FnMut(&'static CollectionSpec, usize)) {
    fn go(specs: &'static [CollectionSpec], depth: usize, visit: &mut dyn FnMut(&'static CollectionSpec, usize)) {
        for spec in specs {
            visit(spec, depth);
            go(spec.object.children, depth + 1, visit);
        }
    }
    go(TOP_LEVEL, 0, visit);
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_attributes_unique_per_owner() {
        let mut owners: Vec<&'static [CollectionSpec]> = vec![TOP_LEVEL];
        walk(&mut |spec, _| owners.push(spec.object.children));
        for children in owners {
            let mut seen = HashSet::new();
            for spec in children {
                assert!(seen.insert(spec.attribute), "duplicate {}", spec.attribute);
            }
        }
    }

    #[test]
    fn test_kind_names_unique() {
        let mut seen = HashSet::new();
        walk(&mut |spec, _| {
            assert!(seen.insert(spec.kind.name), "duplicate {}", spec.kind.name);
            assert!(seen.insert(spec.object.kind.name), "duplicate {}", spec.object.kind.name);
        });
    }

    #[test]
    fn test_downloadable_objects_declare_download() {
        walk(&mut |spec, _| {
            let declares = spec.object.kind.families.contains(&Download);
            assert_eq!(declares, spec.object.download.is_some(), "{}", spec.object.kind.name);
        });
    }

    #[test]
    fn test_issue_links_nested_under_project_issues() {
        let mut found = None;
        walk(&mut |spec, depth| {
            if spec.kind.name == ISSUE_LINKS {
                found = Some(depth);
            }
        });
        assert_eq!(found, Some(2));
    }
}
