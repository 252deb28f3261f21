use crate::time::EpochMs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A globally unique identifier (ULID as string by convention, assigned by
/// the result store).
pub type Id = String;

/// Outcome of one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeResult {
    Pass,
    Fail,
    Incomplete,
}

/// Lifecycle state of a node in the result store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Running,
    Available,
    Closing,
    Done,
}

/// Source snapshot a result was produced against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Revision {
    pub tree: String,
    pub url: String,
    pub branch: String,
    pub commit: String,
    /// Human-readable description, e.g. a `git describe` string.
    #[serde(default)]
    pub describe: Option<String>,
}

/// One result record. Parent references form a tree rooted at a checkout
/// node; the store guarantees acyclicity, this crate does not verify it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    pub path: String,
    pub revision: Revision,
    #[serde(default)]
    pub result: Option<NodeResult>,
    pub state: NodeState,
    pub created: EpochMs,
    #[serde(default)]
    pub parent: Option<Id>,
    /// Opaque artifact name -> URL map, carried into regression records.
    #[serde(default)]
    pub artifacts: BTreeMap<String, String>,
}

/// A pass->fail transition, submitted to the store's create operation.
/// Create-once: no update or delete path exists for these records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegressionSubmission {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    pub path: String,
    pub revision: Revision,
    pub result: Option<NodeResult>,
    pub state: NodeState,
    pub artifacts: BTreeMap<String, String>,
    /// Id of the failing node this regression was derived from.
    pub parent: Id,
    /// The evidence pair: the last passing run, then the failing run.
    pub regression_data: (Node, Node),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineageError {
    #[error("node {0} has no group; cannot build a lineage query")]
    MissingGroup(Id),
}

/// Typed query filter for the result store. Unset fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    pub parent: Option<Id>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub path: Option<String>,
    pub revision_tree: Option<String>,
    pub revision_branch: Option<String>,
    pub revision_url: Option<String>,
    /// Strict upper bound on `created`.
    pub created_before: Option<EpochMs>,
}

impl NodeFilter {
    /// Filter matching the direct children of `parent`.
    pub fn children_of(parent: &str) -> Self {
        Self {
            parent: Some(parent.to_string()),
            ..Default::default()
        }
    }

    /// Filter matching earlier runs of the same lineage as `node`:
    /// same name/group/path against the same tree/branch/url, created
    /// strictly before it.
    pub fn lineage_of(node: &Node) -> Result<Self, LineageError> {
        let group = node
            .group
            .clone()
            .ok_or_else(|| LineageError::MissingGroup(node.id.clone()))?;
        Ok(Self {
            parent: None,
            name: Some(node.name.clone()),
            group: Some(group),
            path: Some(node.path.clone()),
            revision_tree: Some(node.revision.tree.clone()),
            revision_branch: Some(node.revision.branch.clone()),
            revision_url: Some(node.revision.url.clone()),
            created_before: Some(node.created),
        })
    }

    /// Whether `node` satisfies every constraint set on this filter.
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(parent) = &self.parent {
            if node.parent.as_deref() != Some(parent.as_str()) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &node.name != name {
                return false;
            }
        }
        if let Some(group) = &self.group {
            if node.group.as_deref() != Some(group.as_str()) {
                return false;
            }
        }
        if let Some(path) = &self.path {
            if &node.path != path {
                return false;
            }
        }
        if let Some(tree) = &self.revision_tree {
            if &node.revision.tree != tree {
                return false;
            }
        }
        if let Some(branch) = &self.revision_branch {
            if &node.revision.branch != branch {
                return false;
            }
        }
        if let Some(url) = &self.revision_url {
            if &node.revision.url != url {
                return false;
            }
        }
        if let Some(bound) = self.created_before {
            if node.created >= bound {
                return false;
            }
        }
        true
    }
}
