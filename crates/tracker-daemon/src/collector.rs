use std::collections::HashSet;

use tracker_api::{ApiError, ResultStore};
use tracker_core::{Id, Node, NodeFilter, NodeResult};

/// Walk the descendant tree of `root` and collect every failing node.
///
/// Explicit worklist instead of recursion: the tree lives in the store and
/// its depth is not bounded by anything this process controls. The visited
/// set makes traversal terminate even on a corrupt parent graph. Returned
/// order is unspecified.
pub async fn collect_failures<S: ResultStore>(
    store: &S,
    root: &Node,
) -> Result<Vec<Node>, ApiError> {
    let mut failures = Vec::new();
    let mut visited: HashSet<Id> = HashSet::new();
    visited.insert(root.id.clone());
    let mut pending = vec![root.id.clone()];

    while let Some(id) = pending.pop() {
        for child in store.query_nodes(&NodeFilter::children_of(&id)).await? {
            if !visited.insert(child.id.clone()) {
                continue;
            }
            // Failures can sit under non-failing branches, so every child
            // is traversed regardless of its own outcome.
            if child.result == Some(NodeResult::Fail) {
                failures.push(child.clone());
            }
            pending.push(child.id);
        }
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_api::InMemoryApi;
    use tracker_core::{NodeState, Revision};

    fn node(id: &str, parent: Option<&str>, result: Option<NodeResult>) -> Node {
        Node {
            id: id.to_string(),
            name: id.to_string(),
            group: Some("arm64".to_string()),
            path: format!("checkout/{id}"),
            revision: Revision {
                tree: "mainline".to_string(),
                url: "https://git.example.org/mainline.git".to_string(),
                branch: "master".to_string(),
                commit: "deadbeef".to_string(),
                describe: None,
            },
            result,
            state: NodeState::Done,
            created: 100,
            parent: parent.map(str::to_string),
            artifacts: Default::default(),
        }
    }

    #[tokio::test]
    async fn finds_failures_under_passing_branches() {
        let api = InMemoryApi::new();
        let root = node("root", None, Some(NodeResult::Pass));
        api.seed_node(root.clone());
        api.seed_node(node("build", Some("root"), Some(NodeResult::Pass)));
        api.seed_node(node("boot", Some("build"), Some(NodeResult::Pass)));
        api.seed_node(node("login", Some("boot"), Some(NodeResult::Fail)));

        let failures = collect_failures(&api, &root).await.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "login");
    }

    #[tokio::test]
    async fn collects_failures_at_every_depth() {
        let api = InMemoryApi::new();
        let root = node("root", None, Some(NodeResult::Fail));
        api.seed_node(root.clone());
        api.seed_node(node("a", Some("root"), Some(NodeResult::Fail)));
        api.seed_node(node("b", Some("root"), Some(NodeResult::Incomplete)));
        api.seed_node(node("b1", Some("b"), Some(NodeResult::Fail)));
        api.seed_node(node("b2", Some("b"), None));

        let failures = collect_failures(&api, &root).await.unwrap();
        let mut ids: Vec<_> = failures.iter().map(|n| n.id.as_str()).collect();
        ids.sort();
        // The root itself is the event payload, not a descendant.
        assert_eq!(ids, vec!["a", "b1"]);
    }

    #[tokio::test]
    async fn empty_tree_yields_no_failures() {
        let api = InMemoryApi::new();
        let root = node("root", None, Some(NodeResult::Pass));
        api.seed_node(root.clone());
        api.seed_node(node("build", Some("root"), Some(NodeResult::Pass)));

        let failures = collect_failures(&api, &root).await.unwrap();
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn corrupt_parent_cycle_terminates() {
        let api = InMemoryApi::new();
        let root = node("root", None, Some(NodeResult::Pass));
        api.seed_node(root.clone());
        api.seed_node(node("child", Some("root"), Some(NodeResult::Fail)));
        // A corrupt record closing a cycle back onto the root's id.
        api.seed_node(node("root", Some("child"), Some(NodeResult::Fail)));

        let failures = collect_failures(&api, &root).await.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "child");
    }
}
