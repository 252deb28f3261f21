use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::error::ApiError;
use crate::feed::{EventFeed, EventFilter, SubscriptionId};
use crate::store::ResultStore;
use async_trait::async_trait;
use tracker_core::{now_ms, Node, NodeFilter, RegressionSubmission};

/// In-memory store + feed for tests. Not durable, but good for unit/small
/// scenario tests of the tracking pipeline.
#[derive(Default)]
pub struct InMemoryApi {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    nodes: Vec<Node>,
    submissions: Vec<RegressionSubmission>,
    events: VecDeque<Node>,
    subscriptions: HashSet<SubscriptionId>,
    next_subscription: SubscriptionId,
    queries_served: usize,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_node(&self, node: Node) {
        self.inner.lock().unwrap().nodes.push(node);
    }

    pub fn push_event(&self, node: Node) {
        self.inner.lock().unwrap().events.push_back(node);
    }

    /// Regression records created so far, oldest first. Created records are
    /// kept out of the seeded node tree so traversals stay fixed.
    pub fn submissions(&self) -> Vec<RegressionSubmission> {
        self.inner.lock().unwrap().submissions.clone()
    }

    pub fn queries_served(&self) -> usize {
        self.inner.lock().unwrap().queries_served
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.lock().unwrap().subscriptions.len()
    }
}

#[async_trait]
impl ResultStore for InMemoryApi {
    async fn query_nodes(&self, filter: &NodeFilter) -> Result<Vec<Node>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.queries_served += 1;
        Ok(inner
            .nodes
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect())
    }

    async fn submit_regression(
        &self,
        regression: &RegressionSubmission,
    ) -> Result<Node, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        let stored = Node {
            id: ulid::Ulid::new().to_string(),
            name: regression.name.clone(),
            group: regression.group.clone(),
            path: regression.path.clone(),
            revision: regression.revision.clone(),
            result: regression.result.clone(),
            state: regression.state.clone(),
            created: now_ms(),
            parent: Some(regression.parent.clone()),
            artifacts: regression.artifacts.clone(),
        };
        inner.submissions.push(regression.clone());
        Ok(stored)
    }
}

#[async_trait]
impl EventFeed for InMemoryApi {
    async fn subscribe(&self, _filters: &EventFilter) -> Result<SubscriptionId, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_subscription += 1;
        let id = inner.next_subscription;
        inner.subscriptions.insert(id);
        Ok(id)
    }

    async fn next_event(&self, subscription: SubscriptionId) -> Result<Node, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.subscriptions.contains(&subscription) {
            return Err(ApiError::FeedClosed);
        }
        // A drained queue means the test fed everything it had; a real feed
        // would pend here instead.
        inner.events.pop_front().ok_or(ApiError::FeedClosed)
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ApiError> {
        self.inner.lock().unwrap().subscriptions.remove(&subscription);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::{NodeResult, NodeState, Revision};

    fn node(id: &str, parent: Option<&str>, created: i64) -> Node {
        Node {
            id: id.to_string(),
            name: "boot".to_string(),
            group: Some("arm64".to_string()),
            path: "boot/arm64".to_string(),
            revision: Revision {
                tree: "mainline".to_string(),
                url: "https://git.example.org/mainline.git".to_string(),
                branch: "master".to_string(),
                commit: "deadbeef".to_string(),
                describe: None,
            },
            result: Some(NodeResult::Fail),
            state: NodeState::Done,
            created,
            parent: parent.map(str::to_string),
            artifacts: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_children_query() {
        let api = InMemoryApi::new();
        api.seed_node(node("root", None, 10));
        api.seed_node(node("a", Some("root"), 20));
        api.seed_node(node("b", Some("root"), 30));
        api.seed_node(node("c", Some("a"), 40));

        let children = api
            .query_nodes(&NodeFilter::children_of("root"))
            .await
            .unwrap();
        let mut ids: Vec<_> = children.iter().map(|n| n.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(api.queries_served(), 1);
    }

    #[tokio::test]
    async fn test_lineage_query_respects_created_bound() {
        let api = InMemoryApi::new();
        api.seed_node(node("old", None, 100));
        api.seed_node(node("new", None, 300));
        let failing = node("failing", None, 200);

        let prior = api
            .query_nodes(&NodeFilter::lineage_of(&failing).unwrap())
            .await
            .unwrap();
        assert_eq!(prior.len(), 1);
        assert_eq!(prior[0].id, "old");
    }

    #[tokio::test]
    async fn test_submit_assigns_identity_and_records() {
        let api = InMemoryApi::new();
        let failing = node("failing", Some("root"), 200);
        let mut last_pass = node("pass", Some("old-root"), 100);
        last_pass.result = Some(NodeResult::Pass);

        let sub = tracker_core::build_submission(&failing, &last_pass);
        let stored = api.submit_regression(&sub).await.unwrap();
        assert!(!stored.id.is_empty());
        assert_eq!(stored.parent.as_deref(), Some("failing"));
        assert_eq!(api.submissions().len(), 1);
        assert_eq!(api.submissions()[0].regression_data.0.id, "pass");
    }

    #[tokio::test]
    async fn test_events_drain_in_order() {
        let api = InMemoryApi::new();
        let sub = api.subscribe(&EventFilter::new()).await.unwrap();
        api.push_event(node("first", None, 10));
        api.push_event(node("second", None, 20));

        assert_eq!(api.next_event(sub).await.unwrap().id, "first");
        assert_eq!(api.next_event(sub).await.unwrap().id, "second");
        assert!(matches!(
            api.next_event(sub).await,
            Err(ApiError::FeedClosed)
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_the_feed() {
        let api = InMemoryApi::new();
        let sub = api.subscribe(&EventFilter::new()).await.unwrap();
        assert_eq!(api.active_subscriptions(), 1);

        api.unsubscribe(sub).await.unwrap();
        assert_eq!(api.active_subscriptions(), 0);

        api.push_event(node("late", None, 10));
        assert!(matches!(
            api.next_event(sub).await,
            Err(ApiError::FeedClosed)
        ));
    }
}
