use crate::error::ApiError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracker_core::Node;

/// Subscription handle returned by the feed.
pub type SubscriptionId = u64;

/// Field -> value constraints an event must match, e.g. `{state: done}`.
pub type EventFilter = BTreeMap<String, String>;

/// Subscribe/receive access to the pub/sub event feed.
#[async_trait]
pub trait EventFeed: Send + Sync {
    async fn subscribe(&self, filters: &EventFilter) -> Result<SubscriptionId, ApiError>;

    /// Block until the next matching event arrives. There is no timeout
    /// path: the call pends until an event or a feed error.
    async fn next_event(&self, subscription: SubscriptionId) -> Result<Node, ApiError>;

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ApiError>;
}
