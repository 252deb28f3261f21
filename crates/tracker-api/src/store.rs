use crate::error::ApiError;
use async_trait::async_trait;
use tracker_core::{Node, NodeFilter, RegressionSubmission};

/// Read/create access to the result store.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Fetch every node matching `filter`. Result order is the store's
    /// native order; callers must not rely on it.
    async fn query_nodes(&self, filter: &NodeFilter) -> Result<Vec<Node>, ApiError>;

    /// Create a regression record: one durable write, no existence check.
    /// Returns the stored record with its assigned identity.
    async fn submit_regression(
        &self,
        regression: &RegressionSubmission,
    ) -> Result<Node, ApiError>;
}
