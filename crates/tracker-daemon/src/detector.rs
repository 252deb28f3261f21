use anyhow::{Context, Result};
use tracker_api::ResultStore;
use tracker_core::{find_transition, Node, NodeFilter};

/// Decide whether `failing` is a fresh pass->fail transition for its
/// lineage. Returns the run it regressed from, or `None` when the lineage
/// has never run before or its most recent prior run was already not
/// passing.
pub async fn detect<S: ResultStore>(store: &S, failing: &Node) -> Result<Option<Node>> {
    let filter = NodeFilter::lineage_of(failing)?;
    let prior = store
        .query_nodes(&filter)
        .await
        .with_context(|| format!("querying prior runs for node {}", failing.id))?;
    Ok(find_transition(&prior).cloned())
}
