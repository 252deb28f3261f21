use anyhow::{Context, Result};
use tracing::info;
use tracker_api::ResultStore;
use tracker_core::{build_submission, Node};

/// Record a detected transition: exactly one create, no existence check
/// and no retry. Redelivered events can therefore produce duplicate
/// records; the store tolerates them.
pub async fn record<S: ResultStore>(
    store: &S,
    failing: &Node,
    last_pass: &Node,
) -> Result<Node> {
    let submission = build_submission(failing, last_pass);
    let stored = store
        .submit_regression(&submission)
        .await
        .with_context(|| format!("submitting regression for node {}", failing.id))?;
    info!(node_id = %failing.id, regression_id = %stored.id, "regression recorded");
    Ok(stored)
}
