//! The pass->fail transition decision.
//!
//! This stays pure and testable; the daemon applies it to store queries.
//! Only the immediately preceding run of a lineage matters: an older pass
//! behind a continued failure does not make the failure "new" again.

use crate::model::{Node, NodeResult, RegressionSubmission};

/// Most recent node by `created`. Ties keep the input (store) order; the
/// result store's native order is an accepted ambiguity, not a total order.
pub fn most_recent(candidates: &[Node]) -> Option<&Node> {
    candidates
        .iter()
        .reduce(|best, n| if n.created > best.created { n } else { best })
}

/// Given the prior same-lineage runs of a failing node, return the run it
/// regressed from. `None` means no regression: either the lineage has never
/// run before, or the most recent prior run was already not passing.
pub fn find_transition(candidates: &[Node]) -> Option<&Node> {
    most_recent(candidates).filter(|n| n.result == Some(NodeResult::Pass))
}

/// Materialize the regression record for a detected transition.
pub fn build_submission(failing: &Node, last_pass: &Node) -> RegressionSubmission {
    RegressionSubmission {
        name: failing.name.clone(),
        group: failing.group.clone(),
        path: failing.path.clone(),
        revision: failing.revision.clone(),
        result: failing.result.clone(),
        state: failing.state.clone(),
        artifacts: failing.artifacts.clone(),
        parent: failing.id.clone(),
        regression_data: (last_pass.clone(), failing.clone()),
    }
}
