use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracker_api::{EventFeed, EventFilter, ResultStore, SubscriptionId};
use tracker_core::{now_ms, Node};

use crate::{collector, detector, recorder};

/// Root events carrying this name mark a newly ingested source revision;
/// they trigger downstream jobs but are not themselves analysed.
const CHECKOUT_NAME: &str = "checkout";

/// What processing one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Checkout roots are discarded without touching the store.
    SkippedCheckout,
    Processed { failures: usize, regressions: usize },
}

/// The tracking loop: one subscription, one event in flight at a time.
pub struct TrackerService<A> {
    api: Arc<A>,
}

impl<A: ResultStore + EventFeed> TrackerService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Only fully finished job trees are of interest.
    fn subscription_filters() -> EventFilter {
        EventFilter::from([("state".to_string(), "done".to_string())])
    }

    /// Subscribe, process events until shutdown or a feed error, then
    /// release the subscription on every exit path. A subscription failure
    /// is fatal; store failures while processing an event are logged and
    /// the loop goes on.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let subscription = self
            .api
            .subscribe(&Self::subscription_filters())
            .await
            .context("subscribing to completed-job events")?;
        info!(subscription, "tracking regressions");

        let outcome = self.event_loop(subscription, &mut shutdown).await;

        if let Err(e) = self.api.unsubscribe(subscription).await {
            warn!(subscription, "unsubscribe failed: {e:?}");
        }
        outcome
    }

    async fn event_loop(
        &self,
        subscription: SubscriptionId,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            let node = tokio::select! {
                // Cancellation wins over a ready event; an event already
                // being processed still runs to completion below.
                biased;
                _ = shutdown.changed() => {
                    info!("shutdown requested, stopping");
                    return Ok(());
                }
                next = self.api.next_event(subscription) => {
                    // Feed errors are subscription-level: nothing more can
                    // arrive, so the loop stops.
                    next.context("receiving next event")?
                }
            };

            match self.handle_event(&node).await {
                Ok(EventOutcome::SkippedCheckout) => {
                    debug!(node_id = %node.id, "checkout event, nothing to analyse");
                }
                Ok(EventOutcome::Processed {
                    failures,
                    regressions,
                }) => {
                    info!(
                        node_id = %node.id,
                        failures,
                        regressions,
                        age_ms = now_ms() - node.created,
                        "event processed"
                    );
                }
                Err(e) => warn!(node_id = %node.id, "event processing failed: {e:?}"),
            }
        }
    }

    /// One processing step: walk the finished tree for failures and run
    /// detection on each. Per-node errors are logged so one broken record
    /// cannot mask the remaining failures.
    pub async fn handle_event(&self, node: &Node) -> Result<EventOutcome> {
        if node.name == CHECKOUT_NAME {
            return Ok(EventOutcome::SkippedCheckout);
        }

        let failures = collector::collect_failures(self.api.as_ref(), node)
            .await
            .with_context(|| format!("collecting failures under node {}", node.id))?;

        let mut regressions = 0;
        for failing in &failures {
            match detector::detect(self.api.as_ref(), failing).await {
                Ok(Some(last_pass)) => {
                    match recorder::record(self.api.as_ref(), failing, &last_pass).await {
                        Ok(_) => regressions += 1,
                        Err(e) => {
                            warn!(node_id = %failing.id, "recording regression failed: {e:?}")
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(node_id = %failing.id, "regression detection failed: {e:?}"),
            }
        }

        Ok(EventOutcome::Processed {
            failures: failures.len(),
            regressions,
        })
    }
}
