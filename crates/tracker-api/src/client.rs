use crate::error::ApiError;
use crate::feed::{EventFeed, EventFilter, SubscriptionId};
use crate::store::ResultStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracker_core::{Node, NodeFilter, RegressionSubmission};

/// HTTP client for the results API, covering both the node store and the
/// pub/sub event feed.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Querystring encoding of a node filter. Range constraints use the
/// `__lt` suffix convention; nested fields use dotted names.
pub fn filter_query(filter: &NodeFilter) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(v) = &filter.parent {
        pairs.push(("parent", v.clone()));
    }
    if let Some(v) = &filter.name {
        pairs.push(("name", v.clone()));
    }
    if let Some(v) = &filter.group {
        pairs.push(("group", v.clone()));
    }
    if let Some(v) = &filter.path {
        pairs.push(("path", v.clone()));
    }
    if let Some(v) = &filter.revision_tree {
        pairs.push(("revision.tree", v.clone()));
    }
    if let Some(v) = &filter.revision_branch {
        pairs.push(("revision.branch", v.clone()));
    }
    if let Some(v) = &filter.revision_url {
        pairs.push(("revision.url", v.clone()));
    }
    if let Some(v) = filter.created_before {
        pairs.push(("created__lt", v.to_string()));
    }
    pairs
}

async fn checked(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Deserialize)]
struct Subscription {
    id: SubscriptionId,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    data: Node,
}

#[async_trait]
impl ResultStore for ApiClient {
    async fn query_nodes(&self, filter: &NodeFilter) -> Result<Vec<Node>, ApiError> {
        let resp = self
            .authorize(self.http.get(self.url("nodes")).query(&filter_query(filter)))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    async fn submit_regression(
        &self,
        regression: &RegressionSubmission,
    ) -> Result<Node, ApiError> {
        let resp = self
            .authorize(self.http.post(self.url("nodes")).json(regression))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }
}

#[async_trait]
impl EventFeed for ApiClient {
    async fn subscribe(&self, filters: &EventFilter) -> Result<SubscriptionId, ApiError> {
        let resp = self
            .authorize(self.http.post(self.url("subscribe/node")).json(filters))
            .send()
            .await?;
        let sub: Subscription = checked(resp).await?.json().await?;
        Ok(sub.id)
    }

    async fn next_event(&self, subscription: SubscriptionId) -> Result<Node, ApiError> {
        // Long poll; the server answers 204 as a keep-alive when no event
        // arrived within its window.
        loop {
            let resp = self
                .authorize(self.http.get(self.url(&format!("listen/{subscription}"))))
                .send()
                .await?;
            let resp = checked(resp).await?;
            if resp.status() == StatusCode::NO_CONTENT {
                continue;
            }
            let envelope: EventEnvelope = resp.json().await?;
            return Ok(envelope.data);
        }
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ApiError> {
        let resp = self
            .authorize(self.http.post(self.url(&format!("unsubscribe/{subscription}"))))
            .send()
            .await?;
        checked(resp).await?;
        Ok(())
    }
}
