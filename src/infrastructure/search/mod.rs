//! Search engine client
//!
//! Thin REST wrapper: index lifecycle, NDJSON bulk loading, refresh and
//! count. Bulk responses are inspected per item so that individual document
//! failures are counted instead of failing the batch.

pub mod mappings;

pub use mappings::{inference_endpoint_config, IndexKind, INFERENCE_ID, INFERENCE_TASK};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// One document to index
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    pub index: String,
    pub id: String,
    pub source: Value,
}

/// Result of one bulk request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub indexed: usize,
    pub errors: Vec<String>,
}

impl BulkOutcome {
    pub fn merge(&mut self, other: BulkOutcome) {
        self.indexed += other.indexed;
        self.errors.extend(other.errors);
    }
}

/// Cluster identity returned by `GET /`
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: ClusterVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterVersion {
    pub number: String,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// NDJSON body for `POST /_bulk`
pub fn render_bulk_body(actions: &[BulkAction]) -> Result<String> {
    let mut body = String::new();
    for action in actions {
        let header = serde_json::json!({ "index": { "_index": action.index, "_id": action.id } });
        body.push_str(&serde_json::to_string(&header)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&action.source)?);
        body.push('\n');
    }
    Ok(body)
}

fn outcome_from_response(response: BulkResponse) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    for item in response.items {
        for (_, result) in item {
            if (200..300).contains(&result.status) && result.error.is_none() {
                outcome.indexed += 1;
            } else {
                outcome.errors.push(format!(
                    "{}: status {} {}",
                    result.id.unwrap_or_else(|| "?".to_string()),
                    result.status,
                    result.error.map(|e| e.to_string()).unwrap_or_default()
                ));
            }
        }
    }
    outcome
}

/// Operations the index setup and ingest steps need from the search engine
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn index_exists(&self, index: &str) -> Result<bool>;
    async fn create_index(&self, index: &str, mappings: &Value) -> Result<()>;
    async fn delete_index(&self, index: &str) -> Result<()>;
    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkOutcome>;
    async fn refresh(&self, index: &str) -> Result<()>;
    async fn count(&self, index: &str) -> Result<u64>;
    async fn inference_exists(&self, inference_id: &str) -> Result<bool>;
    async fn put_inference(&self, task_type: &str, inference_id: &str, config: &Value)
        -> Result<()>;
}

/// Search engine REST client
#[derive(Debug, Clone)]
pub struct SearchClient {
    endpoint: String,
    api_key: String,
    http: reqwest::Client,
}

impl SearchClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn auth(&self) -> String {
        format!("ApiKey {}", self.api_key)
    }

    pub async fn info(&self) -> Result<ClusterInfo> {
        self.http
            .get(self.url("/"))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .context("failed to reach search engine")?
            .error_for_status()
            .context("search engine returned non-success status")?
            .json()
            .await
            .context("failed to parse cluster info")
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let res = self
            .http
            .head(self.url(index))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .with_context(|| format!("failed to check index {}", index))?;

        match res.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => anyhow::bail!("unexpected status {} checking index {}", status, index),
        }
    }

    async fn create_index(&self, index: &str, mappings: &Value) -> Result<()> {
        self.http
            .put(self.url(index))
            .header(AUTHORIZATION, self.auth())
            .json(&serde_json::json!({ "mappings": mappings }))
            .send()
            .await
            .with_context(|| format!("failed to create index {}", index))?
            .error_for_status()
            .with_context(|| format!("search engine refused to create index {}", index))?;
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.http
            .delete(self.url(index))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .with_context(|| format!("failed to delete index {}", index))?
            .error_for_status()
            .with_context(|| format!("search engine refused to delete index {}", index))?;
        Ok(())
    }

    /// Index a batch of documents; per-document failures land in `errors`
    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkOutcome> {
        if actions.is_empty() {
            return Ok(BulkOutcome::default());
        }
        let body = render_bulk_body(actions)?;

        let response: BulkResponse = self
            .http
            .post(self.url("/_bulk"))
            .header(AUTHORIZATION, self.auth())
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .context("failed to send bulk request")?
            .error_for_status()
            .context("bulk request returned non-success status")?
            .json()
            .await
            .context("failed to parse bulk response")?;

        Ok(outcome_from_response(response))
    }

    async fn refresh(&self, index: &str) -> Result<()> {
        self.http
            .post(self.url(&format!("{}/_refresh", index)))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .with_context(|| format!("failed to refresh {}", index))?
            .error_for_status()?;
        Ok(())
    }

    async fn count(&self, index: &str) -> Result<u64> {
        let res: CountResponse = self
            .http
            .get(self.url(&format!("{}/_count", index)))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .with_context(|| format!("failed to count {}", index))?
            .error_for_status()?
            .json()
            .await
            .context("failed to parse count response")?;
        Ok(res.count)
    }

    async fn inference_exists(&self, inference_id: &str) -> Result<bool> {
        let res = self
            .http
            .get(self.url(&format!("_inference/{}", inference_id)))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .with_context(|| format!("failed to check inference endpoint {}", inference_id))?;

        match res.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => anyhow::bail!(
                "unexpected status {} checking inference endpoint {}",
                status,
                inference_id
            ),
        }
    }

    async fn put_inference(
        &self,
        task_type: &str,
        inference_id: &str,
        config: &Value,
    ) -> Result<()> {
        self.http
            .put(self.url(&format!("_inference/{}/{}", task_type, inference_id)))
            .header(AUTHORIZATION, self.auth())
            .json(config)
            .send()
            .await
            .with_context(|| format!("failed to create inference endpoint {}", inference_id))?
            .error_for_status()
            .with_context(|| {
                format!("search engine refused inference endpoint {}", inference_id)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_trims_endpoint() {
        let client = SearchClient::new("http://localhost:9200/", "key");
        assert_eq!(client.endpoint(), "http://localhost:9200");
        assert_eq!(client.url("/_bulk"), "http://localhost:9200/_bulk");
        assert_eq!(client.auth(), "ApiKey key");
    }

    #[test]
    fn test_render_bulk_body() {
        let actions = vec![BulkAction {
            index: "beanstack-staff".to_string(),
            id: "staff-0001".to_string(),
            source: json!({"id": "staff-0001", "name": "Jane Doe"}),
        }];
        let body = render_bulk_body(&actions).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let header: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["index"]["_index"], "beanstack-staff");
        assert_eq!(header["index"]["_id"], "staff-0001");
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_bulk_outcome_counts_item_errors() {
        let response: BulkResponse = serde_json::from_value(json!({
            "errors": true,
            "items": [
                {"index": {"_id": "a", "status": 201}},
                {"index": {"_id": "b", "status": 400, "error": {"type": "mapper_parsing_exception"}}},
                {"index": {"_id": "c", "status": 200}}
            ]
        }))
        .unwrap();
        let outcome = outcome_from_response(response);
        assert_eq!(outcome.indexed, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("b: status 400"));
    }
}
