//! Hosted agent platform client
//!
//! `KibanaClient` carries the platform headers and backs two seams:
//! `Conversation` forwards one user turn and returns the reply with the
//! conversation id to continue the thread; `AgentPlatform` manages settings,
//! tools, the agent and workflows during setup.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::domain::{AgentDefinition, ToolDefinition};

/// Reply used when the agent answers with nothing
pub const EMPTY_REPLY: &str = "No response from agent.";

/// One agent turn
#[derive(Debug, Clone, PartialEq)]
pub struct ConverseReply {
    pub conversation_id: Option<String>,
    pub message: String,
}

/// Conversational endpoint seam used by the relay
#[async_trait]
pub trait Conversation: Send + Sync {
    async fn converse(&self, input: &str, conversation_id: Option<&str>) -> Result<ConverseReply>;
}

#[derive(Debug, Serialize)]
struct ConverseRequest<'a> {
    input: &'a str,
    agent_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ConverseResponse {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    response: Option<ResponseBody>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseBody {
    Text(String),
    Object {
        #[serde(default)]
        message: String,
    },
}

impl ConverseResponse {
    fn into_reply(self) -> ConverseReply {
        let message = match self.response {
            Some(ResponseBody::Text(text)) => text,
            Some(ResponseBody::Object { message }) => message,
            None => String::new(),
        };
        ConverseReply {
            conversation_id: self.conversation_id,
            message: if message.trim().is_empty() {
                EMPTY_REPLY.to_string()
            } else {
                message
            },
        }
    }
}

/// Reduce an endpoint to `scheme://host[:port]`
pub fn base_url(endpoint: &str) -> Result<String> {
    let parsed = Url::parse(endpoint).with_context(|| format!("invalid endpoint '{}'", endpoint))?;
    let host = parsed
        .host_str()
        .with_context(|| format!("endpoint '{}' has no host", endpoint))?;
    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Settings body for a workflow after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowUpdate {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

/// Workflow state reported by the platform
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "validationErrors", default)]
    pub validation_errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CreatedWorkflow {
    id: String,
}

/// Setup operations on the agent platform
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    /// Apply advanced settings, e.g. `{"agentBuilder:enabled": true}`
    async fn update_settings(&self, changes: &Value) -> Result<()>;

    async fn agent_exists(&self, id: &str) -> Result<bool>;
    async fn delete_agent(&self, id: &str) -> Result<()>;
    async fn create_agent(&self, agent: &AgentDefinition) -> Result<()>;

    async fn tool_exists(&self, id: &str) -> Result<bool>;
    async fn delete_tool(&self, id: &str) -> Result<()>;
    async fn create_tool(&self, tool: &ToolDefinition) -> Result<()>;

    /// Create a workflow from its YAML source and return the platform id
    async fn create_workflow(&self, yaml: &str) -> Result<String>;
    async fn update_workflow(&self, id: &str, update: &WorkflowUpdate) -> Result<WorkflowState>;
    /// `false` when the workflow was already gone
    async fn delete_workflow(&self, id: &str) -> Result<bool>;
}

/// Authenticated client for the platform's HTTP API
#[derive(Debug, Clone)]
pub struct KibanaClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl KibanaClient {
    pub fn new(endpoint: &str, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url(endpoint)?,
            api_key,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("ApiKey {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header("kbn-xsrf", "true")
            .header("elastic-api-version", "2023-10-31")
            .header("x-elastic-internal-origin", "kibana")
    }

    /// `GET` a resource: 200 means it exists, 404 that it does not
    async fn exists(&self, path: &str) -> Result<bool> {
        let res = self
            .request(Method::GET, path)
            .send()
            .await
            .with_context(|| format!("failed to check {}", path))?;
        match res.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => anyhow::bail!(
                "unexpected status {} checking {}: {}",
                status,
                path,
                res.text().await.unwrap_or_default()
            ),
        }
    }

    async fn send_ok(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let res = builder
            .send()
            .await
            .with_context(|| format!("failed to {}", what))?;
        let status = res.status();
        if !status.is_success() {
            anyhow::bail!(
                "failed to {}: {} - {}",
                what,
                status,
                res.text().await.unwrap_or_default()
            );
        }
        Ok(res)
    }
}

#[async_trait]
impl AgentPlatform for KibanaClient {
    async fn update_settings(&self, changes: &Value) -> Result<()> {
        let body = serde_json::json!({ "changes": changes });
        self.send_ok(
            self.request(Method::POST, "/api/kibana/settings").json(&body),
            "update settings",
        )
        .await?;
        Ok(())
    }

    async fn agent_exists(&self, id: &str) -> Result<bool> {
        self.exists(&format!("/api/agent_builder/agents/{}", id)).await
    }

    async fn delete_agent(&self, id: &str) -> Result<()> {
        let path = format!("/api/agent_builder/agents/{}", id);
        self.send_ok(self.request(Method::DELETE, &path), &format!("delete agent '{}'", id))
            .await?;
        Ok(())
    }

    async fn create_agent(&self, agent: &AgentDefinition) -> Result<()> {
        self.send_ok(
            self.request(Method::POST, "/api/agent_builder/agents").json(agent),
            &format!("create agent '{}'", agent.id),
        )
        .await?;
        Ok(())
    }

    async fn tool_exists(&self, id: &str) -> Result<bool> {
        self.exists(&format!("/api/agent_builder/tools/{}", id)).await
    }

    async fn delete_tool(&self, id: &str) -> Result<()> {
        let path = format!("/api/agent_builder/tools/{}", id);
        self.send_ok(self.request(Method::DELETE, &path), &format!("delete tool '{}'", id))
            .await?;
        Ok(())
    }

    async fn create_tool(&self, tool: &ToolDefinition) -> Result<()> {
        self.send_ok(
            self.request(Method::POST, "/api/agent_builder/tools").json(tool),
            &format!("create tool '{}'", tool.id),
        )
        .await?;
        Ok(())
    }

    async fn create_workflow(&self, yaml: &str) -> Result<String> {
        let body = serde_json::json!({ "yaml": yaml });
        let created: CreatedWorkflow = self
            .send_ok(
                self.request(Method::POST, "/api/workflows").json(&body),
                "create workflow",
            )
            .await?
            .json()
            .await
            .context("failed to parse created workflow")?;
        Ok(created.id)
    }

    async fn update_workflow(&self, id: &str, update: &WorkflowUpdate) -> Result<WorkflowState> {
        let path = format!("/api/workflows/{}", id);
        self.send_ok(
            self.request(Method::PUT, &path).json(update),
            &format!("update workflow '{}'", id),
        )
        .await?
        .json()
        .await
        .context("failed to parse workflow state")
    }

    async fn delete_workflow(&self, id: &str) -> Result<bool> {
        let path = format!("/api/workflows/{}", id);
        let res = self
            .request(Method::DELETE, &path)
            .send()
            .await
            .with_context(|| format!("failed to delete workflow '{}'", id))?;
        match res.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => anyhow::bail!("failed to delete workflow '{}': {}", id, status),
        }
    }
}

/// Converse client for one agent
#[derive(Debug, Clone)]
pub struct ConverseClient {
    kibana: KibanaClient,
    agent_id: String,
}

impl ConverseClient {
    pub fn new(endpoint: &str, api_key: String, agent_id: String) -> Result<Self> {
        Ok(Self {
            kibana: KibanaClient::new(endpoint, api_key)?,
            agent_id,
        })
    }

    pub fn base_url(&self) -> &str {
        self.kibana.base_url()
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

#[async_trait]
impl Conversation for ConverseClient {
    async fn converse(&self, input: &str, conversation_id: Option<&str>) -> Result<ConverseReply> {
        let request = ConverseRequest {
            input,
            agent_id: &self.agent_id,
            conversation_id,
        };

        let res: ConverseResponse = self
            .kibana
            .request(Method::POST, "/api/agent_builder/converse")
            .json(&request)
            .send()
            .await
            .context("failed to call converse API")?
            .error_for_status()
            .context("converse API returned non-success status")?
            .json()
            .await
            .context("failed to parse converse response")?;

        Ok(res.into_reply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_strips_path() {
        assert_eq!(
            base_url("https://kibana.example.com/app/home#/").unwrap(),
            "https://kibana.example.com"
        );
        assert_eq!(
            base_url("http://localhost:5601/s/default").unwrap(),
            "http://localhost:5601"
        );
        assert!(base_url("not a url").is_err());
    }

    #[test]
    fn test_request_omits_missing_conversation() {
        let req = ConverseRequest {
            input: "hi",
            agent_id: "beanstack-research",
            conversation_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("conversation_id"));
    }

    #[test]
    fn test_workflow_state_parse() {
        let state: WorkflowState = serde_json::from_str(
            r#"{"id": "wf-1", "valid": false, "enabled": false, "validationErrors": ["bad step"]}"#,
        )
        .unwrap();
        assert!(!state.valid);
        assert_eq!(state.validation_errors.len(), 1);

        let bare: WorkflowState = serde_json::from_str(r#"{"id": "wf-2"}"#).unwrap();
        assert_eq!(bare, WorkflowState::default());
    }

    #[test]
    fn test_kibana_client_reduces_endpoint() {
        let client = KibanaClient::new("https://kb.example.com:9243/app/home", "k".into()).unwrap();
        assert_eq!(client.base_url(), "https://kb.example.com:9243");
        let converse =
            ConverseClient::new("https://kb.example.com/s/ops", "k".into(), "a".into()).unwrap();
        assert_eq!(converse.base_url(), "https://kb.example.com");
    }

    #[test]
    fn test_response_object_and_string_forms() {
        let obj: ConverseResponse = serde_json::from_str(
            r#"{"conversation_id": "c-1", "response": {"message": "Revenue is up."}}"#,
        )
        .unwrap();
        let reply = obj.into_reply();
        assert_eq!(reply.conversation_id.as_deref(), Some("c-1"));
        assert_eq!(reply.message, "Revenue is up.");

        let text: ConverseResponse =
            serde_json::from_str(r#"{"response": "plain answer"}"#).unwrap();
        assert_eq!(text.into_reply().message, "plain answer");

        let empty: ConverseResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(empty.into_reply().message, EMPTY_REPLY);
    }
}
