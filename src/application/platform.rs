//! Agent platform setup
//!
//! Three steps, each safe to rerun:
//! - enable the agent feature flag
//! - deploy workflow definitions, replacing the ones recorded by the last
//!   deployment, and record the new name to id mapping
//! - recreate the custom tools (workflow tools pointed at the recorded ids)
//!   and then the agent that uses them

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::tool::{resolve_workflow_ids, ToolConfiguration, BUILTIN_TOOL_IDS};
use crate::domain::{AgentDefinition, ToolDefinition};
use crate::infrastructure::agent_builder::{AgentPlatform, WorkflowUpdate};

pub const AGENT_BUILDER_SETTING: &str = "agentBuilder:enabled";
pub const WORKFLOWS_SETTING: &str = "workflows:ui:enabled";

pub async fn enable_agent_builder(platform: &dyn AgentPlatform) -> Result<()> {
    platform
        .update_settings(&json!({ AGENT_BUILDER_SETTING: true }))
        .await?;
    info!("Agent builder enabled");
    Ok(())
}

/// One workflow YAML definition
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowFile {
    pub path: PathBuf,
    pub name: String,
    pub description: String,
    pub yaml: String,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowHeader {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl WorkflowFile {
    /// Name and description come from the YAML; the name falls back to the
    /// file name
    pub fn parse(path: &Path, yaml: String) -> Result<Self> {
        let header: WorkflowHeader = serde_yaml::from_str(&yaml)
            .with_context(|| format!("invalid workflow YAML in {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            name: header.name.unwrap_or(file_name),
            description: header.description.unwrap_or_default().trim().to_string(),
            yaml,
        })
    }
}

/// `*.yaml` / `*.yml` files of `dir`, sorted by file name
pub fn load_workflow_files(dir: &Path) -> Result<Vec<WorkflowFile>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("cannot read workflow directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let yaml = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            WorkflowFile::parse(&path, yaml)
        })
        .collect()
}

/// Outcome of a workflow deployment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDeployment {
    /// Workflow name to platform id, for every workflow that was created
    pub ids: BTreeMap<String, String>,
    /// Created but reported invalid by the platform
    pub invalid: Vec<String>,
    /// Not created; these need manual setup
    pub failed: Vec<String>,
}

/// Replace the workflows recorded in `previous` with `files`
pub async fn setup_workflows(
    platform: &dyn AgentPlatform,
    files: &[WorkflowFile],
    previous: &BTreeMap<String, String>,
) -> Result<WorkflowDeployment> {
    if let Err(e) = platform
        .update_settings(&json!({ WORKFLOWS_SETTING: true }))
        .await
    {
        warn!("Could not enable workflows: {:#}", e);
    }

    for (name, id) in previous {
        match platform.delete_workflow(id).await {
            Ok(true) => info!("Deleted old workflow '{}' ({})", name, id),
            Ok(false) => info!("Workflow '{}' ({}) already gone", name, id),
            Err(e) => warn!("Failed to delete workflow '{}': {:#}", name, e),
        }
    }

    let mut deployment = WorkflowDeployment::default();
    for file in files {
        let id = match platform.create_workflow(&file.yaml).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to create workflow '{}': {:#}", file.name, e);
                deployment.failed.push(file.name.clone());
                continue;
            }
        };

        let update = WorkflowUpdate {
            name: file.name.clone(),
            description: file.description.clone(),
            enabled: true,
        };
        match platform.update_workflow(&id, &update).await {
            Ok(state) if state.valid => info!(
                "Created workflow '{}' (id: {}, {}) from {}",
                file.name,
                id,
                if state.enabled { "enabled" } else { "not enabled" },
                file.path.display()
            ),
            Ok(state) => {
                warn!("Created workflow '{}' (id: {}) but it is invalid", file.name, id);
                for error in &state.validation_errors {
                    warn!("  {}", error);
                }
                deployment.invalid.push(file.name.clone());
            }
            Err(e) => warn!(
                "Created workflow '{}' (id: {}) but could not update it: {:#}",
                file.name, id, e
            ),
        }
        deployment.ids.insert(file.name.clone(), id);
    }

    if !deployment.failed.is_empty() {
        warn!(
            "{} workflow(s) need manual setup: {}",
            deployment.failed.len(),
            deployment.failed.join(", ")
        );
    }
    Ok(deployment)
}

/// Outcome of an agent setup
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSetup {
    pub agent_id: String,
    pub builtin_tools: usize,
    pub custom_tools: usize,
    /// Workflow names with no recorded id
    pub unresolved_workflows: Vec<String>,
}

/// Delete and recreate the custom tools, then the agent that uses them
pub async fn setup_agent(
    platform: &dyn AgentPlatform,
    agent_id: &str,
    tools: &[ToolDefinition],
    workflow_ids: &BTreeMap<String, String>,
) -> Result<AgentSetup> {
    for tool in tools {
        tool.validate()?;
    }

    if platform.agent_exists(agent_id).await? {
        platform.delete_agent(agent_id).await?;
        info!("Deleted agent '{}'", agent_id);
    } else {
        info!("Agent '{}' does not exist, skipping delete", agent_id);
    }

    let unresolved_workflows: Vec<String> = tools
        .iter()
        .filter_map(|tool| match &tool.configuration {
            ToolConfiguration::Workflow { workflow_id } => (!workflow_ids
                .contains_key(workflow_id))
            .then(|| workflow_id.clone()),
            _ => None,
        })
        .collect();
    let tools = resolve_workflow_ids(tools, workflow_ids);

    for tool in &tools {
        if platform.tool_exists(&tool.id).await? {
            platform.delete_tool(&tool.id).await?;
        }
        platform.create_tool(tool).await?;
        info!("Created tool '{}' ({:?})", tool.id, tool.tool_type());
    }

    let agent = AgentDefinition::operations(agent_id, &tools);
    platform.create_agent(&agent).await?;
    info!(
        "Agent '{}' created with {} built-in and {} custom tools",
        agent_id,
        BUILTIN_TOOL_IDS.len(),
        tools.len()
    );

    Ok(AgentSetup {
        agent_id: agent_id.to_string(),
        builtin_tools: BUILTIN_TOOL_IDS.len(),
        custom_tools: tools.len(),
        unresolved_workflows,
    })
}
