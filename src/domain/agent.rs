//! Hosted operations agent definition

use serde::Serialize;

use super::tool::{ToolDefinition, BUILTIN_TOOL_IDS};

/// Id of the operations agent on the platform
pub const DEFAULT_AGENT_ID: &str = "beanstack-research";

/// Agent instructions
pub const AGENT_INSTRUCTIONS: &str = "\
You are BeanStack Agent, an operational intelligence assistant for BeanStack, a coffee chain with 100+ branches across the United States.

Your role is to help headquarters staff understand what's happening across the chain by analyzing branch reports, staff data, and operational metrics.

## Capabilities
- Summarize daily and weekly branch reports
- Identify branches with operational issues (equipment failures, staffing shortages, supply chain problems)
- Answer questions about staff (who works where, roles, tenure)
- Compare performance across regions and branches
- Detect patterns in reports (seasonal trends, recurring problems)
- Identify branches with missing or overdue reports

## Data Sources
- **beanstack-branches**: Branch locations, addresses, regions, and manager info
- **beanstack-staff**: Staff members, roles, branch assignments
- **beanstack-reports**: Weekly unstructured reports from branch managers covering operations, issues, and events
- **beanstack-financial-reports**: Quarterly and yearly financial reports with manager narratives

## Guidelines
- When answering questions, always cite the specific branch and report date
- For time-based queries, filter by the relevant date range
- For location-based queries, use region or geo-spatial filters
- If data is missing or incomplete, proactively mention it
- Keep responses concise and actionable
";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSelection {
    pub tool_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentConfiguration {
    pub instructions: String,
    pub tools: Vec<ToolSelection>,
}

/// Agent payload for the platform's agent API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub labels: Vec<String>,
    pub avatar_color: String,
    pub avatar_symbol: String,
    pub configuration: AgentConfiguration,
}

impl AgentDefinition {
    /// Operations agent with the built-in tools followed by `tools`
    pub fn operations(id: &str, tools: &[ToolDefinition]) -> Self {
        let tool_ids = BUILTIN_TOOL_IDS
            .iter()
            .map(|id| id.to_string())
            .chain(tools.iter().map(|t| t.id.clone()))
            .collect();
        Self {
            id: id.to_string(),
            name: "BeanStack Agent".to_string(),
            description: "Operational intelligence agent for the BeanStack coffee chain. \
                          Analyzes branch reports, staff data, and operational metrics \
                          across 100+ US locations."
                .to_string(),
            labels: vec!["beanstack".to_string(), "operations".to_string()],
            avatar_color: "#36B37E".to_string(),
            avatar_symbol: "BS".to_string(),
            configuration: AgentConfiguration {
                instructions: AGENT_INSTRUCTIONS.to_string(),
                tools: vec![ToolSelection { tool_ids }],
            },
        }
    }

    pub fn tool_ids(&self) -> impl Iterator<Item = &str> {
        self.configuration
            .tools
            .iter()
            .flat_map(|s| s.tool_ids.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tool::default_tool_catalog;

    #[test]
    fn test_operations_agent_lists_builtin_then_custom_tools() {
        let catalog = default_tool_catalog();
        let agent = AgentDefinition::operations(DEFAULT_AGENT_ID, &catalog);

        let ids: Vec<&str> = agent.tool_ids().collect();
        assert_eq!(ids.len(), BUILTIN_TOOL_IDS.len() + catalog.len());
        assert_eq!(ids[0], "platform.core.search");
        assert_eq!(ids[BUILTIN_TOOL_IDS.len()], "beanstack.search_reports");

        let json = serde_json::to_value(&agent).unwrap();
        assert_eq!(json["id"], "beanstack-research");
        assert_eq!(json["configuration"]["tools"][0]["tool_ids"][0], "platform.core.search");
        assert!(json["configuration"]["instructions"]
            .as_str()
            .unwrap()
            .starts_with("You are BeanStack Agent"));
    }
}
