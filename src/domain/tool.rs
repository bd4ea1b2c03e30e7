//! Agent tool definitions
//!
//! Tools the hosted agent can call: index searches over one index pattern,
//! parameterized ES|QL queries, and workflow triggers. Definitions serialize
//! to the agent platform's tool payload.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::errors::{BeanstackError, Result};

/// Prefix shared by every custom tool id
pub const TOOL_ID_PREFIX: &str = "beanstack.";

/// Built-in platform tools assigned to the agent next to the custom ones
pub const BUILTIN_TOOL_IDS: [&str; 4] = [
    "platform.core.search",
    "platform.core.list_indices",
    "platform.core.get_index_mapping",
    "platform.core.get_document_by_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    IndexSearch,
    Esql,
    Workflow,
}

/// Type of an ES|QL query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Keyword,
    Integer,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolParam {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolConfiguration {
    IndexSearch {
        pattern: String,
    },
    Esql {
        query: String,
        params: BTreeMap<String, ToolParam>,
    },
    /// `workflow_id` holds the workflow name until resolved to a platform id
    Workflow {
        workflow_id: String,
    },
}

impl ToolConfiguration {
    pub fn tool_type(&self) -> ToolType {
        match self {
            ToolConfiguration::IndexSearch { .. } => ToolType::IndexSearch,
            ToolConfiguration::Esql { .. } => ToolType::Esql,
            ToolConfiguration::Workflow { .. } => ToolType::Workflow,
        }
    }
}

/// One custom tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "ToolPayload")]
pub struct ToolDefinition {
    pub id: String,
    pub description: String,
    pub tags: Vec<String>,
    pub configuration: ToolConfiguration,
}

#[derive(Serialize)]
struct ToolPayload {
    id: String,
    #[serde(rename = "type")]
    tool_type: ToolType,
    description: String,
    tags: Vec<String>,
    configuration: ToolConfiguration,
}

impl From<ToolDefinition> for ToolPayload {
    fn from(tool: ToolDefinition) -> Self {
        Self {
            id: tool.id,
            tool_type: tool.configuration.tool_type(),
            description: tool.description,
            tags: tool.tags,
            configuration: tool.configuration,
        }
    }
}

impl ToolDefinition {
    fn new(id: &str, description: &str, configuration: ToolConfiguration) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            tags: vec![],
            configuration,
        }
    }

    /// Free-form search over one index pattern
    pub fn index_search(id: &str, pattern: &str, description: &str) -> Self {
        Self::new(
            id,
            description,
            ToolConfiguration::IndexSearch {
                pattern: pattern.to_string(),
            },
        )
    }

    /// Fixed ES|QL query; add its `?name` parameters with [`Self::param`]
    pub fn esql(id: &str, query: &str, description: &str) -> Self {
        Self::new(
            id,
            description,
            ToolConfiguration::Esql {
                query: query.to_string(),
                params: BTreeMap::new(),
            },
        )
    }

    /// Trigger for the workflow named `workflow_name`
    pub fn workflow(id: &str, workflow_name: &str, description: &str) -> Self {
        Self::new(
            id,
            description,
            ToolConfiguration::Workflow {
                workflow_id: workflow_name.to_string(),
            },
        )
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Declare a query parameter; ignored for non-ES|QL tools
    pub fn param(mut self, name: &str, param_type: ParamType, description: &str) -> Self {
        if let ToolConfiguration::Esql { params, .. } = &mut self.configuration {
            params.insert(
                name.to_string(),
                ToolParam {
                    param_type,
                    description: description.to_string(),
                },
            );
        }
        self
    }

    pub fn tool_type(&self) -> ToolType {
        self.configuration.tool_type()
    }

    /// Id prefix, non-empty description, and for ES|QL tools an exact match
    /// between `?name` placeholders and declared parameters
    pub fn validate(&self) -> Result<()> {
        if !self.id.starts_with(TOOL_ID_PREFIX) || self.id.len() == TOOL_ID_PREFIX.len() {
            return Err(BeanstackError::ValidationError(format!(
                "tool id '{}' must start with '{}'",
                self.id, TOOL_ID_PREFIX
            )));
        }
        if self.description.trim().is_empty() {
            return Err(BeanstackError::ValidationError(format!(
                "tool '{}' has no description",
                self.id
            )));
        }
        if let ToolConfiguration::Esql { query, params } = &self.configuration {
            let used = query_placeholders(query)?;
            let declared: BTreeSet<&str> = params.keys().map(String::as_str).collect();
            if used != declared {
                return Err(BeanstackError::ValidationError(format!(
                    "tool '{}' uses parameters {:?} but declares {:?}",
                    self.id, used, declared
                )));
            }
        }
        Ok(())
    }
}

/// `?name` placeholders of an ES|QL query
pub fn query_placeholders(query: &str) -> Result<BTreeSet<&str>> {
    let placeholder = Regex::new(r"\?([A-Za-z_][A-Za-z0-9_]*)")
        .map_err(|e| BeanstackError::Unknown(e.to_string()))?;
    Ok(placeholder
        .captures_iter(query)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect())
}

/// Swap workflow names for the platform ids in `mapping`. Unknown names are
/// kept and reported.
pub fn resolve_workflow_ids(
    tools: &[ToolDefinition],
    mapping: &BTreeMap<String, String>,
) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|tool| {
            let mut tool = tool.clone();
            if let ToolConfiguration::Workflow { workflow_id } = &mut tool.configuration {
                match mapping.get(workflow_id.as_str()) {
                    Some(id) => *workflow_id = id.clone(),
                    None => warn!("Workflow '{}' has no deployed id", workflow_id),
                }
            }
            tool
        })
        .collect()
}

/// Custom tools registered for the operations agent
pub fn default_tool_catalog() -> Vec<ToolDefinition> {
    use ParamType::*;

    const START: &str = "Start of the date range in yyyy-MM-dd format";
    const END: &str = "End of the date range in yyyy-MM-dd format";

    vec![
        // index searches
        ToolDefinition::index_search(
            "beanstack.search_reports",
            "beanstack-reports",
            "Searches weekly branch manager reports from BeanStack coffee chain locations. \
             Use this tool for any question about branch operations, incidents, or issues \
             mentioned in manager reports. Supports natural language queries. Reports cover \
             equipment failures, staffing shortages, supply chain problems, local events, \
             weather impacts, and day-to-day operations. Each report includes the branch name, \
             manager email, date, and free-text content.",
        )
        .tags(&["beanstack", "reports", "operations"]),
        ToolDefinition::index_search(
            "beanstack.search_branches",
            "beanstack-branches",
            "Searches BeanStack coffee chain branch locations. Use this tool to find branches \
             by city, state, region, size, or proximity to a location. Each branch has: name, \
             address, city, state, zip, region (Northeast, Southeast, Midwest, Southwest, West), \
             geo-coordinates, size (small/medium/large), opened date, status, and manager email.",
        )
        .tags(&["beanstack", "branches", "locations"]),
        ToolDefinition::index_search(
            "beanstack.search_staff",
            "beanstack-staff",
            "Searches BeanStack coffee chain staff members. Use this tool to find employees by \
             name, role, branch, or status. Each staff record has: name, email, role (Barista, \
             Shift Lead, Assistant Manager, Manager), branch ID, branch name, start date, and \
             status (active/inactive).",
        )
        .tags(&["beanstack", "staff", "employees"]),
        ToolDefinition::index_search(
            "beanstack.search_financial_reports",
            "beanstack-financial-reports",
            "Searches quarterly and yearly financial reports from BeanStack branches. Use this \
             tool for questions about revenue, labor costs, inventory waste, customer \
             satisfaction, staff turnover, or equipment issues mentioned in manager narratives. \
             Each report includes branch name, period (e.g. Q3-2025), revenue, transactions, \
             labor cost %, waste %, satisfaction score, and manager commentary.",
        )
        .tags(&["beanstack", "financial", "quarterly", "revenue"]),
        // ES|QL analytics
        ToolDefinition::esql(
            "beanstack.report_count_by_branch",
            "FROM beanstack-reports \
             | WHERE date >= ?startDate AND date <= ?endDate \
             | STATS report_count = COUNT(*) BY branch_id, branch_name \
             | SORT report_count ASC \
             | LIMIT 200",
            "Counts the weekly reports submitted by each branch within a date range. Use this \
             tool to check reporting frequency or as a first step to identify missing reports. \
             Returns branch ID, branch name, and report count, fewest first.",
        )
        .tags(&["beanstack", "reports", "analytics"])
        .param("startDate", Date, START)
        .param("endDate", Date, END),
        ToolDefinition::esql(
            "beanstack.branches_without_reports",
            "FROM beanstack-reports \
             | WHERE date >= ?startDate AND date <= ?endDate \
             | STATS report_count = COUNT(*) BY branch_id, branch_name \
             | SORT report_count ASC \
             | LIMIT 200",
            "Counts reports per branch in a date range, sorted lowest-first, to spot branches \
             behind on reporting. Branches with ZERO reports will NOT appear in results; \
             cross-reference with search_branches to get the full branch list.",
        )
        .tags(&["beanstack", "reports", "missing", "gaps"])
        .param("startDate", Date, START)
        .param("endDate", Date, END),
        ToolDefinition::esql(
            "beanstack.staff_by_branch",
            "FROM beanstack-staff \
             | WHERE branch_id == ?branchId \
             | KEEP name, email, role, start_date, status \
             | SORT role, name \
             | LIMIT 50",
            "Lists all staff members at a specific branch. Use this tool when asked 'who works \
             at [branch]?' or to get a staff roster. Returns name, email, role, start date, and \
             status for each staff member.",
        )
        .tags(&["beanstack", "staff", "branch"])
        .param(
            "branchId",
            Keyword,
            "The branch ID to look up staff for (e.g. 'branch-042')",
        ),
        ToolDefinition::esql(
            "beanstack.branch_report_timeline",
            "FROM beanstack-reports \
             | WHERE branch_id == ?branchId \
             | SORT date DESC \
             | KEEP date, subject, text \
             | LIMIT ?limit",
            "Retrieves weekly reports for a specific branch, newest first. Use this tool to see \
             the reporting history of a branch or track how issues evolve over time. Returns \
             date, subject, and report text for each report.",
        )
        .tags(&["beanstack", "reports", "timeline", "history"])
        .param(
            "branchId",
            Keyword,
            "The branch ID to get reports for (e.g. 'branch-042')",
        )
        .param(
            "limit",
            Integer,
            "Maximum number of reports to return (default 10)",
        ),
        ToolDefinition::esql(
            "beanstack.branches_by_region",
            "FROM beanstack-branches \
             | WHERE region == ?region \
             | KEEP id, name, city, state, size, status \
             | SORT state, city \
             | LIMIT 200",
            "Lists the branches of one region. Use this tool for regional comparisons or to \
             understand the chain's geographic distribution. Regions are: Northeast, Southeast, \
             Midwest, Southwest, West.",
        )
        .tags(&["beanstack", "branches", "regions", "geography"])
        .param(
            "region",
            Keyword,
            "Region to filter by: Northeast, Southeast, Midwest, Southwest, or West",
        ),
        // financial analytics
        ToolDefinition::esql(
            "beanstack.revenue_by_region",
            "FROM beanstack-financial-reports \
             | WHERE start_date >= ?startDate AND end_date <= ?endDate \
             | ENRICH beanstack-branch-region ON branch_id WITH region \
             | WHERE region LIKE ?region \
             | STATS total_revenue = SUM(revenue), avg_revenue = AVG(revenue), \
             total_transactions = SUM(transactions), branch_count = COUNT_DISTINCT(branch_id), \
             avg_satisfaction = AVG(customer_satisfaction) BY region \
             | SORT total_revenue DESC \
             | LIMIT 10",
            "Calculates total revenue, average revenue, and transaction counts by geographic \
             region for a date range. Use this for questions like 'compare regional revenue' or \
             'which region performs best'. Pass a region name, or '*' for all regions.",
        )
        .tags(&["beanstack", "financial", "revenue", "region", "geography"])
        .param("startDate", Date, START)
        .param("endDate", Date, END)
        .param(
            "region",
            Keyword,
            "Region to filter by: Northeast, Southeast, Midwest, Southwest, or West. \
             Use '*' to include all regions.",
        ),
        ToolDefinition::esql(
            "beanstack.underperforming_branches",
            "FROM beanstack-financial-reports \
             | WHERE start_date >= ?startDate AND end_date <= ?endDate \
             | STATS avg_labor_cost = AVG(labor_cost_pct), avg_waste = AVG(inventory_waste_pct), \
             avg_satisfaction = AVG(customer_satisfaction), total_turnover = SUM(turnover_count), \
             total_equip_issues = SUM(equipment_issues), avg_revenue = AVG(revenue) \
             BY branch_id, branch_name \
             | SORT avg_satisfaction ASC \
             | LIMIT 50",
            "Finds branches showing signs of underperformance in a date range: high labor \
             costs, high waste, low satisfaction, high turnover. Use this for questions like \
             'which branches are struggling' or 'find problem branches last quarter'.",
        )
        .tags(&["beanstack", "financial", "performance", "alerts"])
        .param("startDate", Date, START)
        .param("endDate", Date, END),
        ToolDefinition::esql(
            "beanstack.turnover_by_branch",
            "FROM beanstack-financial-reports \
             | WHERE start_date >= ?startDate AND end_date <= ?endDate \
             | STATS total_turnover = SUM(turnover_count), avg_employees = AVG(employee_count), \
             quarters = COUNT(*) BY branch_id, branch_name \
             | SORT total_turnover DESC \
             | LIMIT 50",
            "Shows staff turnover counts per branch over a date range, highest first. Use this \
             for questions like 'which branches lost the most staff' or 'is turnover seasonal'.",
        )
        .tags(&["beanstack", "financial", "turnover", "staffing"])
        .param("startDate", Date, START)
        .param("endDate", Date, END),
        ToolDefinition::esql(
            "beanstack.equipment_issues_by_branch",
            "FROM beanstack-financial-reports \
             | WHERE start_date >= ?startDate AND end_date <= ?endDate \
             | STATS total_issues = SUM(equipment_issues), quarters = COUNT(*), \
             avg_satisfaction = AVG(customer_satisfaction), avg_revenue = AVG(revenue) \
             BY branch_id, branch_name \
             | SORT total_issues DESC \
             | LIMIT 50",
            "Shows equipment issue counts per branch over a date range. Use this for questions \
             like 'which branches have recurring equipment problems'. Returns branch name, total \
             equipment issues, number of quarters, and average satisfaction.",
        )
        .tags(&["beanstack", "financial", "equipment", "maintenance"])
        .param("startDate", Date, START)
        .param("endDate", Date, END),
        ToolDefinition::esql(
            "beanstack.branch_financial_summary",
            "FROM beanstack-financial-reports \
             | WHERE branch_id == ?branchId \
             | KEEP period, start_date, revenue, transactions, avg_ticket, labor_cost_pct, \
             inventory_waste_pct, customer_satisfaction, employee_count, turnover_count, \
             equipment_issues \
             | SORT start_date ASC \
             | LIMIT 50",
            "Gets all quarterly financial reports for a specific branch, showing trends over \
             time. Use this for questions like 'how has branch-042 performed over the last \
             year' or 'revenue trend for a branch'.",
        )
        .tags(&["beanstack", "financial", "branch", "history"])
        .param("branchId", Keyword, "Branch identifier, e.g. 'branch-042'"),
        // workflows
        ToolDefinition::workflow(
            "beanstack.send_manager_message",
            "beanstack-send-manager-message",
            "Sends a message to a branch manager, for example to request an update or send \
             instructions. Requires the branch_id and the message to send. Optionally accepts a \
             subject line. The workflow looks up the manager's contact info and delivers the \
             message.",
        )
        .tags(&["beanstack", "messaging", "workflow"]),
        ToolDefinition::workflow(
            "beanstack.missing_reports_reminder",
            "beanstack-missing-reports-reminder",
            "Identifies branches that have not submitted weekly reports since a given date and \
             emails reminders to their managers. Requires since_date (yyyy-MM-dd). Optionally \
             accepts a custom reminder_message.",
        )
        .tags(&["beanstack", "reports", "reminders", "workflow"]),
        ToolDefinition::workflow(
            "beanstack.escalation",
            "beanstack-escalation",
            "Escalates a branch issue by creating a trackable case, for example a staffing \
             crisis, equipment emergency, or health inspection failure. Requires branch_id and \
             issue_summary. Optionally accepts severity (low, medium, high, critical; defaults \
             to medium).",
        )
        .tags(&["beanstack", "escalation", "cases", "workflow"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_valid_and_unique() {
        let catalog = default_tool_catalog();
        assert_eq!(catalog.len(), 17);
        for tool in &catalog {
            tool.validate().unwrap();
        }
        let ids: BTreeSet<&str> = catalog.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());

        let count = |kind| catalog.iter().filter(|t| t.tool_type() == kind).count();
        assert_eq!(count(ToolType::IndexSearch), 4);
        assert_eq!(count(ToolType::Esql), 10);
        assert_eq!(count(ToolType::Workflow), 3);
    }

    #[test]
    fn test_esql_payload_shape() {
        let tool = ToolDefinition::esql(
            "beanstack.staff_count",
            "FROM beanstack-staff | WHERE branch_id == ?branchId | LIMIT ?limit",
            "Counts staff",
        )
        .tags(&["beanstack"])
        .param("branchId", ParamType::Keyword, "Branch id")
        .param("limit", ParamType::Integer, "Row limit");

        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["type"], "esql");
        assert_eq!(json["tags"][0], "beanstack");
        assert_eq!(json["configuration"]["params"]["branchId"]["type"], "keyword");
        assert_eq!(json["configuration"]["params"]["limit"]["type"], "integer");
        assert!(json["configuration"]["query"].as_str().unwrap().contains("?branchId"));
    }

    #[test]
    fn test_index_search_and_workflow_payloads() {
        let search = serde_json::to_value(ToolDefinition::index_search(
            "beanstack.search_staff",
            "beanstack-staff",
            "Finds staff",
        ))
        .unwrap();
        assert_eq!(search["type"], "index_search");
        assert_eq!(search["configuration"]["pattern"], "beanstack-staff");

        let flow = serde_json::to_value(ToolDefinition::workflow(
            "beanstack.escalation",
            "beanstack-escalation",
            "Escalates",
        ))
        .unwrap();
        assert_eq!(flow["type"], "workflow");
        assert_eq!(flow["configuration"]["workflow_id"], "beanstack-escalation");
    }

    #[test]
    fn test_validate_rejects_undeclared_parameter() {
        let tool = ToolDefinition::esql(
            "beanstack.broken",
            "FROM beanstack-reports | WHERE date >= ?startDate",
            "Broken",
        );
        assert!(tool.validate().is_err());

        let extra = ToolDefinition::esql("beanstack.extra", "FROM beanstack-reports", "Extra")
            .param("unused", ParamType::Date, "Unused");
        assert!(extra.validate().is_err());

        let unprefixed = ToolDefinition::index_search("search_all", "beanstack-*", "All");
        assert!(unprefixed.validate().is_err());
    }

    #[test]
    fn test_resolve_workflow_ids() {
        let tools = vec![
            ToolDefinition::workflow("beanstack.escalation", "beanstack-escalation", "Escalates"),
            ToolDefinition::workflow("beanstack.brief", "beanstack-daily-brief", "Brief"),
            ToolDefinition::index_search("beanstack.search_staff", "beanstack-staff", "Staff"),
        ];
        let mapping = BTreeMap::from([(
            "beanstack-escalation".to_string(),
            "wf-123".to_string(),
        )]);
        let resolved = resolve_workflow_ids(&tools, &mapping);

        assert_eq!(
            resolved[0].configuration,
            ToolConfiguration::Workflow {
                workflow_id: "wf-123".to_string()
            }
        );
        assert_eq!(resolved[1].configuration, tools[1].configuration);
        assert_eq!(resolved[2], tools[2]);
    }
}
