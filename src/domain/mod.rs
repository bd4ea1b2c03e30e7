//! Domain Layer
//!
//! Typed records for branches, staff, narrative reports and financial
//! reports, plus the hosted agent and its tools

pub mod agent;
pub mod branch;
pub mod financial;
pub mod report;
pub mod staff;
pub mod tool;

pub use agent::{AgentDefinition, DEFAULT_AGENT_ID};
pub use branch::{
    default_city_catalog, Address, Branch, BranchRecord, BranchSize, BranchStatus, CitySpec,
    GeoPoint, Lifecycle, Region,
};
pub use financial::{FinancialReport, ReportPeriod, ReportType};
pub use report::{
    GeneratedText, LengthBucket, NarrativeArc, ReportFile, ReportIndexEntry, WeeklyReport,
};
pub use staff::{Role, StaffMember, StaffStatus};
pub use tool::{default_tool_catalog, ParamType, ToolDefinition, ToolType};
