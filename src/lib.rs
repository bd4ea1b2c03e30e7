//! BeanStack data rig
//!
//! Synthesizes organizational data for the fictitious BeanStack coffee chain,
//! loads it into a search engine and relays chat to a hosted agent:
//! - branches and staff rosters from a seeded random stream
//! - weekly narrative reports written through an LLM, with a fixed fallback
//! - financial report schema and validation
//! - index mappings and bulk ingestion
//! - hosted agent setup: tools, agent and workflows
//! - chat relay with a progress ticker
//!
//! # Layers
//!
//! - `core`: configuration, randomness, calendar, storage
//! - `domain`: typed records
//! - `infrastructure`: LLM, search engine, hosted agent, logging
//! - `application`: generators, ingestion, agent setup, relay

// Core layer
pub mod core;

// Domain layer
pub mod domain;

// Infrastructure layer
pub mod infrastructure;

// Application layer
pub mod application;

pub mod errors;

pub use self::core::config::{AppConfig, Command, GenerationSettings};
pub use self::core::rng::RandomStream;
pub use self::core::store::{DataDir, ReportStore};

pub use domain::{
    AgentDefinition, Branch, BranchRecord, FinancialReport, NarrativeArc, StaffMember,
    ToolDefinition, WeeklyReport,
};

pub use infrastructure::agent_builder::{
    AgentPlatform, Conversation, ConverseClient, ConverseReply, KibanaClient,
};
pub use infrastructure::llm::{Message as LlmMessage, OpenAIClient, TextGenerator};
pub use infrastructure::logger;
pub use infrastructure::search::{IndexKind, SearchBackend, SearchClient};

pub use application::pipeline::{generate_organization, generate_reports, Organization};
pub use application::relay::{ChatSurface, CliSurface, RelayBot};

pub use errors::{BeanstackError, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
