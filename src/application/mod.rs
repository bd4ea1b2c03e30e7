//! Application layer: pipeline orchestration
//!
//! Branch and staff generation, report scheduling and content, search
//! ingestion, hosted agent setup and the chat relay

pub mod branches;
pub mod ingest;
pub mod pipeline;
pub mod platform;
pub mod prompt;
pub mod relay;
pub mod reports;
pub mod schedule;
pub mod staff;
