//! Infrastructure layer: external system interaction
//!
//! LLM, search engine, hosted agent and logging

pub mod agent_builder;
pub mod llm;
pub mod logger;
pub mod search;
