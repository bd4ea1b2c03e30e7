//! Configuration management
//!
//! Command-line / environment configuration (`clap`) plus the generation
//! settings, which default to the built-in catalog and may be overridden from
//! a YAML file.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::core::calendar::{ymd, SUPPORTED_YEARS};
use crate::domain::{default_city_catalog, CitySpec, DEFAULT_AGENT_ID};
use crate::errors::{BeanstackError, Result};
use crate::infrastructure::search::IndexKind;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Synthetic data rig for the BeanStack operations assistant"
)]
pub struct AppConfig {
    /// Directory holding generated data
    #[arg(long, env = "DATA_DIR", default_value = "data/generated", global = true)]
    pub data_dir: PathBuf,

    /// YAML file overriding generation settings
    #[arg(long, env = "GENERATION_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Run seed (takes precedence over the settings file)
    #[arg(long, env = "SEED", global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate branches and staff
    Org,
    /// Generate weekly narrative reports for existing branches and staff
    Reports(ReportsArgs),
    /// Generate branches, staff and weekly reports in one run
    All(ReportsArgs),
    /// Create or delete the search indices
    SetupIndices(SetupIndicesArgs),
    /// Bulk-load generated data into the search indices
    Ingest(IngestArgs),
    /// Turn on the agent platform feature flag
    EnableAgentBuilder(PlatformArgs),
    /// Deploy workflow definitions and record their platform ids
    SetupWorkflows(SetupWorkflowsArgs),
    /// Recreate the custom tools and the operations agent
    SetupAgent(SetupAgentArgs),
    /// Relay terminal chat to the hosted agent
    Relay(RelayArgs),
}

/// Text generation service
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,
}

impl LlmArgs {
    pub fn api_key(&self) -> Result<&str> {
        require(self.openai_api_key.as_deref(), "OPENAI_API_KEY")
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportsArgs {
    #[command(flatten)]
    pub llm: LlmArgs,

    /// Narrative arcs keyed by branch id (JSON or YAML)
    #[arg(long, env = "NARRATIVES_FILE")]
    pub narratives: Option<PathBuf>,

    /// Only generate reports for these branch ids
    pub branch_ids: Vec<String>,
}

/// Search engine connection
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long, env = "ELASTICSEARCH_ENDPOINT")]
    pub es_endpoint: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_API_KEY")]
    pub es_api_key: Option<String>,

    /// Key for the Cohere embedding inference endpoint
    #[arg(long, env = "COHERE_API_KEY")]
    pub cohere_api_key: Option<String>,
}

impl SearchArgs {
    /// `(endpoint, api_key)`, both required
    pub fn connection(&self) -> Result<(String, String)> {
        let endpoint = require(self.es_endpoint.as_deref(), "ELASTICSEARCH_ENDPOINT")?;
        let api_key = require(self.es_api_key.as_deref(), "ELASTICSEARCH_API_KEY")?;
        Ok((endpoint.to_string(), api_key.to_string()))
    }
}

#[derive(Args, Debug, Clone)]
pub struct SetupIndicesArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Indices to operate on: branches, staff, reports, financial (default all)
    pub indices: Vec<IndexKind>,

    /// Recreate indices that already exist
    #[arg(long)]
    pub force: bool,

    /// Delete the indices instead of creating them
    #[arg(long)]
    pub delete: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Indices to load (default all)
    pub indices: Vec<IndexKind>,

    /// Documents per bulk request
    #[arg(long, env = "BATCH_SIZE", default_value_t = 50)]
    pub batch_size: usize,
}

/// Agent platform connection
#[derive(Args, Debug, Clone)]
pub struct PlatformArgs {
    #[arg(long, env = "KIBANA_ENDPOINT")]
    pub kibana_endpoint: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_API_KEY")]
    pub api_key: Option<String>,
}

impl PlatformArgs {
    /// `(kibana_endpoint, api_key)`, both required
    pub fn connection(&self) -> Result<(String, String)> {
        let endpoint = require(self.kibana_endpoint.as_deref(), "KIBANA_ENDPOINT")?;
        let api_key = require(self.api_key.as_deref(), "ELASTICSEARCH_API_KEY")?;
        Ok((endpoint.to_string(), api_key.to_string()))
    }
}

#[derive(Args, Debug, Clone)]
pub struct SetupWorkflowsArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Directory of workflow YAML definitions
    #[arg(long, env = "WORKFLOWS_DIR", default_value = "workflows")]
    pub workflows_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SetupAgentArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Agent to (re)create
    #[arg(long, env = "AGENT_ID", default_value = DEFAULT_AGENT_ID)]
    pub agent_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct RelayArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Hosted agent to converse with
    #[arg(long, env = "AGENT_ID", default_value = DEFAULT_AGENT_ID)]
    pub agent_id: String,

    /// Seconds between progress updates
    #[arg(long, env = "RELAY_TICK_SECS", default_value_t = 3)]
    pub tick_secs: u64,
}

fn require<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BeanstackError::ConfigError(format!("{} is required", name))),
    }
}

impl AppConfig {
    /// Generation settings with the command-line seed applied
    pub fn generation_settings(&self) -> Result<GenerationSettings> {
        let mut settings = GenerationSettings::load(self.settings.as_deref())?;
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// Knobs of the generation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub seed: u64,
    pub brand: String,
    pub email_domain: String,
    pub cities: Vec<CitySpec>,

    // Branches
    pub first_opening_year: i32,
    pub last_opening_year: i32,
    pub closure_probability: f64,
    pub min_tenure_days: i64,
    pub fallback_tenure_days: i64,
    pub closure_cutoff: NaiveDate,
    pub jitter_radius_km: f64,
    pub street_name_probability: f64,
    pub name_attempts: usize,

    // Staff
    pub staff_cutoff: NaiveDate,
    pub attrition_probability: f64,

    // Reports
    pub report_window_start: NaiveDate,
    pub report_window_end: NaiveDate,
    pub mid_week_probability: f64,
    pub narrative_probability: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            brand: "BeanStack".to_string(),
            email_domain: "beanstack.com".to_string(),
            cities: default_city_catalog(),
            first_opening_year: 2015,
            last_opening_year: 2024,
            closure_probability: 0.05,
            min_tenure_days: 180,
            fallback_tenure_days: 30,
            closure_cutoff: ymd(2026, 1, 15),
            jitter_radius_km: 15.0,
            street_name_probability: 0.3,
            name_attempts: 20,
            staff_cutoff: ymd(2026, 1, 31),
            attrition_probability: 0.2,
            report_window_start: ymd(2025, 8, 1),
            report_window_end: ymd(2026, 1, 31),
            mid_week_probability: 0.08,
            narrative_probability: 0.10,
        }
    }
}

impl GenerationSettings {
    /// Defaults, or the YAML file at `path` layered over them
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| {
            BeanstackError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings: GenerationSettings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Err(BeanstackError::ConfigError("city catalog is empty".to_string()));
        }
        for year in [self.first_opening_year, self.last_opening_year] {
            if !SUPPORTED_YEARS.contains(&year) {
                return Err(BeanstackError::ConfigError(format!(
                    "opening year {} is outside {}..={}",
                    year,
                    SUPPORTED_YEARS.start(),
                    SUPPORTED_YEARS.end()
                )));
            }
        }
        if self.first_opening_year > self.last_opening_year {
            return Err(BeanstackError::ConfigError(
                "first_opening_year is after last_opening_year".to_string(),
            ));
        }
        let last_opening = ymd(self.last_opening_year, 12, 31);
        if self.staff_cutoff <= last_opening || self.closure_cutoff <= last_opening {
            return Err(BeanstackError::ConfigError(format!(
                "staff_cutoff and closure_cutoff must fall after the opening window (ends {})",
                last_opening
            )));
        }
        if self.report_window_start > self.report_window_end {
            return Err(BeanstackError::ConfigError(
                "report window starts after it ends".to_string(),
            ));
        }
        if self.fallback_tenure_days < crate::domain::branch::MIN_TENURE_DAYS {
            return Err(BeanstackError::ConfigError(format!(
                "fallback_tenure_days must be at least {}",
                crate::domain::branch::MIN_TENURE_DAYS
            )));
        }
        let probabilities = [
            self.closure_probability,
            self.street_name_probability,
            self.attrition_probability,
            self.mid_week_probability,
            self.narrative_probability,
        ];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(BeanstackError::ConfigError(
                "probabilities must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
