//! Generation pipeline
//!
//! Runs the generators in order: branches, staff, phase-2 branch resolution,
//! then report scheduling for every branch before any report content.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::branches::BranchGenerator;
use super::reports::{ReportGenerator, ReportSummary};
use super::schedule::plan_all;
use super::staff::{resolve_branches, StaffGenerator};
use crate::core::config::GenerationSettings;
use crate::core::rng::{streams, RandomStream};
use crate::core::store::{DataDir, ReportStore};
use crate::domain::{BranchRecord, NarrativeArc, StaffMember};
use crate::infrastructure::llm::TextGenerator;

/// Branches and staff of one run
#[derive(Debug, Clone)]
pub struct Organization {
    pub branches: Vec<BranchRecord>,
    pub staff: Vec<StaffMember>,
}

/// Generate branches and staff, then resolve manager contacts
pub fn generate_organization(settings: &GenerationSettings) -> crate::errors::Result<Organization> {
    let drafts = BranchGenerator::new(
        settings,
        RandomStream::derive(settings.seed, streams::BRANCHES),
    )
    .generate()?;

    let staff = StaffGenerator::new(settings, RandomStream::derive(settings.seed, streams::STAFF))
        .generate(&drafts)?;

    let branches = resolve_branches(&drafts, &staff);
    Ok(Organization { branches, staff })
}

/// Write `branches.json` and `staff.json`
pub fn save_organization(data: &DataDir, org: &Organization) -> crate::errors::Result<()> {
    let branches = data.save_branches(&org.branches)?;
    let staff = data.save_staff(&org.staff)?;
    info!("Saved {} and {}", branches.display(), staff.display());
    Ok(())
}

/// Load a previously generated organization
pub fn load_organization(data: &DataDir) -> crate::errors::Result<Organization> {
    Ok(Organization {
        branches: data.load_branches()?,
        staff: data.load_staff()?,
    })
}

/// Schedule and write the weekly reports of `org`
pub async fn generate_reports(
    settings: &GenerationSettings,
    data: &DataDir,
    org: &Organization,
    generator: Arc<dyn TextGenerator>,
    narratives: HashMap<String, NarrativeArc>,
    only: &[String],
) -> Result<ReportSummary> {
    let schedules = plan_all(settings, &org.branches, &org.staff);
    let planned: usize = schedules.iter().map(|s| s.dates.len()).sum();
    info!(
        "Planned {} report dates across {} branches",
        planned,
        schedules.len()
    );

    let mut store = ReportStore::open(data.reports_dir())
        .await
        .context("failed to open report store")?;

    let mut reports = ReportGenerator::new(
        generator,
        narratives,
        settings.brand.clone(),
        settings.narrative_probability,
        settings.seed,
    );
    let summary = reports
        .run(&org.branches, &org.staff, &schedules, only, &mut store)
        .await?;

    let index = store
        .finalize()
        .await
        .context("failed to write report index")?;
    info!(
        "Index with {} entries saved to {}",
        index.len(),
        data.report_index_path().display()
    );
    summary.log();
    Ok(summary)
}
