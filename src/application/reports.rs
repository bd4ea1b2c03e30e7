//! Weekly report generation
//!
//! Walks the planned checkpoints branch by branch, asks the text generator for
//! each report and writes it through the `ReportStore`. A failed generation
//! call never aborts the run: the report gets a fixed fallback body instead.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use tracing::{info, warn};

use super::prompt::{build_prompt, ReportContext};
use super::schedule::{manager_of, BranchSchedule};
use crate::core::rng::{streams, RandomStream};
use crate::core::store::ReportStore;
use crate::domain::{BranchRecord, GeneratedText, NarrativeArc, StaffMember, WeeklyReport};
use crate::infrastructure::llm::TextGenerator;

/// Previous bodies fed back into the next prompt
const CONTINUITY: usize = 2;

const PROGRESS_EVERY: usize = 100;

/// Body used when the text generator fails
pub fn fallback_body(branch_name: &str, manager_first_name: &str) -> String {
    format!(
        "Weekly update from {}. Operations normal this week. - {}",
        branch_name, manager_first_name
    )
}

/// Subject used when the reply has none, or generation failed
pub fn fallback_subject(branch: &BranchRecord, brand: &str) -> String {
    format!("Weekly update - {}", branch.short_name(brand))
}

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub generated: usize,
    pub fallbacks: usize,
    /// `YYYY-MM` -> report count
    pub by_month: BTreeMap<String, usize>,
}

impl ReportSummary {
    fn record(&mut self, report: &WeeklyReport, fallback: bool) {
        self.generated += 1;
        if fallback {
            self.fallbacks += 1;
        }
        *self
            .by_month
            .entry(report.date.format("%Y-%m").to_string())
            .or_default() += 1;
    }

    pub fn log(&self) {
        info!(
            "Generated {} weekly reports ({} fallbacks)",
            self.generated, self.fallbacks
        );
        for (month, count) in &self.by_month {
            info!("  {}: {}", month, count);
        }
    }
}

/// Report content generator
pub struct ReportGenerator {
    generator: Arc<dyn TextGenerator>,
    narratives: HashMap<String, NarrativeArc>,
    brand: String,
    narrative_probability: f64,
    rng: RandomStream,
    counter: usize,
}

impl ReportGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        narratives: HashMap<String, NarrativeArc>,
        brand: impl Into<String>,
        narrative_probability: f64,
        seed: u64,
    ) -> Self {
        Self {
            generator,
            narratives,
            brand: brand.into(),
            narrative_probability,
            rng: RandomStream::derive(seed, streams::CONTENT),
            counter: 0,
        }
    }

    /// Generate every scheduled report. An empty `only` means all branches.
    pub async fn run(
        &mut self,
        branches: &[BranchRecord],
        staff: &[StaffMember],
        schedules: &[BranchSchedule],
        only: &[String],
        store: &mut ReportStore,
    ) -> Result<ReportSummary> {
        let filter: HashSet<&str> = only.iter().map(String::as_str).collect();
        let by_id: HashMap<&str, &BranchRecord> =
            branches.iter().map(|b| (b.id.as_str(), b)).collect();
        let expected: usize = schedules
            .iter()
            .filter(|s| filter.is_empty() || filter.contains(s.branch_id.as_str()))
            .map(|s| s.dates.len())
            .sum();

        if !filter.is_empty() {
            info!("Limiting to branches: {:?}", only);
        }

        let mut summary = ReportSummary::default();
        for schedule in schedules {
            if !filter.is_empty() && !filter.contains(schedule.branch_id.as_str()) {
                continue;
            }
            if schedule.dates.is_empty() {
                continue;
            }
            let Some(branch) = by_id.get(schedule.branch_id.as_str()) else {
                warn!("Schedule for unknown branch {}", schedule.branch_id);
                continue;
            };
            let Some(manager) = manager_of(staff, &branch.id) else {
                continue;
            };
            let roster: Vec<StaffMember> = staff
                .iter()
                .filter(|m| m.branch_id == branch.id)
                .cloned()
                .collect();

            info!(
                "--- {} ({}): {} reports ---",
                branch.name,
                branch.id,
                schedule.dates.len()
            );

            let mut previous: VecDeque<String> = VecDeque::with_capacity(CONTINUITY + 1);
            for date in &schedule.dates {
                let (report, fallback) = self
                    .generate_one(branch, manager, &roster, *date, &previous)
                    .await?;

                previous.push_back(report.text.clone());
                while previous.len() > CONTINUITY {
                    previous.pop_front();
                }

                store
                    .save(&report)
                    .await
                    .with_context(|| format!("failed to save {}", report.id))?;
                summary.record(&report, fallback);

                if summary.generated % PROGRESS_EVERY == 0 {
                    info!("Progress: {}/{} reports", summary.generated, expected);
                }
            }
        }

        Ok(summary)
    }

    /// One report plus whether the fallback body was used
    async fn generate_one(
        &mut self,
        branch: &BranchRecord,
        manager: &StaffMember,
        roster: &[StaffMember],
        date: NaiveDate,
        previous: &VecDeque<String>,
    ) -> Result<(WeeklyReport, bool)> {
        let include_narrative = self.rng.chance(self.narrative_probability);
        let previous: Vec<String> = previous.iter().cloned().collect();
        let ctx = ReportContext {
            branch: &branch.branch,
            manager,
            roster,
            date,
            previous_reports: &previous,
            narrative: self.narratives.get(&branch.id),
            include_narrative,
        };
        let prompt = build_prompt(&ctx);
        let subject_fallback = fallback_subject(branch, &self.brand);

        let (text, fallback) = match self.generator.generate(&prompt).await {
            Ok(raw) => (GeneratedText::parse(&raw, &subject_fallback), false),
            Err(e) => {
                warn!(
                    "Error generating report for {} on {}: {:#}",
                    branch.id, date, e
                );
                (
                    GeneratedText {
                        subject: subject_fallback.clone(),
                        body: fallback_body(&branch.name, manager.first_name()),
                    },
                    true,
                )
            }
        };

        self.counter += 1;
        let hour = self.rng.int_between(7, 20) as u32;
        let minute = self.rng.int_between(0, 59) as u32;
        let naive = date
            .and_hms_opt(hour, minute, 0)
            .with_context(|| format!("invalid report time {}:{} on {}", hour, minute, date))?;

        let report = WeeklyReport {
            id: format!("report-{:05}", self.counter),
            branch_id: branch.id.clone(),
            branch_name: branch.name.clone(),
            sender_email: manager.email.clone(),
            subject: text.subject,
            text: text.body,
            date,
            timestamp: Utc.from_utc_datetime(&naive),
        };
        Ok((report, fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_body_template() {
        assert_eq!(
            fallback_body("BeanStack Downtown Austin", "Maria"),
            "Weekly update from BeanStack Downtown Austin. Operations normal this week. - Maria"
        );
    }

    #[test]
    fn test_summary_counts_by_month() {
        let mut summary = ReportSummary::default();
        let report = WeeklyReport {
            id: "report-00001".to_string(),
            branch_id: "branch-001".to_string(),
            branch_name: "BeanStack Boston".to_string(),
            sender_email: "a.b@beanstack.com".to_string(),
            subject: "s".to_string(),
            text: "t".to_string(),
            date: crate::core::calendar::ymd(2025, 9, 7),
            timestamp: Utc::now(),
        };
        summary.record(&report, true);
        summary.record(&report, false);
        assert_eq!(summary.generated, 2);
        assert_eq!(summary.fallbacks, 1);
        assert_eq!(summary.by_month["2025-09"], 2);
    }
}
