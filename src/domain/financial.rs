//! Financial report data contract
//!
//! Quarterly and yearly operational metrics submitted per branch. Only the
//! schema and its validation live here; figures come from outside the rig.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::calendar::{add_days, ymd, SUPPORTED_YEARS};
use crate::errors::{BeanstackError, Result};

/// Report cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    Quarterly,
    Yearly,
}

/// Reporting period with explicit bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPeriod {
    pub report_type: ReportType,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportPeriod {
    /// Calendar quarter `q` (1..=4) of `year`, labelled `Q3-2025`
    pub fn quarter(year: i32, q: u32) -> Result<Self> {
        if !(1..=4).contains(&q) {
            return Err(BeanstackError::ValidationError(format!(
                "quarter must be 1..=4, got {}",
                q
            )));
        }
        if !SUPPORTED_YEARS.contains(&year) {
            return Err(BeanstackError::ValidationError(format!(
                "year {} is out of range",
                year
            )));
        }
        let start = ymd(year, (q - 1) * 3 + 1, 1);
        let next = if q == 4 {
            ymd(year + 1, 1, 1)
        } else {
            ymd(year, q * 3 + 1, 1)
        };
        Ok(Self {
            report_type: ReportType::Quarterly,
            label: format!("Q{}-{}", q, year),
            start_date: start,
            end_date: add_days(next, -1),
        })
    }

    /// Whole calendar year, labelled `2025`
    pub fn year(year: i32) -> Self {
        Self {
            report_type: ReportType::Yearly,
            label: year.to_string(),
            start_date: ymd(year, 1, 1),
            end_date: ymd(year, 12, 31),
        }
    }

    /// Report id for a branch, e.g. `q3-2025-branch-042` or `2025-branch-042`
    pub fn report_id(&self, branch_id: &str) -> String {
        format!("{}-{}", self.label.to_lowercase(), branch_id)
    }

    /// Whether `label` is well-formed for `report_type`
    pub fn label_matches(report_type: ReportType, label: &str) -> bool {
        match report_type {
            ReportType::Yearly => label.len() == 4 && label.parse::<i32>().is_ok(),
            ReportType::Quarterly => label
                .strip_prefix('Q')
                .and_then(|rest| rest.split_once('-'))
                .map(|(q, year)| {
                    matches!(q, "1" | "2" | "3" | "4")
                        && year.len() == 4
                        && year.parse::<i32>().is_ok()
                })
                .unwrap_or(false),
        }
    }
}

/// Quarterly / yearly financial report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub id: String,
    #[serde(default)]
    pub report_type: ReportType,
    pub branch_id: String,
    pub branch_name: String,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,

    // Revenue & sales
    pub revenue: f64,
    pub transactions: u64,
    pub avg_ticket: f64,

    // Labor
    pub labor_hours: u64,
    pub labor_cost_pct: f64,
    pub labor_manager_narrative: String,

    // Inventory
    pub inventory_waste_pct: f64,
    pub top_selling_items: Vec<String>,
    pub inventory_manager_narrative: String,

    // Customer
    pub customer_satisfaction: f64,

    // Staffing
    pub employee_count: u32,
    pub turnover_count: u32,

    // Operations
    pub equipment_issues: u32,
    pub notes: String,
}

impl FinancialReport {
    /// Parse and validate a report document
    pub fn from_json(raw: &str) -> Result<Self> {
        let report: FinancialReport = serde_json::from_str(raw)?;
        report.validate()?;
        Ok(report)
    }

    /// Field-level checks
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> {
            Err(BeanstackError::ValidationError(format!("{}: {}", self.id, msg)))
        };

        if self.id.trim().is_empty() || self.branch_id.trim().is_empty() {
            return Err(BeanstackError::ValidationError(
                "financial report needs an id and a branch_id".to_string(),
            ));
        }
        if !(1.0..=5.0).contains(&self.customer_satisfaction) {
            return fail(format!(
                "customer_satisfaction {} outside [1, 5]",
                self.customer_satisfaction
            ));
        }
        if self.end_date < self.start_date {
            return fail(format!(
                "end_date {} precedes start_date {}",
                self.end_date, self.start_date
            ));
        }
        for (field, value) in [
            ("labor_cost_pct", self.labor_cost_pct),
            ("inventory_waste_pct", self.inventory_waste_pct),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return fail(format!("{} {} outside [0, 100]", field, value));
            }
        }
        if self.revenue < 0.0 || self.avg_ticket < 0.0 {
            return fail("revenue and avg_ticket must be non-negative".to_string());
        }
        if !ReportPeriod::label_matches(self.report_type, &self.period) {
            return fail(format!(
                "period '{}' does not match report type {:?}",
                self.period, self.report_type
            ));
        }
        Ok(())
    }

    /// Search document with narrative text copied into the embedding fields
    pub fn search_document(&self) -> Result<serde_json::Value> {
        let mut doc = serde_json::to_value(self)?;
        if let Some(map) = doc.as_object_mut() {
            map.insert(
                "labor_manager_narrative_embedding".to_string(),
                self.labor_manager_narrative.clone().into(),
            );
            map.insert(
                "inventory_manager_narrative_embedding".to_string(),
                self.inventory_manager_narrative.clone().into(),
            );
            map.insert("notes_embedding".to_string(), self.notes.clone().into());
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_bounds() {
        let q3 = ReportPeriod::quarter(2025, 3).unwrap();
        assert_eq!(q3.label, "Q3-2025");
        assert_eq!(q3.start_date, ymd(2025, 7, 1));
        assert_eq!(q3.end_date, ymd(2025, 9, 30));
        assert_eq!(q3.report_id("branch-042"), "q3-2025-branch-042");

        let q4 = ReportPeriod::quarter(2025, 4).unwrap();
        assert_eq!(q4.end_date, ymd(2025, 12, 31));

        assert!(ReportPeriod::quarter(2025, 5).is_err());
        assert!(ReportPeriod::quarter(-40_000, 1).is_err());
    }

    #[test]
    fn test_year_bounds() {
        let year = ReportPeriod::year(2024);
        assert_eq!(year.label, "2024");
        assert_eq!(year.end_date, ymd(2024, 12, 31));
        assert_eq!(year.report_id("branch-001"), "2024-branch-001");
    }

    #[test]
    fn test_label_matches() {
        assert!(ReportPeriod::label_matches(ReportType::Quarterly, "Q1-2025"));
        assert!(!ReportPeriod::label_matches(ReportType::Quarterly, "Q5-2025"));
        assert!(!ReportPeriod::label_matches(ReportType::Quarterly, "2025"));
        assert!(ReportPeriod::label_matches(ReportType::Yearly, "2025"));
        assert!(!ReportPeriod::label_matches(ReportType::Yearly, "Q1-2025"));
    }
}
