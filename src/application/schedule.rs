//! Report scheduling
//!
//! Decides which dates get a report, independently of content generation.
//! Planning draws only from the schedule stream, so the same seed always
//! yields the same checkpoints no matter how content generation goes.

use chrono::{NaiveDate, Weekday};

use crate::core::calendar::{add_days, next_weekday_on_or_after};
use crate::core::config::GenerationSettings;
use crate::core::rng::RandomStream;
use crate::domain::{Branch, BranchRecord, Role, StaffMember};

/// Checkpoints of one branch, ascending
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSchedule {
    pub branch_id: String,
    pub dates: Vec<NaiveDate>,
}

/// `[max(window_start, manager start), min(window_end, closed_date)]`,
/// or `None` when the interval is empty
pub fn valid_interval(
    branch: &Branch,
    manager: &StaffMember,
    settings: &GenerationSettings,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = settings.report_window_start.max(manager.start_date);
    let end = match branch.closed_date() {
        Some(closed) => settings.report_window_end.min(closed),
        None => settings.report_window_end,
    };
    (start < end).then_some((start, end))
}

/// Weekly Sunday checkpoints in `[start, end]`, each with a chance of an extra
/// mid-week checkpoint 2..=4 days earlier
pub fn checkpoints(
    rng: &mut RandomStream,
    start: NaiveDate,
    end: NaiveDate,
    mid_week_probability: f64,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        let sunday = next_weekday_on_or_after(current, Weekday::Sun);
        if sunday <= end {
            dates.push(sunday);
            if rng.chance(mid_week_probability) {
                let mid_week = add_days(sunday, -rng.int_between(2, 4));
                if mid_week >= start {
                    dates.push(mid_week);
                }
            }
        }
        current = add_days(current, 7);
    }
    dates.sort();
    dates
}

/// Manager of a branch, whatever their status
pub fn manager_of<'s>(staff: &'s [StaffMember], branch_id: &str) -> Option<&'s StaffMember> {
    staff
        .iter()
        .find(|m| m.branch_id == branch_id && m.role == Role::Manager)
}

/// Plan every branch up front. Branches without a manager get no schedule.
pub fn plan_all(
    settings: &GenerationSettings,
    branches: &[BranchRecord],
    staff: &[StaffMember],
) -> Vec<BranchSchedule> {
    let mut rng = RandomStream::derive(settings.seed, crate::core::rng::streams::SCHEDULE);

    branches
        .iter()
        .filter_map(|branch| {
            let manager = manager_of(staff, &branch.id)?;
            let dates = match valid_interval(branch, manager, settings) {
                Some((start, end)) => {
                    checkpoints(&mut rng, start, end, settings.mid_week_probability)
                }
                None => Vec::new(),
            };
            Some(BranchSchedule {
                branch_id: branch.id.clone(),
                dates,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::ymd;
    use chrono::Datelike;

    #[test]
    fn test_checkpoints_are_sundays_without_mid_week() {
        let mut rng = RandomStream::seeded(1);
        let dates = checkpoints(&mut rng, ymd(2025, 8, 1), ymd(2025, 8, 31), 0.0);
        assert_eq!(
            dates,
            vec![
                ymd(2025, 8, 3),
                ymd(2025, 8, 10),
                ymd(2025, 8, 17),
                ymd(2025, 8, 24),
                ymd(2025, 8, 31)
            ]
        );
        assert!(dates.iter().all(|d| d.weekday() == Weekday::Sun));
    }

    #[test]
    fn test_mid_week_stays_inside_interval() {
        let mut rng = RandomStream::seeded(2);
        let start = ymd(2025, 8, 2);
        let dates = checkpoints(&mut rng, start, ymd(2025, 12, 31), 1.0);
        assert!(dates.iter().all(|d| *d >= start));
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert!(dates.len() > 21);
    }

    #[test]
    fn test_same_seed_same_checkpoints() {
        let plan = |seed| {
            let mut rng = RandomStream::seeded(seed);
            checkpoints(&mut rng, ymd(2025, 8, 1), ymd(2026, 1, 31), 0.5)
        };
        assert_eq!(plan(9), plan(9));
    }
}
