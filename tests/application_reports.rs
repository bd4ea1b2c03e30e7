//! Report scheduling and generation tests

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use beanstack::application::pipeline::{generate_organization, generate_reports, Organization};
use beanstack::application::reports::fallback_body;
use beanstack::application::schedule::{manager_of, plan_all, valid_interval};
use beanstack::application::staff::resolve_branches;
use beanstack::core::calendar::ymd;
use beanstack::core::config::GenerationSettings;
use beanstack::core::store::{read_json, DataDir, ReportStore};
use beanstack::domain::{
    Branch, LengthBucket, NarrativeArc, ReportFile, ReportIndexEntry, Role, StaffMember,
    StaffStatus,
};
use chrono::NaiveDate;
use common::{closed_branch, open_branch, setup, MockGenerator};
use tempfile::TempDir;

const REPLY: &str = "Subject: Slow Tuesday\nFrom: someone@beanstack.com\n\nGrinder jammed twice, fixed by noon. - Maria";

fn manager(id: &str, branch: &Branch, start: NaiveDate) -> StaffMember {
    StaffMember::new(
        id,
        "Maria Lopez",
        format!("maria.lopez.{}@beanstack.com", branch.id),
        Role::Manager,
        &branch.id,
        &branch.name,
        start,
        if branch.is_closed() {
            StaffStatus::Inactive
        } else {
            StaffStatus::Active
        },
    )
    .unwrap()
}

fn barista(id: &str, branch: &Branch, start: NaiveDate) -> StaffMember {
    StaffMember::new(
        id,
        "Sam Park",
        format!("sam.park.{}@beanstack.com", branch.id),
        Role::Barista,
        &branch.id,
        &branch.name,
        start,
        StaffStatus::Active,
    )
    .unwrap()
}

/// One open branch with a manager starting before the window, one branch
/// closed before the window
fn hand_built_org() -> Organization {
    let open = open_branch("branch-001", ymd(2020, 1, 1));
    let closed = closed_branch("branch-002", ymd(2019, 1, 1), ymd(2025, 6, 1));
    let staff = vec![
        manager("staff-0001", &open, ymd(2020, 1, 10)),
        barista("staff-0002", &open, ymd(2021, 5, 1)),
        manager("staff-0003", &closed, ymd(2019, 1, 5)),
    ];
    let branches = resolve_branches(&[open, closed], &staff);
    Organization { branches, staff }
}

fn settings() -> GenerationSettings {
    GenerationSettings {
        mid_week_probability: 0.0,
        narrative_probability: 0.0,
        ..GenerationSettings::default()
    }
}

#[test]
fn test_closed_before_window_has_no_interval() {
    let org = hand_built_org();
    let settings = settings();
    let closed = &org.branches[1];
    let manager = manager_of(&org.staff, &closed.id).unwrap();
    assert!(valid_interval(closed, manager, &settings).is_none());

    let schedules = plan_all(&settings, &org.branches, &org.staff);
    let closed_schedule = schedules.iter().find(|s| s.branch_id == "branch-002").unwrap();
    assert!(closed_schedule.dates.is_empty());
}

#[tokio::test]
async fn test_no_reports_after_closing_inside_window() {
    let open = open_branch("branch-001", ymd(2020, 1, 1));
    let closing = closed_branch("branch-003", ymd(2019, 1, 1), ymd(2025, 10, 15));
    let staff = vec![
        manager("staff-0001", &open, ymd(2020, 1, 10)),
        manager("staff-0002", &closing, ymd(2019, 1, 5)),
    ];
    let branches = resolve_branches(&[open, closing], &staff);
    let org = Organization { branches, staff };
    let settings = settings();

    let schedules = plan_all(&settings, &org.branches, &org.staff);
    let dates = &schedules
        .iter()
        .find(|s| s.branch_id == "branch-003")
        .unwrap()
        .dates;
    // Sundays 2025-08-03 through 2025-10-12
    assert_eq!(dates.len(), 11);
    assert_eq!(*dates.last().unwrap(), ymd(2025, 10, 12));

    let dir = TempDir::new().unwrap();
    let data = DataDir::new(dir.path());
    generate_reports(
        &settings,
        &data,
        &org,
        Arc::new(MockGenerator::replying(REPLY)),
        HashMap::new(),
        &[],
    )
    .await
    .unwrap();

    let closing_dates: Vec<NaiveDate> = data
        .load_report_index()
        .unwrap()
        .into_iter()
        .filter(|e| e.branch_id == "branch-003")
        .map(|e| e.date)
        .collect();
    assert_eq!(closing_dates.len(), 11);
    assert!(closing_dates.iter().all(|d| *d <= ymd(2025, 10, 15)));
}

#[test]
fn test_schedule_respects_interval() {
    let settings = GenerationSettings {
        mid_week_probability: 0.5,
        ..GenerationSettings::default()
    };
    let org = generate_organization(&settings).unwrap();
    let schedules = plan_all(&settings, &org.branches, &org.staff);

    for schedule in &schedules {
        let branch = org.branches.iter().find(|b| b.id == schedule.branch_id).unwrap();
        let manager = manager_of(&org.staff, &branch.id).unwrap();
        match valid_interval(branch, manager, &settings) {
            Some((start, end)) => {
                assert!(schedule.dates.iter().all(|d| *d >= start && *d <= end));
                assert!(schedule.dates.windows(2).all(|w| w[0] <= w[1]));
            }
            None => assert!(schedule.dates.is_empty()),
        }
    }
}

#[test]
fn test_schedule_is_deterministic() {
    let settings = GenerationSettings::default();
    let org = generate_organization(&settings).unwrap();
    assert_eq!(
        plan_all(&settings, &org.branches, &org.staff),
        plan_all(&settings, &org.branches, &org.staff)
    );
}

#[tokio::test]
async fn test_reports_written_and_indexed() {
    setup();
    let dir = TempDir::new().unwrap();
    let data = DataDir::new(dir.path());
    let org = hand_built_org();
    let settings = settings();
    let generator = Arc::new(MockGenerator::replying(REPLY));

    let summary = generate_reports(
        &settings,
        &data,
        &org,
        generator.clone(),
        HashMap::new(),
        &[],
    )
    .await
    .unwrap();

    // Sundays from 2025-08-03 through 2026-01-25
    assert_eq!(summary.generated, 26);
    assert_eq!(summary.fallbacks, 0);
    assert_eq!(generator.calls(), 26);

    let index: Vec<ReportIndexEntry> = read_json(&data.report_index_path()).unwrap();
    assert_eq!(index.len(), 26);
    assert!(index.iter().all(|e| e.branch_id == "branch-001"));
    assert_eq!(index[0].id, "report-00001");
    assert_eq!(index[0].date, ymd(2025, 8, 3));

    for entry in &index {
        let content = std::fs::read_to_string(data.resolve(&entry.file_path)).unwrap();
        let file = ReportFile::parse(&content);
        assert_eq!(file.subject, "Slow Tuesday");
        assert_eq!(file.sender_email, "maria.lopez.branch-001@beanstack.com");
        assert_eq!(file.date, entry.date.format("%Y-%m-%d").to_string());
        assert_eq!(file.text, "Grinder jammed twice, fixed by noon. - Maria");
    }

    let journal = ReportStore::read_journal(&data.reports_dir()).await.unwrap();
    assert_eq!(journal, index);
}

#[tokio::test]
async fn test_failed_generation_uses_fallback() {
    let dir = TempDir::new().unwrap();
    let data = DataDir::new(dir.path());
    let org = hand_built_org();
    let settings = settings();

    let summary = generate_reports(
        &settings,
        &data,
        &org,
        Arc::new(MockGenerator::failing()),
        HashMap::new(),
        &[],
    )
    .await
    .unwrap();
    assert_eq!(summary.generated, summary.fallbacks);

    let index = data.load_report_index().unwrap();
    let content = std::fs::read_to_string(data.resolve(&index[0].file_path)).unwrap();
    let file = ReportFile::parse(&content);
    assert_eq!(
        file.text,
        "Weekly update from BeanStack Test branch-001. Operations normal this week. - Maria"
    );
    assert_eq!(file.text, fallback_body("BeanStack Test branch-001", "Maria"));
    assert_eq!(file.subject, "Weekly update - Test branch-001");
}

#[tokio::test]
async fn test_single_failure_does_not_stop_run() {
    let dir = TempDir::new().unwrap();
    let data = DataDir::new(dir.path());
    let org = hand_built_org();

    let summary = generate_reports(
        &settings(),
        &data,
        &org,
        Arc::new(MockGenerator::failing_on(REPLY, &[3])),
        HashMap::new(),
        &[],
    )
    .await
    .unwrap();
    assert_eq!(summary.generated, 26);
    assert_eq!(summary.fallbacks, 1);
}

#[tokio::test]
async fn test_previous_reports_feed_next_prompt() {
    let dir = TempDir::new().unwrap();
    let data = DataDir::new(dir.path());
    let org = hand_built_org();
    let generator = Arc::new(MockGenerator::replying(REPLY));

    generate_reports(
        &settings(),
        &data,
        &org,
        generator.clone(),
        HashMap::new(),
        &[],
    )
    .await
    .unwrap();

    let prompts = generator.prompts();
    assert!(prompts[0].contains("This is the first report from this branch."));
    assert!(prompts[1].contains("<report index=\"1\">Grinder jammed twice"));
    assert!(!prompts[1].contains("<report index=\"2\">"));
    assert!(prompts[2].contains("<report index=\"2\">"));
    assert!(!prompts[5].contains("<report index=\"3\">"));
    assert!(prompts[0].contains("<active>Sam</active>"));
}

#[tokio::test]
async fn test_narrative_injected_when_drawn() {
    let dir = TempDir::new().unwrap();
    let data = DataDir::new(dir.path());
    let org = hand_built_org();
    let generator = Arc::new(MockGenerator::replying(REPLY));
    let settings = GenerationSettings {
        narrative_probability: 1.0,
        mid_week_probability: 0.0,
        ..GenerationSettings::default()
    };
    let narratives = HashMap::from([(
        "branch-001".to_string(),
        NarrativeArc {
            tone: "stressed".to_string(),
            description: "The espresso machine keeps failing".to_string(),
            themes: vec!["equipment".to_string()],
            message_length: LengthBucket::Short,
        },
    )]);

    generate_reports(&settings, &data, &org, generator.clone(), narratives, &[])
        .await
        .unwrap();

    let prompts = generator.prompts();
    assert!(prompts
        .iter()
        .all(|p| p.contains("<description>The espresso machine keeps failing</description>")));
    assert!(prompts.iter().all(|p| p.contains("<tone>stressed</tone>")));
    assert!(prompts.iter().all(|p| p.contains("60-80 words")));
}

#[tokio::test]
async fn test_branch_filter_keeps_dates() {
    let settings = GenerationSettings {
        mid_week_probability: 0.3,
        ..common::small_settings(8)
    };
    let org = generate_organization(&settings).unwrap();
    let target = org
        .branches
        .iter()
        .find(|b| !b.is_closed())
        .map(|b| b.id.clone())
        .unwrap();

    let full_dir = TempDir::new().unwrap();
    let full = DataDir::new(full_dir.path());
    generate_reports(
        &settings,
        &full,
        &org,
        Arc::new(MockGenerator::replying(REPLY)),
        HashMap::new(),
        &[],
    )
    .await
    .unwrap();

    let only_dir = TempDir::new().unwrap();
    let only = DataDir::new(only_dir.path());
    generate_reports(
        &settings,
        &only,
        &org,
        Arc::new(MockGenerator::replying(REPLY)),
        HashMap::new(),
        std::slice::from_ref(&target),
    )
    .await
    .unwrap();

    let full_dates: Vec<NaiveDate> = full
        .load_report_index()
        .unwrap()
        .into_iter()
        .filter(|e| e.branch_id == target)
        .map(|e| e.date)
        .collect();
    let only_index = only.load_report_index().unwrap();
    assert!(only_index.iter().all(|e| e.branch_id == target));
    let only_dates: Vec<NaiveDate> = only_index.into_iter().map(|e| e.date).collect();
    assert_eq!(full_dates, only_dates);
}
