//! On-disk record format tests

mod common;

use beanstack::core::calendar::ymd;
use beanstack::domain::{
    BranchRecord, BranchSize, BranchStatus, FinancialReport, ReportType, Role, StaffMember,
    StaffStatus,
};
use common::{closed_branch, open_branch};
use serde_json::json;

pub fn financial_json() -> serde_json::Value {
    json!({
        "id": "q3-2025-branch-001",
        "report_type": "quarterly",
        "branch_id": "branch-001",
        "branch_name": "BeanStack Downtown Austin",
        "period": "Q3-2025",
        "start_date": "2025-07-01",
        "end_date": "2025-09-30",
        "submitted_by": "maria.lopez@beanstack.com",
        "submitted_at": "2025-10-03T16:20:00Z",
        "revenue": 284500.0,
        "transactions": 41200,
        "avg_ticket": 6.91,
        "labor_hours": 5400,
        "labor_cost_pct": 31.5,
        "labor_manager_narrative": "Covered two sick weeks with overtime.",
        "inventory_waste_pct": 4.2,
        "top_selling_items": ["Oat Latte", "Cold Brew"],
        "inventory_manager_narrative": "Milk spoilage after the cooler failed.",
        "customer_satisfaction": 4.4,
        "employee_count": 7,
        "turnover_count": 1,
        "equipment_issues": 2,
        "notes": "Patio reopened in August."
    })
}

#[test]
fn test_branch_record_flat_layout() {
    let record = BranchRecord {
        branch: open_branch("branch-001", ymd(2020, 1, 1)),
        manager_email: "maria.lopez@beanstack.com".to_string(),
    };
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["address"], "100 Oak St");
    assert_eq!(value["city"], "Austin");
    assert_eq!(value["opened_date"], "2020-01-01");
    assert_eq!(value["status"], "open");
    assert_eq!(value["size"], "medium");
    assert_eq!(value["manager_email"], "maria.lopez@beanstack.com");

    let back: BranchRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_closed_branch_record() {
    let record = BranchRecord {
        branch: closed_branch("branch-002", ymd(2019, 3, 1), ymd(2025, 6, 1)),
        manager_email: String::new(),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["status"], "closed");
    assert_eq!(value["closed_date"], "2025-06-01");

    let back: BranchRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back.status(), BranchStatus::Closed);
    assert_eq!(back.size, BranchSize::Small);
    assert_eq!(back.closed_date(), Some(ymd(2025, 6, 1)));
}

#[test]
fn test_branch_record_rejects_inconsistent_status() {
    let record = BranchRecord {
        branch: open_branch("branch-001", ymd(2020, 1, 1)),
        manager_email: String::new(),
    };
    let mut value = serde_json::to_value(&record).unwrap();
    value["status"] = json!("closed");
    assert!(serde_json::from_value::<BranchRecord>(value).is_err());
}

#[test]
fn test_staff_member_format() {
    let member = StaffMember::new(
        "staff-0001",
        "Maria Lopez",
        "maria.lopez@beanstack.com",
        Role::AssistantManager,
        "branch-001",
        "BeanStack Downtown Austin",
        ymd(2020, 2, 1),
        StaffStatus::Active,
    )
    .unwrap();
    let value = serde_json::to_value(&member).unwrap();
    assert_eq!(value["role"], "Assistant Manager");
    assert_eq!(value["status"], "active");
    assert_eq!(value["start_date"], "2020-02-01");
    assert_eq!(member.first_name(), "Maria");

    let back: StaffMember = serde_json::from_value(value).unwrap();
    assert_eq!(back, member);
}

#[test]
fn test_financial_report_parses() {
    let report = FinancialReport::from_json(&financial_json().to_string()).unwrap();
    assert_eq!(report.report_type, ReportType::Quarterly);
    assert_eq!(report.top_selling_items.len(), 2);

    let doc = report.search_document().unwrap();
    assert_eq!(doc["notes_embedding"], "Patio reopened in August.");
    assert_eq!(
        doc["labor_manager_narrative_embedding"],
        doc["labor_manager_narrative"]
    );
}

#[test]
fn test_financial_report_validation() {
    let mut raw = financial_json();
    raw["customer_satisfaction"] = json!(6.0);
    assert!(FinancialReport::from_json(&raw.to_string()).is_err());

    let mut raw = financial_json();
    raw["period"] = json!("2025");
    assert!(FinancialReport::from_json(&raw.to_string()).is_err());

    let mut raw = financial_json();
    raw["end_date"] = json!("2025-06-30");
    assert!(FinancialReport::from_json(&raw.to_string()).is_err());
}
