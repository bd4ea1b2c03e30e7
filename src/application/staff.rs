//! Staff generator
//!
//! Builds one roster per branch through `RosterBuilder::add_member`, then
//! resolves the branch drafts into `BranchRecord`s once every roster exists.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::info;

use crate::core::calendar::{add_days, days_between};
use crate::core::config::GenerationSettings;
use crate::core::faker;
use crate::core::rng::RandomStream;
use crate::domain::{Branch, BranchRecord, BranchSize, Role, StaffMember, StaffStatus};
use crate::errors::Result;

const ATTRITION_ROLES: [Role; 2] = [Role::Barista, Role::ShiftLead];

/// Head-count range by branch size
pub fn head_count_range(size: BranchSize) -> (i64, i64) {
    match size {
        BranchSize::Small => (4, 5),
        BranchSize::Medium => (5, 6),
        BranchSize::Large => (6, 8),
    }
}

/// Generates staff for every branch of a run
pub struct StaffGenerator<'a> {
    settings: &'a GenerationSettings,
    rng: RandomStream,
    next_id: usize,
    emails: HashSet<String>,
}

impl<'a> StaffGenerator<'a> {
    pub fn new(settings: &'a GenerationSettings, rng: RandomStream) -> Self {
        Self {
            settings,
            rng,
            next_id: 1,
            emails: HashSet::new(),
        }
    }

    /// Rosters of all branches, in branch order
    pub fn generate(mut self, branches: &[Branch]) -> Result<Vec<StaffMember>> {
        let mut staff = Vec::new();
        for branch in branches {
            staff.extend(self.roster(branch)?);
        }
        log_summary(&staff);
        Ok(staff)
    }

    fn roster(&mut self, branch: &Branch) -> Result<Vec<StaffMember>> {
        let (lo, hi) = head_count_range(branch.size);
        let head_count = self.rng.int_between(lo, hi);
        let closed = branch.is_closed();
        let default_status = if closed {
            StaffStatus::Inactive
        } else {
            StaffStatus::Active
        };

        let attrition = self.settings.attrition_probability;

        let mut roster = RosterBuilder::new(self, branch);
        roster.add_member(Role::Manager, default_status)?;

        let mut remaining = head_count - 1;
        if branch.size != BranchSize::Small {
            roster.add_member(Role::AssistantManager, default_status)?;
            remaining -= 1;
        }

        let shift_leads = (remaining / 2).min(2);
        for _ in 0..shift_leads {
            roster.add_member(Role::ShiftLead, default_status)?;
        }
        for _ in 0..(remaining - shift_leads) {
            roster.add_member(Role::Barista, default_status)?;
        }

        if !closed && roster.rng().chance(attrition) {
            let former = roster.rng().int_between(1, 2);
            for _ in 0..former {
                let role = *roster.rng().pick(&ATTRITION_ROLES).unwrap_or(&Role::Barista);
                roster.add_member(role, StaffStatus::Inactive)?;
            }
        }

        Ok(roster.finish())
    }

    /// `first.last@domain`, unique across the run
    fn email_for(&mut self, name: &str) -> String {
        let parts: Vec<String> = name
            .split_whitespace()
            .map(|p| {
                p.chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|p| !p.is_empty())
            .collect();

        let base = match parts.as_slice() {
            [] => format!("staff{}", self.rng.int_between(1, 99)),
            [only] => format!("{}{}", only, self.rng.int_between(1, 99)),
            [first, .., last] => format!("{}.{}", first, last),
        };

        let domain = &self.settings.email_domain;
        let mut local = base.clone();
        let mut n = 2;
        while self.emails.contains(&format!("{}@{}", local, domain)) {
            local = format!("{}{}", base, n);
            n += 1;
        }
        let email = format!("{}@{}", local, domain);
        self.emails.insert(email.clone());
        email
    }

    /// Start date for `role`, never after `cutoff` and never before the
    /// role's earliest allowed date
    fn start_date(&mut self, opened: NaiveDate, role: Role, cutoff: NaiveDate) -> NaiveDate {
        let (lo, hi) = match role {
            Role::Manager => (-30, 60),
            Role::AssistantManager => (0, 180),
            Role::ShiftLead | Role::Barista => (0, (days_between(opened, cutoff) - 30).max(0)),
        };
        let earliest = add_days(opened, lo);
        let start = add_days(opened, self.rng.int_between(lo, hi));
        if start <= cutoff {
            return start;
        }
        add_days(cutoff, -self.rng.int_between(30, 365)).max(earliest)
    }
}

/// Roster of a single branch
pub struct RosterBuilder<'g, 'a> {
    generator: &'g mut StaffGenerator<'a>,
    branch: &'g Branch,
    cutoff: NaiveDate,
    members: Vec<StaffMember>,
}

impl<'g, 'a> RosterBuilder<'g, 'a> {
    fn new(generator: &'g mut StaffGenerator<'a>, branch: &'g Branch) -> Self {
        let cutoff = effective_cutoff(branch, generator.settings.staff_cutoff);
        Self {
            generator,
            branch,
            cutoff,
            members: Vec::new(),
        }
    }

    fn rng(&mut self) -> &mut RandomStream {
        &mut self.generator.rng
    }

    /// Hire one person into the roster
    pub fn add_member(&mut self, role: Role, status: StaffStatus) -> Result<()> {
        let name = faker::person_name(&mut self.generator.rng);
        let email = self.generator.email_for(&name);
        let start_date = self
            .generator
            .start_date(self.branch.opened_date(), role, self.cutoff);
        let id = format!("staff-{:04}", self.generator.next_id);
        self.generator.next_id += 1;

        self.members.push(StaffMember::new(
            id,
            name,
            email,
            role,
            &self.branch.id,
            &self.branch.name,
            start_date,
            status,
        )?);
        Ok(())
    }

    fn finish(self) -> Vec<StaffMember> {
        self.members
    }
}

/// Last day anyone can start at `branch`
pub fn effective_cutoff(branch: &Branch, global: NaiveDate) -> NaiveDate {
    match branch.closed_date() {
        Some(closed) => closed.min(global),
        None => global,
    }
}

/// Phase 2: attach manager contacts to the branch drafts.
/// Open branches take their Manager's email, closed branches get none.
pub fn resolve_branches(branches: &[Branch], staff: &[StaffMember]) -> Vec<BranchRecord> {
    let mut managers: HashMap<&str, &str> = HashMap::new();
    for member in staff.iter().filter(|m| m.role == Role::Manager) {
        managers
            .entry(member.branch_id.as_str())
            .or_insert(member.email.as_str());
    }

    branches
        .iter()
        .map(|branch| {
            let manager_email = if branch.is_closed() {
                String::new()
            } else {
                managers
                    .get(branch.id.as_str())
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            };
            BranchRecord {
                branch: branch.clone(),
                manager_email,
            }
        })
        .collect()
}

fn log_summary(staff: &[StaffMember]) {
    let mut by_role: BTreeMap<String, usize> = BTreeMap::new();
    for member in staff.iter().filter(|m| m.is_active()) {
        *by_role.entry(member.role.to_string()).or_default() += 1;
    }
    let inactive = staff.iter().filter(|m| !m.is_active()).count();

    info!("Generated {} staff members", staff.len());
    for (role, count) in by_role {
        info!("  {}: {}", role, count);
    }
    info!("  Inactive (former): {}", inactive);
}
