//! Staff domain entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{BeanstackError, Result};

/// Role hierarchy, lowest rank first so that `Manager` compares greatest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Barista,
    #[serde(rename = "Shift Lead")]
    ShiftLead,
    #[serde(rename = "Assistant Manager")]
    AssistantManager,
    Manager,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Barista => "Barista",
            Role::ShiftLead => "Shift Lead",
            Role::AssistantManager => "Assistant Manager",
            Role::Manager => "Manager",
        };
        write!(f, "{}", name)
    }
}

/// Employment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    Active,
    Inactive,
}

/// Staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub branch_id: String,
    pub branch_name: String,
    pub start_date: NaiveDate,
    pub status: StaffStatus,
}

impl StaffMember {
    /// Create a validated staff member
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        branch_id: impl Into<String>,
        branch_name: impl Into<String>,
        start_date: NaiveDate,
        status: StaffStatus,
    ) -> Result<Self> {
        let member = Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            branch_id: branch_id.into(),
            branch_name: branch_name.into(),
            start_date,
            status,
        };
        member.validate()?;
        Ok(member)
    }

    /// Field-level checks
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BeanstackError::ValidationError(format!(
                "staff {} has an empty name",
                self.id
            )));
        }
        let well_formed = self
            .email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !well_formed {
            return Err(BeanstackError::ValidationError(format!(
                "staff {} has a malformed email '{}'",
                self.id, self.email
            )));
        }
        if self.branch_id.trim().is_empty() {
            return Err(BeanstackError::ValidationError(format!(
                "staff {} is not attached to a branch",
                self.id
            )));
        }
        Ok(())
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    pub fn is_active(&self) -> bool {
        self.status == StaffStatus::Active
    }
}
