//! Branch domain entity
//!
//! `Branch` is the phase-1 draft produced by the branch generator.
//! `BranchRecord` is the phase-2 view that also carries the resolved manager
//! contact; it is what gets written to `branches.json`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::calendar::{self, days_between};
use crate::errors::{BeanstackError, Result};

/// Shortest lifetime a closed branch may have
pub const MIN_TENURE_DAYS: i64 = 30;

/// Sales region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Northeast,
    Southeast,
    Midwest,
    Southwest,
    West,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Region::Northeast => "Northeast",
            Region::Southeast => "Southeast",
            Region::Midwest => "Midwest",
            Region::Southwest => "Southwest",
            Region::West => "West",
        };
        write!(f, "{}", name)
    }
}

/// Branch size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchSize {
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for BranchSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchSize::Small => write!(f, "small"),
            BranchSize::Medium => write!(f, "medium"),
            BranchSize::Large => write!(f, "large"),
        }
    }
}

/// Branch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Open,
    Closed,
}

/// Latitude / longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Postal address
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Opening and optional closing date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Open { opened: NaiveDate },
    Closed { opened: NaiveDate, closed: NaiveDate },
}

impl Lifecycle {
    pub fn opened(&self) -> NaiveDate {
        match self {
            Lifecycle::Open { opened } | Lifecycle::Closed { opened, .. } => *opened,
        }
    }

    pub fn closed(&self) -> Option<NaiveDate> {
        match self {
            Lifecycle::Open { .. } => None,
            Lifecycle::Closed { closed, .. } => Some(*closed),
        }
    }

    pub fn status(&self) -> BranchStatus {
        match self {
            Lifecycle::Open { .. } => BranchStatus::Open,
            Lifecycle::Closed { .. } => BranchStatus::Closed,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Lifecycle::Closed { opened, closed } = self {
            if days_between(*opened, *closed) < MIN_TENURE_DAYS {
                return Err(BeanstackError::ValidationError(format!(
                    "closed_date {} must be at least {} days after opened_date {}",
                    closed, MIN_TENURE_DAYS, opened
                )));
            }
        }
        Ok(())
    }
}

/// Catalog entry: where branches are opened and how many
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySpec {
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub region: Region,
    pub zip_prefix: String,
    pub branch_count: usize,
}

impl CitySpec {
    fn new(
        city: &str,
        state: &str,
        lat: f64,
        lon: f64,
        region: Region,
        zip_prefix: &str,
        branch_count: usize,
    ) -> Self {
        Self {
            city: city.to_string(),
            state: state.to_string(),
            lat,
            lon,
            region,
            zip_prefix: zip_prefix.to_string(),
            branch_count,
        }
    }
}

/// Major US cities the chain operates in
pub fn default_city_catalog() -> Vec<CitySpec> {
    use Region::*;
    vec![
        CitySpec::new("New York", "NY", 40.7128, -74.0060, Northeast, "100", 12),
        CitySpec::new("Boston", "MA", 42.3601, -71.0589, Northeast, "021", 5),
        CitySpec::new("Philadelphia", "PA", 39.9526, -75.1652, Northeast, "191", 4),
        CitySpec::new("Washington", "DC", 38.9072, -77.0369, Northeast, "200", 5),
        CitySpec::new("Miami", "FL", 25.7617, -80.1918, Southeast, "331", 6),
        CitySpec::new("Atlanta", "GA", 33.7490, -84.3880, Southeast, "303", 5),
        CitySpec::new("Orlando", "FL", 28.5383, -81.3792, Southeast, "328", 3),
        CitySpec::new("Charlotte", "NC", 35.2271, -80.8431, Southeast, "282", 3),
        CitySpec::new("Chicago", "IL", 41.8781, -87.6298, Midwest, "606", 8),
        CitySpec::new("Detroit", "MI", 42.3314, -83.0458, Midwest, "482", 3),
        CitySpec::new("Minneapolis", "MN", 44.9778, -93.2650, Midwest, "554", 3),
        CitySpec::new("Columbus", "OH", 39.9612, -82.9988, Midwest, "432", 2),
        CitySpec::new("Austin", "TX", 30.2672, -97.7431, Southwest, "787", 5),
        CitySpec::new("Houston", "TX", 29.7604, -95.3698, Southwest, "770", 6),
        CitySpec::new("Dallas", "TX", 32.7767, -96.7970, Southwest, "752", 5),
        CitySpec::new("Phoenix", "AZ", 33.4484, -112.0740, Southwest, "850", 4),
        CitySpec::new("Denver", "CO", 39.7392, -104.9903, Southwest, "802", 4),
        CitySpec::new("Los Angeles", "CA", 34.0522, -118.2437, West, "900", 10),
        CitySpec::new("San Francisco", "CA", 37.7749, -122.4194, West, "941", 6),
        CitySpec::new("Seattle", "WA", 47.6062, -122.3321, West, "981", 6),
        CitySpec::new("San Diego", "CA", 32.7157, -117.1611, West, "921", 4),
        CitySpec::new("Portland", "OR", 45.5152, -122.6784, West, "972", 3),
    ]
}

/// Physical retail location (phase-1 draft)
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub address: Address,
    pub region: Region,
    pub location: GeoPoint,
    pub size: BranchSize,
    pub lifecycle: Lifecycle,
}

impl Branch {
    /// Create a validated branch
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: Address,
        region: Region,
        location: GeoPoint,
        size: BranchSize,
        lifecycle: Lifecycle,
    ) -> Result<Self> {
        let branch = Self {
            id: id.into(),
            name: name.into(),
            address,
            region,
            location,
            size,
            lifecycle,
        };
        branch.validate()?;
        Ok(branch)
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(BeanstackError::ValidationError("branch id is empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(BeanstackError::ValidationError(format!(
                "branch {} has an empty name",
                self.id
            )));
        }
        if !(-90.0..=90.0).contains(&self.location.lat)
            || !(-180.0..=180.0).contains(&self.location.lon)
        {
            return Err(BeanstackError::ValidationError(format!(
                "branch {} has coordinates out of range",
                self.id
            )));
        }
        self.lifecycle.validate()
    }

    pub fn opened_date(&self) -> NaiveDate {
        self.lifecycle.opened()
    }

    pub fn closed_date(&self) -> Option<NaiveDate> {
        self.lifecycle.closed()
    }

    pub fn status(&self) -> BranchStatus {
        self.lifecycle.status()
    }

    pub fn is_closed(&self) -> bool {
        self.status() == BranchStatus::Closed
    }

    /// Name without the brand prefix, e.g. `"Downtown Austin"`
    pub fn short_name(&self, brand: &str) -> String {
        self.name
            .strip_prefix(brand)
            .map(|rest| rest.trim_start().to_string())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Fully resolved branch (phase 2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "BranchRow", try_from = "BranchRow")]
pub struct BranchRecord {
    pub branch: Branch,
    /// Contact of the active manager; empty for closed branches
    pub manager_email: String,
}

impl std::ops::Deref for BranchRecord {
    type Target = Branch;

    fn deref(&self) -> &Branch {
        &self.branch
    }
}

/// Flat on-disk representation of a `BranchRecord`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRow {
    id: String,
    name: String,
    address: String,
    city: String,
    state: String,
    zip: String,
    region: Region,
    location: GeoPoint,
    size: BranchSize,
    opened_date: NaiveDate,
    #[serde(with = "calendar::optional_date", default)]
    closed_date: Option<NaiveDate>,
    status: BranchStatus,
    #[serde(default)]
    manager_email: String,
}

impl From<BranchRecord> for BranchRow {
    fn from(record: BranchRecord) -> Self {
        let BranchRecord {
            branch,
            manager_email,
        } = record;
        let status = branch.status();
        Self {
            id: branch.id,
            name: branch.name,
            address: branch.address.street,
            city: branch.address.city,
            state: branch.address.state,
            zip: branch.address.zip,
            region: branch.region,
            location: branch.location,
            size: branch.size,
            opened_date: branch.lifecycle.opened(),
            closed_date: branch.lifecycle.closed(),
            status,
            manager_email,
        }
    }
}

impl TryFrom<BranchRow> for BranchRecord {
    type Error = BeanstackError;

    fn try_from(row: BranchRow) -> Result<Self> {
        let lifecycle = match (row.status, row.closed_date) {
            (BranchStatus::Open, None) => Lifecycle::Open {
                opened: row.opened_date,
            },
            (BranchStatus::Closed, Some(closed)) => Lifecycle::Closed {
                opened: row.opened_date,
                closed,
            },
            (status, closed) => {
                return Err(BeanstackError::ValidationError(format!(
                    "branch {}: status {:?} inconsistent with closed_date {:?}",
                    row.id, status, closed
                )))
            }
        };
        let branch = Branch::new(
            row.id,
            row.name,
            Address {
                street: row.address,
                city: row.city,
                state: row.state,
                zip: row.zip,
            },
            row.region,
            row.location,
            row.size,
            lifecycle,
        )?;
        Ok(Self {
            branch,
            manager_email: row.manager_email,
        })
    }
}
