//! Branch generator
//!
//! Turns the city catalog into branch drafts. All randomness comes from the
//! `RandomStream` handed in by the caller.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::core::calendar::{add_days, days_between, ymd};
use crate::core::config::GenerationSettings;
use crate::core::faker;
use crate::core::rng::RandomStream;
use crate::domain::{Address, Branch, BranchSize, CitySpec, GeoPoint, Lifecycle};
use crate::errors::Result;

const LOCATION_TYPES: &[&str] = &[
    "Downtown",
    "Midtown",
    "Uptown",
    "Financial District",
    "Arts District",
    "University",
    "Airport",
    "Mall",
    "Station",
    "Harbor",
    "Park",
    "Main Street",
    "Market Street",
    "Broadway",
    "Central",
    "Waterfront",
];

const SIZE_WEIGHTS: [(BranchSize, f64); 3] = [
    (BranchSize::Small, 0.3),
    (BranchSize::Medium, 0.5),
    (BranchSize::Large, 0.2),
];

const KM_PER_DEGREE: f64 = 111.0;

/// Generates branch drafts from the city catalog
pub struct BranchGenerator<'a> {
    settings: &'a GenerationSettings,
    rng: RandomStream,
}

impl<'a> BranchGenerator<'a> {
    pub fn new(settings: &'a GenerationSettings, rng: RandomStream) -> Self {
        Self { settings, rng }
    }

    /// One branch per catalog slot, grouped by city in catalog order
    pub fn generate(mut self) -> Result<Vec<Branch>> {
        let mut branches = Vec::new();

        for city in &self.settings.cities {
            let mut used_names = HashSet::new();
            for index in 0..city.branch_count {
                let name = self.branch_name(city, index, &used_names);
                used_names.insert(name.clone());

                let id = format!("branch-{:03}", branches.len() + 1);
                let location = self.jitter(city.lat, city.lon);
                let address = self.address(city);
                let size = self
                    .rng
                    .weighted(&SIZE_WEIGHTS)
                    .copied()
                    .unwrap_or(BranchSize::Medium);
                let opened = self.opened_date();
                let lifecycle = self.lifecycle(opened);

                debug!("Generated {} ({})", id, name);
                branches.push(Branch::new(
                    id,
                    name,
                    address,
                    city.region,
                    location,
                    size,
                    lifecycle,
                )?);
            }
        }

        log_summary(&branches);
        Ok(branches)
    }

    fn branch_name(&mut self, city: &CitySpec, index: usize, used: &HashSet<String>) -> String {
        let brand = &self.settings.brand;
        if city.branch_count == 1 {
            return format!("{} {}", brand, city.city);
        }

        for _ in 0..self.settings.name_attempts {
            let location = self.rng.pick(LOCATION_TYPES).copied().unwrap_or("Central");
            let candidate = if self.rng.chance(self.settings.street_name_probability) {
                format!("{} {} {}", brand, faker::street_word(&mut self.rng), city.city)
            } else {
                format!("{} {} {}", brand, location, city.city)
            };
            if !used.contains(&candidate) {
                return candidate;
            }
        }

        let mut n = index + 1;
        loop {
            let candidate = format!("{} {} #{}", brand, city.city, n);
            if !used.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn jitter(&mut self, lat: f64, lon: f64) -> GeoPoint {
        let radius = self.settings.jitter_radius_km;
        let lat_offset = self.rng.float_between(-radius, radius) / KM_PER_DEGREE;
        let lon_offset = self.rng.float_between(-radius, radius) / KM_PER_DEGREE;
        GeoPoint {
            lat: round6(lat + lat_offset),
            lon: round6(lon + lon_offset),
        }
    }

    fn address(&mut self, city: &CitySpec) -> Address {
        let number = self.rng.int_between(1, 9999);
        let street = faker::street_name(&mut self.rng);
        Address {
            street: format!("{} {}", number, street),
            city: city.city.clone(),
            state: city.state.clone(),
            zip: faker::zipcode(&mut self.rng, &city.zip_prefix),
        }
    }

    fn opened_date(&mut self) -> NaiveDate {
        let year = self.rng.int_between(
            self.settings.first_opening_year as i64,
            self.settings.last_opening_year as i64,
        ) as i32;
        let month = self.rng.int_between(1, 12) as u32;
        let day = self.rng.int_between(1, 28) as u32;
        ymd(year, month, day)
    }

    fn lifecycle(&mut self, opened: NaiveDate) -> Lifecycle {
        if !self.rng.chance(self.settings.closure_probability) {
            return Lifecycle::Open { opened };
        }
        match closing_date(
            &mut self.rng,
            opened,
            self.settings.min_tenure_days,
            self.settings.fallback_tenure_days,
            self.settings.closure_cutoff,
        ) {
            Some(closed) => Lifecycle::Closed { opened, closed },
            None => Lifecycle::Open { opened },
        }
    }
}

/// Closing date in `(opened + min_tenure, cutoff]`, falling back to
/// `(opened + fallback_tenure, cutoff]`. `None` when neither window has room.
pub fn closing_date(
    rng: &mut RandomStream,
    opened: NaiveDate,
    min_tenure_days: i64,
    fallback_tenure_days: i64,
    cutoff: NaiveDate,
) -> Option<NaiveDate> {
    let mut earliest = add_days(opened, min_tenure_days);
    if earliest >= cutoff {
        earliest = add_days(opened, fallback_tenure_days);
    }
    let range = days_between(earliest, cutoff);
    if range <= 0 {
        return None;
    }
    Some(add_days(earliest, rng.int_between(1, range)))
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn log_summary(branches: &[Branch]) {
    let mut regions: BTreeMap<String, usize> = BTreeMap::new();
    for branch in branches {
        *regions.entry(branch.region.to_string()).or_default() += 1;
    }
    let closed = branches.iter().filter(|b| b.is_closed()).count();

    info!("Generated {} branches ({} closed)", branches.len(), closed);
    for (region, count) in regions {
        info!("  {}: {}", region, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_date_after_tenure() {
        let mut rng = RandomStream::seeded(1);
        let opened = ymd(2020, 1, 1);
        for _ in 0..200 {
            let closed = closing_date(&mut rng, opened, 180, 30, ymd(2026, 1, 15)).unwrap();
            assert!(closed > add_days(opened, 180));
            assert!(closed <= ymd(2026, 1, 15));
        }
    }

    #[test]
    fn test_closing_date_fallback_window() {
        let mut rng = RandomStream::seeded(2);
        let opened = ymd(2025, 10, 1);
        let closed = closing_date(&mut rng, opened, 180, 30, ymd(2026, 1, 15)).unwrap();
        assert!(closed > add_days(opened, 30));
    }

    #[test]
    fn test_closing_date_infeasible() {
        let mut rng = RandomStream::seeded(3);
        assert!(closing_date(&mut rng, ymd(2026, 1, 1), 180, 30, ymd(2026, 1, 15)).is_none());
    }

    #[test]
    fn test_round6() {
        assert_eq!(round6(30.12345678), 30.123457);
    }
}
