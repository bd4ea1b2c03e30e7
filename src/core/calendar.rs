//! Date helpers shared by the generators

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Date format used in every generated file
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Years the generators and report periods accept
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Date from constant parts; invalid parts collapse to `NaiveDate::MIN`.
/// Callers with configured years check them against [`SUPPORTED_YEARS`] first.
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// `date + days`
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Whole days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// First `weekday` on or after `date`
pub fn next_weekday_on_or_after(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = date.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    add_days(date, (target - current).rem_euclid(7))
}

/// `"YYYY-MM-DD"`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `"August 03, 2025"`
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Seasonal context for a coffee shop in a given month
pub fn season_context(date: NaiveDate) -> &'static str {
    match date.month() {
        1 => "new year, post-holiday slump, winter drinks, New Year's resolutions, cold weather",
        2 => "mid-winter, Valentine's Day specials, cold mornings, steady hot drink sales",
        3 => "early spring, spring break traffic, weather warming up, lighter menu items",
        4 => "spring, rainy days, Easter weekend, patio seating opening up",
        5 => "late spring, graduation season, Mother's Day rush, cold brew picking up",
        6 => "early summer, school out, iced drinks taking over, longer afternoons",
        7 => "mid-summer, hot weather, tourists, iced and blended drinks dominate",
        8 => "late summer, back to school starting, iced drinks popular, hot weather",
        9 => "early fall, pumpkin spice season launching, weather cooling down",
        10 => "fall, Halloween approaching, football season, cozy drinks trending",
        11 => "late fall, Thanksgiving prep, pre-holiday rush starting, colder weather",
        12 => "winter holiday season, Christmas rush, peppermint drinks, gift cards, very busy",
        _ => "normal season",
    }
}

/// Serde helpers for dates stored as `""` when absent
pub mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_sunday() {
        // 2025-08-01 is a Friday
        let friday = ymd(2025, 8, 1);
        assert_eq!(next_weekday_on_or_after(friday, Weekday::Sun), ymd(2025, 8, 3));
        let sunday = ymd(2025, 8, 3);
        assert_eq!(next_weekday_on_or_after(sunday, Weekday::Sun), sunday);
        let monday = ymd(2025, 8, 4);
        assert_eq!(next_weekday_on_or_after(monday, Weekday::Sun), ymd(2025, 8, 10));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(ymd(2020, 1, 1), ymd(2020, 3, 1)), 60);
        assert_eq!(days_between(ymd(2020, 1, 1), ymd(2019, 12, 2)), -30);
    }

    #[test]
    fn test_formatting() {
        let date = ymd(2025, 8, 3);
        assert_eq!(format_date(date), "2025-08-03");
        assert_eq!(long_date(date), "August 03, 2025");
    }

    #[test]
    fn test_every_month_has_a_season() {
        for month in 1..=12 {
            assert_ne!(season_context(ymd(2025, month, 1)), "normal season");
        }
    }
}
