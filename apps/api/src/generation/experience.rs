//! Date parsing and experience-duration derivation.
//!
//! Profile dates are free text. Unparseable values are excluded from the
//! calculation, never fatal. `now` is injected so results are deterministic
//! under test.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{debug, warn};

use crate::models::profile::Experience;

/// Month-year formats tried after the explicit `MM/YYYY` check. A synthetic
/// day is appended because chrono needs a complete date.
const MONTH_YEAR_FORMATS: &[&str] = &["%B %Y", "%b %Y", "%Y-%m", "%m-%Y"];

const FULL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Normalizes a free-text date to an instant.
///
/// Rules, in order: empty -> None; "present" (any case) -> `now`;
/// `M/YYYY` or `MM/YYYY` -> first of that month; otherwise a fallback list of
/// common date formats. Failure is logged and yields None — never an error.
pub fn parse_start_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.eq_ignore_ascii_case("present") {
        return Some(now);
    }

    if let Some(date) = parse_month_slash_year(trimmed) {
        return Some(start_of_day(date));
    }

    for format in MONTH_YEAR_FORMATS {
        let padded = format!("{trimmed} 1");
        let padded_format = format!("{format} %d");
        if let Ok(date) = NaiveDate::parse_from_str(&padded, &padded_format) {
            return Some(start_of_day(date));
        }
    }

    for format in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(start_of_day(date));
        }
    }

    // Bare 4-digit year.
    if trimmed.len() == 4 {
        if let Ok(year) = trimmed.parse::<i32>() {
            if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
                return Some(start_of_day(date));
            }
        }
    }

    debug!("could not parse date string {trimmed:?}; excluding from calculation");
    None
}

/// `M/YYYY` or `MM/YYYY` -> first of month.
fn parse_month_slash_year(raw: &str) -> Option<NaiveDate> {
    let (month_part, year_part) = raw.split_once('/')?;
    if month_part.len() > 2 || year_part.len() != 4 {
        return None;
    }
    let month: u32 = month_part.parse().ok()?;
    let year: i32 = year_part.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Total years of experience, rounded to the nearest integer, measured from
/// the earliest parseable start date. Entries with malformed dates are
/// silently excluded; if nothing parses the result is 0 with a warning.
pub fn years_of_experience(entries: &[Experience], now: DateTime<Utc>) -> u32 {
    let earliest = entries
        .iter()
        .filter_map(|e| e.start_date.as_deref())
        .filter_map(|raw| parse_start_date(raw, now))
        .min();

    let Some(earliest) = earliest else {
        if !entries.is_empty() {
            warn!("no experience entry had a parseable start date; reporting 0 years");
        }
        return 0;
    };

    let days = (now - earliest).num_days();
    if days <= 0 {
        return 0;
    }
    (days as f64 / 365.0).round() as u32
}
