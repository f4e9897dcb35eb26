//! Cell-level parsing for surveillance files.
//!
//! Dates arrive in whatever shape the exporting tool chose: ISO strings,
//! US-style slashes, timestamps with a time-of-day part, or raw
//! spreadsheet serial numbers.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Largest serial a spreadsheet can represent (9999-12-31).
const MAX_SPREADSHEET_SERIAL: f64 = 2_958_465.0;

/// Parses a date string in any of the supported formats.
///
/// Time-of-day and timezone components are discarded.
#[must_use]
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Converts a spreadsheet date serial (days since 1899-12-30, fractional
/// part is the time of day) into a calendar date.
///
/// Returns `None` for non-finite or out-of-range serials.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn spreadsheet_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..=MAX_SPREADSHEET_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Parses a numeric cell. Thousands separators (`1,234`) are accepted.
#[must_use]
pub fn parse_number_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = if s.contains(',') {
        s.replace(',', "").parse::<f64>().ok()?
    } else {
        s.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

/// Normalizes a header cell for case-insensitive column matching.
#[must_use]
pub fn normalize_header(s: &str) -> String {
    s.trim_start_matches('\u{feff}').trim().to_ascii_lowercase()
}
