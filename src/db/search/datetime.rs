//! Relaxed date/time parsing shared by birth date validation and the
//! birth date filter tokens.
//!
//! Accepted forms:
//! - `YYYY`
//! - `YYYY-MM`
//! - `YYYY-MM-DD`
//! - `YYYY-MM-DDThh:mm(:ss(.frac)?)?` with optional `Z` or `±hh:mm`
//! - `YYYY-MM-DD hh:mm:ss`
//!
//! No timezone is assumed unless explicitly present; the result is
//! normalized to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub fn parse_instant_utc(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() || !s.is_ascii() {
        return None;
    }

    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = s.parse().ok()?;
        return Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
    }

    if s.len() == 7 && s.as_bytes()[4] == b'-' {
        let year: i32 = s[0..4].parse().ok()?;
        let month: u32 = s[5..7].parse().ok()?;
        return Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single();
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    None
}
