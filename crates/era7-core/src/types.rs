//! HL7 date and timestamp helpers

use chrono::{NaiveDate, NaiveDateTime};

/// Parse an HL7 DT value: YYYY, YYYYMM, or YYYYMMDD
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match s.len() {
        4 => NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1),
        6 => {
            let year = s[0..4].parse().ok()?;
            let month = s[4..6].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, 1)
        }
        8 => {
            let year = s[0..4].parse().ok()?;
            let month = s[4..6].parse().ok()?;
            let day = s[6..8].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        _ => None,
    }
}

/// Parse an HL7 TS/DTM value: YYYYMMDD[HH[MM[SS]]], fractional seconds
/// and timezone offsets are tolerated and ignored
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let main = s.split(['+', '.']).next()?;
    let main = match main.rfind('-') {
        Some(idx) if idx >= 8 => &main[..idx],
        Some(_) => return None,
        None => main,
    };

    if main.len() < 8 {
        return None;
    }
    let date = parse_date(&main[0..8])?;

    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        main.get(range).and_then(|d| d.parse().ok())
    };
    let hour = if main.len() >= 10 { digits(8..10)? } else { 0 };
    let minute = if main.len() >= 12 { digits(10..12)? } else { 0 };
    let second = if main.len() >= 14 { digits(12..14)? } else { 0 };

    date.and_hms_opt(hour, minute, second)
}

/// Format a timestamp in the canonical 14-digit form
pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format("%Y%m%d%H%M%S").to_string()
}
