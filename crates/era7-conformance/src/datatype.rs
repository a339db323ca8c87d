//! Syntactic validation of HL7 data types
//!
//! Each validator checks the wire syntax only: no terminology lookups,
//! no calendar arithmetic beyond the ranges the standard spells out.
//! Empty values are always accepted here; required-ness is the
//! engine's concern.

use serde::{Deserialize, Serialize};

/// HL7 data type tags recognized by the validators
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataTypeKind {
    /// String
    ST,
    /// Text
    TX,
    /// Formatted text
    FT,
    /// Numeric
    NM,
    /// Sequence id
    SI,
    /// Date
    DT,
    /// Time
    TM,
    /// Date/time
    DTM,
    /// Timestamp
    TS,
    /// Coded value from an HL7 table
    ID,
    /// Coded value from a user table
    IS,
    /// Coded element
    CE,
    /// Coded with exceptions
    CWE,
    /// Coded with no exceptions
    CNE,
    /// Extended composite id
    CX,
    /// Extended person name
    XPN,
    /// Extended address
    XAD,
    /// Extended telecommunication number
    XTN,
    /// Hierarchic designator
    HD,
    /// Entity identifier
    EI,
    /// Message type
    MSG,
    /// Processing type
    PT,
}

impl DataTypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataTypeKind::ST => "ST",
            DataTypeKind::TX => "TX",
            DataTypeKind::FT => "FT",
            DataTypeKind::NM => "NM",
            DataTypeKind::SI => "SI",
            DataTypeKind::DT => "DT",
            DataTypeKind::TM => "TM",
            DataTypeKind::DTM => "DTM",
            DataTypeKind::TS => "TS",
            DataTypeKind::ID => "ID",
            DataTypeKind::IS => "IS",
            DataTypeKind::CE => "CE",
            DataTypeKind::CWE => "CWE",
            DataTypeKind::CNE => "CNE",
            DataTypeKind::CX => "CX",
            DataTypeKind::XPN => "XPN",
            DataTypeKind::XAD => "XAD",
            DataTypeKind::XTN => "XTN",
            DataTypeKind::HD => "HD",
            DataTypeKind::EI => "EI",
            DataTypeKind::MSG => "MSG",
            DataTypeKind::PT => "PT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ST" => Some(DataTypeKind::ST),
            "TX" => Some(DataTypeKind::TX),
            "FT" => Some(DataTypeKind::FT),
            "NM" => Some(DataTypeKind::NM),
            "SI" => Some(DataTypeKind::SI),
            "DT" => Some(DataTypeKind::DT),
            "TM" => Some(DataTypeKind::TM),
            "DTM" => Some(DataTypeKind::DTM),
            "TS" => Some(DataTypeKind::TS),
            "ID" => Some(DataTypeKind::ID),
            "IS" => Some(DataTypeKind::IS),
            "CE" => Some(DataTypeKind::CE),
            "CWE" => Some(DataTypeKind::CWE),
            "CNE" => Some(DataTypeKind::CNE),
            "CX" => Some(DataTypeKind::CX),
            "XPN" => Some(DataTypeKind::XPN),
            "XAD" => Some(DataTypeKind::XAD),
            "XTN" => Some(DataTypeKind::XTN),
            "HD" => Some(DataTypeKind::HD),
            "EI" => Some(DataTypeKind::EI),
            "MSG" => Some(DataTypeKind::MSG),
            "PT" => Some(DataTypeKind::PT),
            _ => None,
        }
    }
}

/// Result of checking one value against one data type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataTypeValidation {
    Valid,
    /// Acceptable but worth flagging (e.g. over-long coded values)
    Warning(String),
    Invalid(String),
}

impl DataTypeValidation {
    pub fn is_valid(&self) -> bool {
        !matches!(self, DataTypeValidation::Invalid(_))
    }
}

/// Validate a raw value against a data type's syntax
pub fn validate_value(value: &str, kind: DataTypeKind) -> DataTypeValidation {
    if value.is_empty() {
        return DataTypeValidation::Valid;
    }

    match kind {
        DataTypeKind::NM => validate_numeric(value),
        DataTypeKind::SI => validate_sequence_id(value),
        DataTypeKind::DT => validate_date(value),
        DataTypeKind::TM => validate_time(value),
        DataTypeKind::DTM | DataTypeKind::TS => validate_timestamp(value),
        DataTypeKind::ID | DataTypeKind::IS => validate_coded(value),
        // Strings and composites pass through
        _ => DataTypeValidation::Valid,
    }
}

/// NM: optional sign, digits, at most one decimal point, no grouping
fn validate_numeric(value: &str) -> DataTypeValidation {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    if unsigned.is_empty() {
        return DataTypeValidation::Invalid("numeric value has no digits".to_string());
    }

    let mut seen_point = false;
    let mut seen_digit = false;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            '.' => {
                return DataTypeValidation::Invalid(
                    "numeric value has more than one decimal point".to_string(),
                )
            }
            other => {
                return DataTypeValidation::Invalid(format!(
                    "numeric value contains {:?}",
                    other
                ))
            }
        }
    }

    if seen_digit {
        DataTypeValidation::Valid
    } else {
        DataTypeValidation::Invalid("numeric value has no digits".to_string())
    }
}

/// SI: non-negative integer
fn validate_sequence_id(value: &str) -> DataTypeValidation {
    if value.chars().all(|c| c.is_ascii_digit()) {
        DataTypeValidation::Valid
    } else {
        DataTypeValidation::Invalid("sequence id must be a non-negative integer".to_string())
    }
}

/// DT: YYYY, YYYYMM, or YYYYMMDD with month 1-12 and day 1-31
fn validate_date(value: &str) -> DataTypeValidation {
    let len = value.len();
    if len != 4 && len != 6 && len != 8 {
        return DataTypeValidation::Invalid(format!(
            "date must be 4, 6, or 8 digits, got {} characters",
            len
        ));
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return DataTypeValidation::Invalid("date must contain only digits".to_string());
    }

    if len >= 6 {
        let month: u32 = value[4..6].parse().unwrap_or(0);
        if !(1..=12).contains(&month) {
            return DataTypeValidation::Invalid(format!("invalid month {:02}", month));
        }
    }
    if len == 8 {
        let day: u32 = value[6..8].parse().unwrap_or(0);
        if !(1..=31).contains(&day) {
            return DataTypeValidation::Invalid(format!("invalid day {:02}", day));
        }
    }

    DataTypeValidation::Valid
}

/// TM: HHMM[SS[.f]] with an optional ±HHMM timezone
fn validate_time(value: &str) -> DataTypeValidation {
    let (time_part, zone) = split_zone(value);
    if let Some(zone) = zone {
        if let Some(reason) = check_zone(zone) {
            return DataTypeValidation::Invalid(reason);
        }
    }

    let (main, fraction) = match time_part.split_once('.') {
        Some((main, frac)) => (main, Some(frac)),
        None => (time_part, None),
    };

    if let Some(frac) = fraction {
        if frac.is_empty() || frac.len() > 4 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return DataTypeValidation::Invalid(
                "fractional seconds must be 1-4 digits".to_string(),
            );
        }
        if main.len() != 6 {
            return DataTypeValidation::Invalid(
                "fractional seconds require HHMMSS".to_string(),
            );
        }
    }

    if main.len() != 4 && main.len() != 6 {
        return DataTypeValidation::Invalid(format!(
            "time must be HHMM or HHMMSS, got {} digits",
            main.len()
        ));
    }
    if !main.chars().all(|c| c.is_ascii_digit()) {
        return DataTypeValidation::Invalid("time must contain only digits".to_string());
    }

    let hours: u32 = main[0..2].parse().unwrap_or(99);
    if hours > 23 {
        return DataTypeValidation::Invalid(format!("invalid hours {:02}", hours));
    }
    let minutes: u32 = main[2..4].parse().unwrap_or(99);
    if minutes > 59 {
        return DataTypeValidation::Invalid(format!("invalid minutes {:02}", minutes));
    }
    if main.len() == 6 {
        let seconds: u32 = main[4..6].parse().unwrap_or(99);
        if seconds > 59 {
            return DataTypeValidation::Invalid(format!("invalid seconds {:02}", seconds));
        }
    }

    DataTypeValidation::Valid
}

/// TS/DTM: a DT prefix, optionally followed by a TM, with an optional zone
fn validate_timestamp(value: &str) -> DataTypeValidation {
    let (main, zone) = split_zone(value);
    if let Some(zone) = zone {
        if let Some(reason) = check_zone(zone) {
            return DataTypeValidation::Invalid(reason);
        }
    }

    if main.len() <= 8 {
        return validate_date(main);
    }

    let (date_part, time_part) = main.split_at(8);
    match validate_date(date_part) {
        DataTypeValidation::Valid => validate_time(time_part),
        invalid => invalid,
    }
}

/// ID/IS: any text, but over-long codes are suspicious
fn validate_coded(value: &str) -> DataTypeValidation {
    let length = value.chars().count();
    if length > 20 {
        DataTypeValidation::Warning(format!(
            "coded value is {} characters long (> 20)",
            length
        ))
    } else {
        DataTypeValidation::Valid
    }
}

/// Split a trailing ±HHMM zone off a time or timestamp
fn split_zone(value: &str) -> (&str, Option<&str>) {
    match value.rfind(['+', '-']) {
        Some(idx) if idx > 0 => (&value[..idx], Some(&value[idx..])),
        _ => (value, None),
    }
}

fn check_zone(zone: &str) -> Option<String> {
    let digits = &zone[1..];
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("timezone must be ±HHMM, got {:?}", zone));
    }
    let hours: u32 = digits[0..2].parse().unwrap_or(99);
    let minutes: u32 = digits[2..4].parse().unwrap_or(99);
    if hours > 23 || minutes > 59 {
        return Some(format!("timezone out of range: {:?}", zone));
    }
    None
}
