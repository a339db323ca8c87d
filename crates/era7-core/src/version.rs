//! HL7 version identifiers

use crate::error::Error;
use std::str::FromStr;

/// HL7 v2.x version, 2.1 through 2.8.2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    V2_1,
    V2_2,
    V2_3,
    V2_3_1,
    V2_4,
    V2_5,
    V2_5_1,
    V2_6,
    V2_7,
    V2_7_1,
    V2_8,
    V2_8_1,
    V2_8_2,
}

impl Version {
    /// Parse a version from its MSH-12 representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "2.1" => Some(Version::V2_1),
            "2.2" => Some(Version::V2_2),
            "2.3" => Some(Version::V2_3),
            "2.3.1" => Some(Version::V2_3_1),
            "2.4" => Some(Version::V2_4),
            "2.5" => Some(Version::V2_5),
            "2.5.1" => Some(Version::V2_5_1),
            "2.6" => Some(Version::V2_6),
            "2.7" => Some(Version::V2_7),
            "2.7.1" => Some(Version::V2_7_1),
            "2.8" => Some(Version::V2_8),
            "2.8.1" => Some(Version::V2_8_1),
            "2.8.2" => Some(Version::V2_8_2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V2_1 => "2.1",
            Version::V2_2 => "2.2",
            Version::V2_3 => "2.3",
            Version::V2_3_1 => "2.3.1",
            Version::V2_4 => "2.4",
            Version::V2_5 => "2.5",
            Version::V2_5_1 => "2.5.1",
            Version::V2_6 => "2.6",
            Version::V2_7 => "2.7",
            Version::V2_7_1 => "2.7.1",
            Version::V2_8 => "2.8",
            Version::V2_8_1 => "2.8.1",
            Version::V2_8_2 => "2.8.2",
        }
    }

    /// Whether this version supports a feature introduced in `min_version`
    pub fn supports(&self, min_version: Version) -> bool {
        *self >= min_version
    }

    /// The most commonly deployed version
    pub fn common() -> Version {
        Version::V2_5_1
    }

    pub fn latest() -> Version {
        Version::V2_8_2
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::UnsupportedVersion(s.to_string()))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
