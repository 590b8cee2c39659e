// Reporting modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::EncoderError;

/// Which stages an encoder runs.
///
/// `BASIC*` modes take their bloom value from a `BasicSignaller` instead of
/// hashing. `*ONE-TIME` modes report the PRR directly, without IRR noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReportingMode {
    #[default]
    #[serde(rename = "STANDARD")]
    Standard,
    #[serde(rename = "ONE-TIME")]
    OneTime,
    #[serde(rename = "BASIC")]
    Basic,
    #[serde(rename = "BASIC-ONE-TIME")]
    BasicOneTime,
}

impl ReportingMode {
    pub const ALL: [ReportingMode; 4] = [
        ReportingMode::Standard,
        ReportingMode::OneTime,
        ReportingMode::Basic,
        ReportingMode::BasicOneTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportingMode::Standard => "STANDARD",
            ReportingMode::OneTime => "ONE-TIME",
            ReportingMode::Basic => "BASIC",
            ReportingMode::BasicOneTime => "BASIC-ONE-TIME",
        }
    }

    /// Needs an external bloom source
    pub fn is_basic(&self) -> bool {
        matches!(self, ReportingMode::Basic | ReportingMode::BasicOneTime)
    }

    /// Skips the IRR stage
    pub fn is_one_time(&self) -> bool {
        matches!(self, ReportingMode::OneTime | ReportingMode::BasicOneTime)
    }
}

impl fmt::Display for ReportingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportingMode {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('_', "-");
        ReportingMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| EncoderError::Configuration(format!("Unknown reporting mode: {}", s)))
    }
}
