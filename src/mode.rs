//! Measurement functions and speeds, and normalization of user supplied
//! tokens into them.
//!
//! Both enums carry their canonical SCPI token. String input is matched
//! case-insensitively after trimming against a per-type alias table, so the
//! same token may mean different things for different targets: `"F"` is
//! [`MeasurementMode::Frequency`] but also [`MeasurementSpeed::Fast`].

use std::fmt;
use std::str::FromStr;

use crate::proto::{ProtoError, Result};

/// Measurement function selected with `CONF:<token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementMode {
    VoltageDC,
    VoltageAC,
    CurrentDC,
    CurrentAC,
    Resistance,
    Capacitance,
    Frequency,
}

impl MeasurementMode {
    pub const ALL: [MeasurementMode; 7] = [
        Self::VoltageDC,
        Self::VoltageAC,
        Self::CurrentDC,
        Self::CurrentAC,
        Self::Resistance,
        Self::Capacitance,
        Self::Frequency,
    ];

    /// Canonical protocol token.
    pub const fn token(self) -> &'static str {
        match self {
            Self::VoltageDC => "VOLT:DC",
            Self::VoltageAC => "VOLT:AC",
            Self::CurrentDC => "CURR:DC",
            Self::CurrentAC => "CURR:AC",
            Self::Resistance => "RES",
            Self::Capacitance => "CAP",
            Self::Frequency => "FREQ",
        }
    }

    /// Short name as printed on the front panel.
    pub const fn name(self) -> &'static str {
        match self {
            Self::VoltageDC => "VDC",
            Self::VoltageAC => "VAC",
            Self::CurrentDC => "IDC",
            Self::CurrentAC => "IAC",
            Self::Resistance => "RES",
            Self::Capacitance => "CAP",
            Self::Frequency => "FREQ",
        }
    }

    /// Look up an already uppercased and trimmed alias.
    fn from_alias(alias: &str) -> Option<Self> {
        let mode = match alias {
            "VDC" | "VOLT:DC" => Self::VoltageDC,
            "VAC" | "VOLT:AC" => Self::VoltageAC,
            "IDC" | "CURR:DC" => Self::CurrentDC,
            "IAC" | "CURR:AC" => Self::CurrentAC,
            "RES" | "OHM" => Self::Resistance,
            "CAP" | "C" => Self::Capacitance,
            "FREQ" | "F" => Self::Frequency,
            _ => return None,
        };
        Some(mode)
    }
}

/// Integration speed selected with `RATE <token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementSpeed {
    Fast,
    Medium,
    Slow,
}

impl MeasurementSpeed {
    pub const ALL: [MeasurementSpeed; 3] = [Self::Fast, Self::Medium, Self::Slow];

    /// Canonical protocol token.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Fast => "F",
            Self::Medium => "M",
            Self::Slow => "S",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Fast => "FAST",
            Self::Medium => "MEDIUM",
            Self::Slow => "SLOW",
        }
    }

    fn from_alias(alias: &str) -> Option<Self> {
        let speed = match alias {
            "F" | "FAST" => Self::Fast,
            "M" | "MID" | "MEDIUM" => Self::Medium,
            // "L" is accepted for "low" speed
            "S" | "SLOW" | "L" => Self::Slow,
            _ => return None,
        };
        Some(speed)
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl fmt::Display for MeasurementSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for MeasurementMode {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_alias(&s.trim().to_ascii_uppercase()).ok_or_else(|| {
            ProtoError::UnrecognizedToken {
                value: s.to_string(),
                kind: "MeasurementMode",
            }
        })
    }
}

impl FromStr for MeasurementSpeed {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_alias(&s.trim().to_ascii_uppercase()).ok_or_else(|| {
            ProtoError::UnrecognizedToken {
                value: s.to_string(),
                kind: "MeasurementSpeed",
            }
        })
    }
}

/// Conversion of caller input into a mode or speed.
///
/// Enum values pass through unchanged, strings go through the alias table
/// of the target type.
pub trait Normalize<T> {
    fn normalize(self) -> Result<T>;
}

impl Normalize<MeasurementMode> for MeasurementMode {
    fn normalize(self) -> Result<MeasurementMode> {
        Ok(self)
    }
}

impl Normalize<MeasurementSpeed> for MeasurementSpeed {
    fn normalize(self) -> Result<MeasurementSpeed> {
        Ok(self)
    }
}

impl<T: FromStr<Err = ProtoError>> Normalize<T> for &str {
    fn normalize(self) -> Result<T> {
        self.parse()
    }
}

impl<T: FromStr<Err = ProtoError>> Normalize<T> for &String {
    fn normalize(self) -> Result<T> {
        self.parse()
    }
}

impl<T: FromStr<Err = ProtoError>> Normalize<T> for String {
    fn normalize(self) -> Result<T> {
        self.parse()
    }
}

pub fn normalize<T>(value: impl Normalize<T>) -> Result<T> {
    value.normalize()
}
