use std::fmt;

use crate::mode::{MeasurementMode, MeasurementSpeed};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `*IDN?`
    Identify,
    /// `CONF:<mode>`
    Configure(MeasurementMode),
    /// `RATE <speed>`
    Rate(MeasurementSpeed),
    /// `MEAS?`
    Measure,
    Raw(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Identify => f.write_str("*IDN?"),
            Command::Configure(mode) => write!(f, "CONF:{}", mode.token()),
            Command::Rate(speed) => write!(f, "RATE {}", speed.token()),
            Command::Measure => f.write_str("MEAS?"),
            Command::Raw(line) => f.write_str(line),
        }
    }
}

impl From<&str> for Command {
    fn from(value: &str) -> Self {
        Command::Raw(value.to_string())
    }
}

impl From<String> for Command {
    fn from(value: String) -> Self {
        Command::Raw(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_text() {
        assert_eq!(Command::Identify.to_string(), "*IDN?");
        assert_eq!(
            Command::Configure(MeasurementMode::VoltageDC).to_string(),
            "CONF:VOLT:DC"
        );
        assert_eq!(
            Command::Configure(MeasurementMode::Frequency).to_string(),
            "CONF:FREQ"
        );
        assert_eq!(Command::Rate(MeasurementSpeed::Slow).to_string(), "RATE S");
        assert_eq!(Command::Measure.to_string(), "MEAS?");
        assert_eq!(Command::from("SYST:BEEP").to_string(), "SYST:BEEP");
    }
}
