//! Input formats understood by the scrubber.

pub mod json;
pub mod mysql;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Structure of the input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Line-oriented MySQL dump
    #[default]
    Mysql,
    /// Concatenated JSON documents
    Json,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Mysql => write!(f, "mysql"),
            Mode::Json => write!(f, "json"),
        }
    }
}

impl FromStr for Mode {
    type Err = crate::ScrubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Mode::Mysql),
            "json" => Ok(Mode::Json),
            other => Err(crate::ScrubError::configuration(format!(
                "unknown mode '{}', expected mysql or json",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("mysql".parse::<Mode>().unwrap(), Mode::Mysql);
        assert_eq!("JSON".parse::<Mode>().unwrap(), Mode::Json);
        assert!("csv".parse::<Mode>().is_err());
        assert_eq!(Mode::default().to_string(), "mysql");
    }
}
