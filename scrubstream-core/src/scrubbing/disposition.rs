//! What to do with a value once a rule has matched it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScrubError;

/// Action applied to a single value.
///
/// Written in configuration as `erase`, `mask`, `pass`, `replace(<text>)` or
/// `generate(<model>)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Disposition {
    /// Remove the value (empty string, or NULL in SQL)
    Erase,
    /// Scramble letters and digits deterministically
    Mask,
    /// Leave the value untouched
    Pass,
    /// Substitute a fixed literal
    Replace(String),
    /// Synthesize a value with the named model
    Generate(String),
}

impl Disposition {
    /// Action keyword without parameter.
    pub fn action(&self) -> &'static str {
        match self {
            Disposition::Erase => "erase",
            Disposition::Mask => "mask",
            Disposition::Pass => "pass",
            Disposition::Replace(_) => "replace",
            Disposition::Generate(_) => "generate",
        }
    }

    /// Parenthesized parameter, if the action takes one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Disposition::Replace(p) | Disposition::Generate(p) => Some(p),
            Disposition::Erase | Disposition::Mask | Disposition::Pass => None,
        }
    }

    /// Model referenced by a `generate` disposition.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            Disposition::Generate(model) => Some(model),
            _ => None,
        }
    }
}

impl FromStr for Disposition {
    type Err = ScrubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, parameter) = match s.find('(') {
            Some(paren) => {
                let Some(inner) = s[paren + 1..].strip_suffix(')') else {
                    return Err(ScrubError::configuration(format!(
                        "unterminated parameter in disposition '{}'",
                        s
                    )));
                };
                (&s[..paren], Some(inner))
            }
            None => (s, None),
        };

        match (action, parameter) {
            ("erase", None) => Ok(Disposition::Erase),
            ("mask", None) => Ok(Disposition::Mask),
            ("pass", None) => Ok(Disposition::Pass),
            ("replace", Some(text)) => Ok(Disposition::Replace(text.to_string())),
            ("generate", Some(model)) if !model.is_empty() => {
                Ok(Disposition::Generate(model.to_string()))
            }
            ("erase" | "mask" | "pass", Some(_)) => Err(ScrubError::configuration(format!(
                "disposition '{}' takes no parameter",
                action
            ))),
            ("replace" | "generate", _) => Err(ScrubError::configuration(format!(
                "disposition '{}' requires a parameter, e.g. {}(...)",
                action, action
            ))),
            _ => Err(ScrubError::configuration(format!(
                "unknown disposition '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Disposition {
    type Error = ScrubError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Disposition> for String {
    fn from(d: Disposition) -> Self {
        d.to_string()
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameter() {
            Some(p) => write!(f, "{}({})", self.action(), p),
            None => write!(f, "{}", self.action()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("erase".parse::<Disposition>().unwrap(), Disposition::Erase);
        assert_eq!("mask".parse::<Disposition>().unwrap(), Disposition::Mask);
        assert_eq!("pass".parse::<Disposition>().unwrap(), Disposition::Pass);
        assert_eq!(
            "replace(redacted)".parse::<Disposition>().unwrap(),
            Disposition::Replace("redacted".to_string())
        );
        assert_eq!(
            "replace()".parse::<Disposition>().unwrap(),
            Disposition::Replace(String::new())
        );
        assert_eq!(
            "generate(surname)".parse::<Disposition>().unwrap(),
            Disposition::Generate("surname".to_string())
        );
    }

    #[test]
    fn test_parameter_may_contain_parens() {
        let d: Disposition = "replace((none))".parse().unwrap();
        assert_eq!(d.parameter(), Some("(none)"));
        assert_eq!(d.to_string(), "replace((none))");
    }

    #[test]
    fn test_reject_malformed() {
        for bad in [
            "shred",
            "generate",
            "generate()",
            "replace",
            "mask(x)",
            "replace(unterminated",
            "",
        ] {
            assert!(bad.parse::<Disposition>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_serde_as_string() {
        let d: Disposition = serde_json::from_str("\"generate(city)\"").unwrap();
        assert_eq!(d.model_name(), Some("city"));
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"generate(city)\"");
        assert!(serde_json::from_str::<Disposition>("\"obliterate\"").is_err());
    }
}
