//! Field-name and heuristic rules.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::disposition::Disposition;

/// Scrubs values by the name of the field they appear in, irrespective of
/// their content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FieldNameRuleDef", into = "FieldNameRuleDef")]
pub struct FieldNameRule {
    /// Unanchored pattern tested against each candidate field name.
    pub pattern: Regex,
    /// What to do with matching values.
    pub out: Disposition,
}

impl FieldNameRule {
    /// Compiles a rule.
    pub fn new(pattern: &str, out: Disposition) -> crate::Result<Self> {
        let pattern =
            Regex::new(pattern).map_err(|e| crate::ScrubError::regex(pattern, e))?;
        Ok(Self { pattern, out })
    }

    /// True when any of `names` matches the pattern.
    pub fn matches(&self, names: &[String]) -> bool {
        names.iter().any(|name| self.pattern.is_match(name))
    }
}

impl fmt::Display for FieldNameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/ -> {}", self.pattern.as_str(), self.out)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldNameRuleDef {
    #[serde(alias = "In")]
    r#in: String,
    #[serde(alias = "Out")]
    out: Disposition,
}

impl TryFrom<FieldNameRuleDef> for FieldNameRule {
    type Error = regex::Error;

    fn try_from(def: FieldNameRuleDef) -> Result<Self, Self::Error> {
        Ok(Self {
            pattern: Regex::new(&def.r#in)?,
            out: def.out,
        })
    }
}

impl From<FieldNameRule> for FieldNameRuleDef {
    fn from(rule: FieldNameRule) -> Self {
        Self {
            r#in: rule.pattern.as_str().to_string(),
            out: rule.out,
        }
    }
}

/// Scrubs values that a model recognizes, irrespective of field name.
///
/// The rule fires when `model.recognize(value) >= 1 - p`:
/// - `p = 0.0`: the model must be fully confident (the default)
/// - `p = 0.05`: the model must be at least 95% confident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRule {
    /// Name of the recognizing model.
    #[serde(rename = "in", alias = "In")]
    pub model: String,
    /// Tolerance on the model's confidence, in [0, 1].
    #[serde(alias = "P", default)]
    pub p: f64,
    /// What to do with recognized values.
    #[serde(alias = "Out")]
    pub out: Disposition,
}

impl HeuristicRule {
    /// Minimum confidence for the rule to fire.
    pub fn threshold(&self) -> f64 {
        1.0 - self.p
    }
}

impl fmt::Display for HeuristicRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(p={}) -> {}", self.model, self.p, self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_rule_is_unanchored() {
        let rule = FieldNameRule::new("email", Disposition::Mask).unwrap();
        assert!(rule.matches(&["users.contact_email".to_string()]));
        assert!(rule.matches(&["id".to_string(), "email_address".to_string()]));
        assert!(!rule.matches(&["e_mail".to_string()]));
        assert!(!rule.matches(&[]));
    }

    #[test]
    fn test_field_name_rule_json() {
        let rule: FieldNameRule =
            serde_json::from_str(r#"{"in": "^users\\.name$", "out": "generate(name)"}"#).unwrap();
        assert_eq!(rule.out, Disposition::Generate("name".to_string()));
        assert!(rule.matches(&["users.name".to_string()]));
        assert_eq!(rule.to_string(), "/^users\\.name$/ -> generate(name)");

        let legacy: FieldNameRule =
            serde_json::from_str(r#"{"In": "zip", "Out": "erase"}"#).unwrap();
        assert_eq!(legacy.out, Disposition::Erase);

        assert!(serde_json::from_str::<FieldNameRule>(r#"{"in": "(", "out": "mask"}"#).is_err());
    }

    #[test]
    fn test_heuristic_rule_json() {
        let rule: HeuristicRule =
            serde_json::from_str(r#"{"in": "city", "p": 0.05, "out": "mask"}"#).unwrap();
        assert_eq!(rule.model, "city");
        assert!((rule.threshold() - 0.95).abs() < 1e-12);

        let strict: HeuristicRule =
            serde_json::from_str(r#"{"In": "city", "Out": "erase"}"#).unwrap();
        assert_eq!(strict.threshold(), 1.0);
    }
}
