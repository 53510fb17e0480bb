//! Ordered scrubbing rules and their validation.

use serde::{Deserialize, Serialize};

use super::disposition::Disposition;
use super::rule::{FieldNameRule, HeuristicRule};
use crate::nlp::ModelSet;
use crate::{Result, ScrubError};

/// Field names masked by the default policy.
const DEFAULT_MASKED_FIELDS: [&str; 5] = ["email", "phone", "postcode", "postalcode", "zip"];

/// Human decisions about which values to scrub and how.
///
/// Field-name rules are consulted first, in declared order; heuristic rules
/// only apply to values no field-name rule matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Rules keyed on field name.
    #[serde(default, alias = "FieldName")]
    pub fieldname: Vec<FieldNameRule>,
    /// Rules keyed on model recognition of the value itself.
    #[serde(default, alias = "Heuristic")]
    pub heuristic: Vec<HeuristicRule>,
}

impl Default for Policy {
    /// Masks contact details and postal codes by field name.
    fn default() -> Self {
        let fieldname = DEFAULT_MASKED_FIELDS
            .iter()
            .filter_map(|name| FieldNameRule::new(name, Disposition::Mask).ok())
            .collect();
        Self {
            fieldname,
            heuristic: Vec::new(),
        }
    }
}

impl Policy {
    /// Creates a policy with no rules.
    pub fn empty() -> Self {
        Self {
            fieldname: Vec::new(),
            heuristic: Vec::new(),
        }
    }

    /// Builder method to append a field-name rule.
    pub fn with_field_name(mut self, rule: FieldNameRule) -> Self {
        self.fieldname.push(rule);
        self
    }

    /// Builder method to append a heuristic rule.
    pub fn with_heuristic(mut self, rule: HeuristicRule) -> Self {
        self.heuristic.push(rule);
        self
    }

    /// Returns the first field-name rule matching any of `names`, with its index.
    ///
    /// Rule order decides ties, not name order.
    pub fn match_field_name(&self, names: &[String]) -> Option<(&Disposition, usize)> {
        self.fieldname
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(names))
            .map(|(index, rule)| (&rule.out, index))
    }

    /// Returns the first heuristic rule whose model recognizes `value`, with its index.
    ///
    /// Rules naming a model absent from `models` never fire.
    pub fn match_heuristic(&self, value: &str, models: &ModelSet) -> Option<(&Disposition, usize)> {
        self.heuristic
            .iter()
            .enumerate()
            .find(|(_, rule)| {
                models
                    .get(&rule.model)
                    .is_some_and(|model| model.recognize(value) >= rule.threshold())
            })
            .map(|(index, rule)| (&rule.out, index))
    }

    fn check_generate(out: &Disposition, models: &ModelSet, rule: &str, problems: &mut Vec<String>) {
        let Some(name) = out.model_name() else {
            return;
        };
        match models.get(name) {
            None => problems.push(format!("{}: unknown model '{}'", rule, name)),
            Some(model) if !model.can_generate() => {
                problems.push(format!("{}: model '{}' cannot generate", rule, name));
            }
            Some(_) => {}
        }
    }

    /// Checks every model reference against the loaded models.
    ///
    /// All problems are collected and reported together.
    pub fn validate(&self, models: &ModelSet) -> Result<()> {
        let mut problems = Vec::new();

        for (index, rule) in self.fieldname.iter().enumerate() {
            let label = format!("fieldname rule {} ({})", index, rule);
            Self::check_generate(&rule.out, models, &label, &mut problems);
        }

        for (index, rule) in self.heuristic.iter().enumerate() {
            let label = format!("heuristic rule {} ({})", index, rule);
            if !models.contains_key(&rule.model) {
                problems.push(format!("{}: unknown model '{}'", label, rule.model));
            }
            if !(0.0..=1.0).contains(&rule.p) {
                problems.push(format!("{}: p must be between 0.0 and 1.0, got {}", label, rule.p));
            }
            Self::check_generate(&rule.out, models, &label, &mut problems);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScrubError::InvalidPolicy { problems })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{DictModel, MarkovModel, Model};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn models() -> ModelSet {
        let mut set = ModelSet::new();
        let mut city = DictModel::new();
        city.train("Springfield");
        set.insert("city".to_string(), Model::Dict(city));
        let mut surname = MarkovModel::new(2, "");
        surname.train("smith");
        set.insert("surname".to_string(), Model::Markov(surname));
        set
    }

    #[test]
    fn test_default_policy_masks_contact_fields() {
        let policy = Policy::default();
        for field in ["email", "work_phone", "postcode", "postalcode", "zip"] {
            let (d, _) = policy.match_field_name(&names(&[field])).unwrap();
            assert_eq!(*d, Disposition::Mask, "{field} should be masked");
        }
        assert!(policy.match_field_name(&names(&["name"])).is_none());
        assert!(policy.heuristic.is_empty());
    }

    #[test]
    fn test_first_rule_in_declaration_order_wins() {
        let policy = Policy::empty()
            .with_field_name(FieldNameRule::new("name", Disposition::Erase).unwrap())
            .with_field_name(FieldNameRule::new("email", Disposition::Mask).unwrap());

        // the second candidate name matches the first rule
        let (d, index) = policy
            .match_field_name(&names(&["email", "users.name"]))
            .unwrap();
        assert_eq!(*d, Disposition::Erase);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_match_heuristic_uses_threshold() {
        let policy = Policy::empty().with_heuristic(HeuristicRule {
            model: "city".to_string(),
            p: 0.0,
            out: Disposition::Mask,
        });
        let models = models();
        assert_eq!(
            policy.match_heuristic("springfield", &models).map(|(_, i)| i),
            Some(0)
        );
        assert!(policy.match_heuristic("shelbyville", &models).is_none());
    }

    #[test]
    fn test_validate_accepts_resolvable_policy() {
        let policy: Policy = serde_json::from_str(
            r#"{
                "fieldname": [{"in": "surname", "out": "generate(surname)"}],
                "heuristic": [{"in": "city", "p": 0.1, "out": "replace(Anytown)"}]
            }"#,
        )
        .unwrap();
        assert!(policy.validate(&models()).is_ok());
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let policy: Policy = serde_json::from_str(
            r#"{
                "fieldname": [
                    {"in": "a", "out": "generate(nope)"},
                    {"in": "b", "out": "generate(city)"}
                ],
                "heuristic": [{"in": "street", "p": 1.5, "out": "mask"}]
            }"#,
        )
        .unwrap();

        let Err(ScrubError::InvalidPolicy { problems }) = policy.validate(&models()) else {
            panic!("expected invalid policy");
        };
        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("unknown model 'nope'"));
        assert!(problems[1].contains("cannot generate"));
        assert!(problems[2].contains("unknown model 'street'"));
        assert!(problems[3].contains("p must be between"));
    }

    #[test]
    fn test_unknown_disposition_fails_at_parse() {
        let result = serde_json::from_str::<Policy>(
            r#"{"fieldname": [{"in": "a", "out": "shred"}]}"#,
        );
        assert!(result.is_err());
    }
}
