//! Training models from the values of a dump.

use std::sync::Arc;

use sqlparser::ast::Statement;
use tracing::debug;

use super::restore::string_value;
use super::schema::SchemaContext;
use super::scrub::parse_line;
use super::state::rewrite_values;
use crate::Result;
use crate::nlp::ModelSet;
use crate::scrubbing::{Disposition, Policy};

/// Trains each model with the values its `generate(model)` field-name
/// rules would replace.
#[derive(Debug)]
pub struct Learner {
    policy: Arc<Policy>,
    context: Arc<SchemaContext>,
    models: ModelSet,
    trained: u64,
}

impl Learner {
    /// Creates a learner that trains (and owns) `models`.
    pub fn new(policy: Arc<Policy>, context: Arc<SchemaContext>, models: ModelSet) -> Self {
        Self {
            policy,
            context,
            models,
            trained: 0,
        }
    }

    /// Number of values used for training so far.
    pub fn trained(&self) -> u64 {
        self.trained
    }

    /// Trains the model a value's field-name rule generates with, if any.
    pub fn learn_value(&mut self, value: &str, names: &[String]) {
        let Some((Disposition::Generate(name), _)) = self.policy.match_field_name(names) else {
            return;
        };
        if let Some(model) = self.models.get_mut(name) {
            model.train(value);
            self.trained = self.trained.saturating_add(1);
        }
    }

    /// Learns from every INSERT on the line.
    pub fn learn_line(&mut self, line: &str) -> Result<()> {
        let statements = match parse_line(line) {
            Ok(statements) => statements,
            Err(e) => {
                debug!("Skipping line: {}", e);
                return Ok(());
            }
        };

        let context = Arc::clone(&self.context);
        for statement in statements {
            if let Statement::Insert(mut insert) = statement {
                rewrite_values(&mut insert, &context, |names, expr| {
                    if let Some(value) = string_value(&expr) {
                        self.learn_value(value, names);
                    }
                    expr
                })?;
            }
        }
        Ok(())
    }

    /// Consumes the learner, returning the trained models.
    pub fn into_models(self) -> ModelSet {
        self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{DictModel, Model};
    use crate::scrubbing::FieldNameRule;

    #[test]
    fn test_learns_generated_columns_only() {
        let policy = Policy::empty()
            .with_field_name(
                FieldNameRule::new("^name$", Disposition::Generate("name".to_string())).unwrap(),
            )
            .with_field_name(FieldNameRule::new("^email$", Disposition::Mask).unwrap());
        let mut models = ModelSet::new();
        models.insert("name".to_string(), Model::Dict(DictModel::new()));

        let mut learner = Learner::new(
            Arc::new(policy),
            Arc::new(SchemaContext::new()),
            models,
        );
        learner
            .learn_line("INSERT INTO users (name, email) VALUES ('Joe','joe@foo.com'),('Ann','a@b.c');")
            .unwrap();
        assert_eq!(learner.trained(), 2);
        learner.learn_line("'Zed' is not SQL").unwrap();
        learner.learn_line("-- comment").unwrap();
        assert_eq!(learner.trained(), 2);

        let models = learner.into_models();
        let name = &models["name"];
        assert_eq!(name.recognize("joe"), 1.0);
        assert_eq!(name.recognize("joe@foo.com"), 0.0);
    }
}
