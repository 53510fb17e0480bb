//! Run configuration: declared models plus the scrubbing policy.
//!
//! ```json
//! {
//!   "learning": {
//!     "surname": {"markov": {"order": 2, "delim": ""}},
//!     "city": {"dict": {}}
//!   },
//!   "scrubbing": {
//!     "fieldname": [{"in": "surname", "out": "generate(surname)"}],
//!     "heuristic": [{"in": "city", "p": 0.0, "out": "mask"}]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::nlp::{DictModel, MarkovDefinition, MarkovModel, MatchModel, Model, ModelKind, ModelSet};
use crate::scrubbing::Policy;
use crate::{Result, ScrubError};

/// Declared shape of a named model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelDefinition {
    /// Markov chain with a fixed order and tokenization
    Markov(MarkovDefinition),
    /// Dictionary of cleaned values
    Dict {},
    /// Regular-expression recognizer
    Match {},
}

impl ModelDefinition {
    /// The model kind this definition declares.
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelDefinition::Markov(_) => ModelKind::Markov,
            ModelDefinition::Dict {} => ModelKind::Dict,
            ModelDefinition::Match {} => ModelKind::Match,
        }
    }

    /// Creates an untrained model matching this definition.
    pub fn instantiate(&self) -> Model {
        match self {
            ModelDefinition::Markov(definition) => {
                Model::Markov(MarkovModel::from_definition(definition))
            }
            ModelDefinition::Dict {} => Model::Dict(DictModel::new()),
            ModelDefinition::Match {} => Model::Match(MatchModel::default()),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Models the policy relies on, by name.
    #[serde(default, alias = "Learning")]
    pub learning: BTreeMap<String, ModelDefinition>,
    /// Scrubbing rules; the default policy when absent.
    #[serde(default, alias = "Scrubbing")]
    pub scrubbing: Policy,
}

impl Config {
    /// Creates a config with the default policy and no declared models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to declare a model.
    pub fn with_model(mut self, name: impl Into<String>, definition: ModelDefinition) -> Self {
        self.learning.insert(name.into(), definition);
        self
    }

    /// Builder method to replace the policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.scrubbing = policy;
        self
    }

    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScrubError::serialization("parsing configuration", e))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScrubError::io(format!("reading config {}", path.display()), e))?;
        let config = Self::from_json(&json)?;
        info!(
            "✓ Loaded configuration from {} ({} declared models)",
            path.display(),
            config.learning.len()
        );
        Ok(config)
    }

    /// Adds an untrained model for every declared model that is not loaded.
    ///
    /// Returns the names of the models created.
    pub fn instantiate_missing(&self, models: &mut ModelSet) -> Vec<String> {
        let mut created = Vec::new();
        for (name, definition) in &self.learning {
            if !models.contains_key(name) {
                models.insert(name.clone(), definition.instantiate());
                created.push(name.clone());
            }
        }
        created
    }

    fn check_definition(name: &str, definition: &ModelDefinition, model: &Model, problems: &mut Vec<String>) {
        let kinds = model.kinds();
        if !kinds.contains(&definition.kind()) {
            let found: Vec<String> = kinds.iter().map(ToString::to_string).collect();
            problems.push(format!(
                "model '{}' is declared {} but loaded as {}",
                name,
                definition.kind(),
                found.join("+")
            ));
            return;
        }
        if let (ModelDefinition::Markov(declared), Some(markov)) = (definition, model.markov()) {
            if let Err(message) = markov.validate(declared) {
                problems.push(format!("model '{}': {}", name, message));
            }
        }
    }

    /// Checks the policy and the declared models against the loaded models.
    ///
    /// Declared models that are not loaded are not an error here; see
    /// [`Config::instantiate_missing`]. All problems are reported together.
    pub fn validate(&self, models: &ModelSet) -> Result<()> {
        let mut problems = match self.scrubbing.validate(models) {
            Ok(()) => Vec::new(),
            Err(ScrubError::InvalidPolicy { problems }) => problems,
            Err(other) => return Err(other),
        };

        for (name, definition) in &self.learning {
            if let Some(model) = models.get(name) {
                Self::check_definition(name, definition, model, &mut problems);
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ScrubError::InvalidPolicy { problems })
        }
    }
}
