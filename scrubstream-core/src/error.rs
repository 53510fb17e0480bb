//! Error types for scrubstream operations.
//!
//! Configuration problems (bad policy, missing models, malformed model files)
//! are reported before any data is processed. Per-line structural problems
//! are reported through [`ScrubError::Structure`] so that callers can drop the
//! offending line instead of emitting misattributed values.

use thiserror::Error;

/// Main error type for scrubstream operations.
///
/// # Security
/// Error messages never include scrubbed values. Contexts name files, tables,
/// models and rules, never the data flowing through them.
#[derive(Debug, Error)]
pub enum ScrubError {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Policy references that do not resolve against the loaded models
    #[error("Invalid policy: {}", problems.join("; "))]
    InvalidPolicy { problems: Vec<String> },

    /// A model could not be loaded, saved or validated
    #[error("Model '{name}' is invalid: {message}")]
    Model { name: String, message: String },

    /// Statement structure violates a tracking invariant
    #[error("Malformed statement: {context}")]
    Structure { context: String },

    /// Input could not be parsed
    #[error("Parse failed: {context}")]
    Parse { context: String },

    /// A pool worker stopped before the input was exhausted
    #[error("Worker failed: {context}")]
    Worker { context: String },

    /// Regular expression failed to compile
    #[error("Invalid pattern '{pattern}'")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML serialization or deserialization failed
    #[error("YAML serialization failed: {context}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience type alias for Results with ScrubError
pub type Result<T> = std::result::Result<T, ScrubError>;

impl ScrubError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a model error
    pub fn model(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a structural invariant error
    pub fn structure(context: impl Into<String>) -> Self {
        Self::Structure {
            context: context.into(),
        }
    }

    /// Creates a worker failure error
    pub fn worker(context: impl Into<String>) -> Self {
        Self::Worker {
            context: context.into(),
        }
    }

    /// Creates a parse error
    pub fn parse(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a JSON serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Creates a YAML serialization error with context
    pub fn yaml(context: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            context: context.into(),
            source,
        }
    }

    /// Creates a regex compilation error
    pub fn regex(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::Regex {
            pattern: pattern.into(),
            source,
        }
    }
}
