//! Core library for scrubstream.
//!
//! This crate anonymizes sensitive values flowing through structured data
//! streams (MySQL dumps, JSON documents) according to a human-written
//! policy, while keeping the output realistic enough for staging systems.
//!
//! # Guarantees
//! - Masking is deterministic: the same value and salt always produce the
//!   same output, across runs and processes, without a mapping table
//! - Output order always equals input order, whatever the worker count
//! - Values are never attributed to a column unless the attribution is
//!   certain; doubtful lines are dropped and logged
//! - Errors and logs never include the values being scrubbed
//!
//! # Architecture
//! - [`nlp`]: statistical models that recognize and generate values
//! - [`scrubbing`]: policies, dispositions, the scrubber and its verifier
//! - [`format`]: MySQL and JSON stream adapters
//! - [`pipeline`]: the order-preserving worker pool
//! - [`config`]: the configuration file tying models and policy together

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod nlp;
pub mod pipeline;
pub mod scrubbing;
pub mod seed;

// Re-export commonly used types
pub use config::{Config, ModelDefinition};
pub use error::{Result, ScrubError};
pub use format::Mode;
pub use format::mysql::{FormatOptions, SchemaContext, StatementScrubber};
pub use pipeline::{LineProcessor, default_parallelism, run_pool};
pub use scrubbing::{Disposition, Policy, Report, Scrubber, ScrubberOptions, Verifier};
