//! Statistical language models.
//!
//! Models serve two roles:
//! - **Recognition**: heuristic policy rules fire when a model is confident
//!   that a value belongs to its domain (names, streets, phone numbers).
//! - **Generation**: `generate(model)` dispositions replace a value with a
//!   plausible synthetic one derived deterministically from the original.
//!
//! # Example
//! ```rust
//! use scrubstream_core::nlp::{MarkovModel, Model};
//!
//! let mut markov = MarkovModel::new(2, "");
//! for name in ["alice", "alicia", "alison"] {
//!     markov.train(name);
//! }
//! let model = Model::Markov(markov);
//! assert_eq!(model.generate("bob"), model.generate("bob"));
//! ```

mod dict;
mod markov;
mod model;
mod pattern;
mod store;
pub mod text;

// Re-export public API
pub use dict::DictModel;
pub use markov::{END_TOKEN, MarkovDefinition, MarkovModel, START_TOKEN};
pub use model::{CompoundModel, Model, ModelKind, ModelSet};
pub use pattern::MatchModel;
pub use store::{load_model, load_model_paths, load_models, save_model};
