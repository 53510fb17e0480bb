//! MySQL dump handling.
//!
//! Dumps are processed one line at a time. Every INSERT value is attributed
//! to a column by position, using explicit column lists or the table layouts
//! of a [`SchemaContext`], so that field-name rules apply to positional
//! INSERTs as well.

mod extract;
mod learn;
mod restore;
mod schema;
mod scrub;
mod state;

// Re-export public API
pub use extract::Extractor;
pub use learn::Learner;
pub use restore::escape;
pub use schema::{SchemaContext, split_statements};
pub use scrub::{FormatOptions, StatementScrubber};
pub use state::{InsertState, insert_state, rewrite_values};
