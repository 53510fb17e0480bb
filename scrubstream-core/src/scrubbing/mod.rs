//! Policy-driven scrubbing of individual values.
//!
//! A [`Policy`] maps values to [`Disposition`]s, first by field name and then
//! by model recognition. A [`Scrubber`] applies a policy to values, recursing
//! into embedded JSON and YAML documents, and optionally reports every
//! decision to a shared [`Verifier`].

mod disposition;
mod mask;
mod policy;
mod report;
mod rule;
mod scrubber;
mod verifier;

// Re-export public API
pub use disposition::Disposition;
pub use mask::Masker;
pub use policy::Policy;
pub use report::{Percentage, Report, RuleReport, SummaryReport};
pub use rule::{FieldNameRule, HeuristicRule};
pub use scrubber::{Scrubber, ScrubberOptions};
pub use verifier::Verifier;
