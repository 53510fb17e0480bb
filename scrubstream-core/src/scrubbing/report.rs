//! Verification report rendered after a scrub.

use std::fmt;

use serde::{Serialize, Serializer};

/// Ratio rendered as a percentage with one decimal place (`"97.5%"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Percentage(pub f64);

impl Percentage {
    /// `numerator / denominator`, or 0 when the denominator is 0.
    pub fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Self(0.0)
        } else {
            Self(numerator as f64 / denominator as f64)
        }
    }

    /// Underlying ratio in [0, 1].
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How one rule was applied to the input stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleReport {
    /// Compact rule definition.
    pub defn: String,
    /// Share of distinct values this rule handled.
    pub freq: Percentage,
    /// Share of handled values whose output never coincided with any input
    /// handled by the same rule. 100% means no overlap; 0% means the output is
    /// effectively not sanitized.
    pub safe: Percentage,
    /// Field names the rule fired on, sorted.
    pub fields: Vec<String>,
}

/// Aggregate figures across all rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    /// Share of distinct values handled by any rule (vs passed through).
    pub load: Percentage,
    /// Mean safety across all rules; rules that never fired count as 0%.
    /// 100% when the policy has no rules.
    pub safe: Percentage,
}

/// Statistics about how a policy was applied to an input stream.
///
/// Operators use a low `load` or `safe` figure as the signal to tighten the
/// policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// One entry per field-name rule, in policy order.
    pub fieldname: Vec<RuleReport>,
    /// One entry per heuristic rule, in policy order.
    pub heuristic: Vec<RuleReport>,
    /// Aggregate figures.
    pub summary: SummaryReport,
}

impl Report {
    /// Renders the report as YAML.
    pub fn to_yaml(&self) -> crate::Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| crate::ScrubError::yaml("rendering verification report", e))
    }
}
