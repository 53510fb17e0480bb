//! Leakage auditing for a scrub run.
//!
//! A [`Verifier`] is shared by every scrubber in a run. It records hashes of
//! each handled input and its output per rule, plus the field names each
//! rule fired on, and later summarizes them into a [`Report`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::policy::Policy;
use super::report::{Percentage, Report, RuleReport, SummaryReport};
use crate::seed;

#[derive(Debug, Default)]
struct RuleStats {
    /// Input hash to output hash, one entry per distinct input.
    in_out: HashMap<u64, u64>,
    fields: BTreeSet<String>,
}

impl RuleStats {
    fn record(&mut self, input: &str, output: &str, names: &[String]) {
        self.in_out.insert(seed::hash(input), seed::hash(output));
        self.fields.extend(names.iter().cloned());
    }

    /// Number of inputs whose hash also appears among this rule's outputs.
    fn overlap(&self) -> usize {
        let outputs: HashSet<u64> = self.in_out.values().copied().collect();
        self.in_out.keys().filter(|h| outputs.contains(h)).count()
    }
}

#[derive(Debug, Default)]
struct VerifierState {
    fieldname: HashMap<usize, RuleStats>,
    heuristic: HashMap<usize, RuleStats>,
    pass_in: HashSet<u64>,
    pass_fields: BTreeSet<String>,
}

/// Thread-safe recorder of scrubbing decisions.
#[derive(Debug)]
pub struct Verifier {
    policy: Arc<Policy>,
    state: Mutex<VerifierState>,
}

impl Verifier {
    /// Creates a verifier for the given policy.
    pub fn new(policy: Arc<Policy>) -> Self {
        Self {
            policy,
            state: Mutex::new(VerifierState::default()),
        }
    }

    /// Records a value handled by a field-name rule.
    ///
    /// Empty inputs carry no information and are ignored.
    pub fn record_field_name(&self, input: &str, output: &str, names: &[String], rule_index: usize) {
        if input.is_empty() {
            return;
        }
        self.state
            .lock()
            .fieldname
            .entry(rule_index)
            .or_default()
            .record(input, output, names);
    }

    /// Records a value handled by a heuristic rule.
    pub fn record_heuristic(&self, input: &str, output: &str, names: &[String], rule_index: usize) {
        if input.is_empty() {
            return;
        }
        self.state
            .lock()
            .heuristic
            .entry(rule_index)
            .or_default()
            .record(input, output, names);
    }

    /// Records a value passed through without any rule firing.
    pub fn record_pass(&self, input: &str, names: &[String]) {
        if input.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        state.pass_in.insert(seed::hash(input));
        state.pass_fields.extend(names.iter().cloned());
    }

    /// Field names seen on values that no rule handled, sorted.
    pub fn passed_fields(&self) -> Vec<String> {
        self.state.lock().pass_fields.iter().cloned().collect()
    }

    fn rule_report(defn: String, stats: Option<&RuleStats>, total: usize) -> RuleReport {
        let Some(stats) = stats else {
            return RuleReport {
                defn,
                ..RuleReport::default()
            };
        };

        let handled = stats.in_out.len();
        RuleReport {
            defn,
            freq: Percentage::ratio(handled, total),
            safe: Percentage(1.0 - Percentage::ratio(stats.overlap(), handled).value()),
            fields: stats.fields.iter().cloned().collect(),
        }
    }

    /// Summarizes everything recorded so far.
    ///
    /// Rules that never fired report 0% safety and pull the summary down.
    pub fn report(&self) -> Report {
        let state = self.state.lock();

        let scrubbed: usize = state
            .fieldname
            .values()
            .chain(state.heuristic.values())
            .map(|s| s.in_out.len())
            .sum();
        let total = scrubbed + state.pass_in.len();

        let fieldname: Vec<RuleReport> = self
            .policy
            .fieldname
            .iter()
            .enumerate()
            .map(|(index, rule)| Self::rule_report(rule.to_string(), state.fieldname.get(&index), total))
            .collect();
        let heuristic: Vec<RuleReport> = self
            .policy
            .heuristic
            .iter()
            .enumerate()
            .map(|(index, rule)| Self::rule_report(rule.to_string(), state.heuristic.get(&index), total))
            .collect();

        let rules = fieldname.len() + heuristic.len();
        let summary_safe = if rules == 0 {
            1.0
        } else {
            let sum: f64 = fieldname.iter().chain(&heuristic).map(|r| r.safe.value()).sum();
            sum / rules as f64
        };

        Report {
            fieldname,
            heuristic,
            summary: SummaryReport {
                load: Percentage::ratio(scrubbed, total),
                safe: Percentage(summary_safe),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrubbing::{Disposition, FieldNameRule, HeuristicRule};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn verifier() -> Verifier {
        let policy = Policy::empty()
            .with_field_name(FieldNameRule::new("email", Disposition::Mask).unwrap())
            .with_field_name(FieldNameRule::new("ssn", Disposition::Erase).unwrap());
        Verifier::new(Arc::new(policy))
    }

    #[test]
    fn test_report_without_overlap_is_safe() {
        let v = verifier();
        v.record_field_name("a@x.com", "q@z.com", &names(&["email"]), 0);
        v.record_field_name("b@x.com", "r@z.com", &names(&["users.email"]), 0);
        v.record_pass("hello", &names(&["greeting"]));
        v.record_pass("", &names(&["blank"]));

        let report = v.report();
        assert_eq!(report.fieldname.len(), 2);
        assert_eq!(report.fieldname[0].safe, Percentage(1.0));
        assert_eq!(report.fieldname[0].freq.to_string(), "66.7%");
        assert_eq!(report.fieldname[0].fields, names(&["email", "users.email"]));
        assert_eq!(report.fieldname[1], RuleReport {
            defn: "/ssn/ -> erase".to_string(),
            ..RuleReport::default()
        });
        assert_eq!(report.summary.load.to_string(), "66.7%");
        // the unfired ssn rule counts as 0%
        assert_eq!(report.summary.safe, Percentage(0.5));
        assert_eq!(v.passed_fields(), names(&["greeting"]));
    }

    #[test]
    fn test_overlap_lowers_safety() {
        let v = verifier();
        // "0-0" masks to itself; "1-1" maps onto another handled input
        v.record_field_name("0-0", "0-0", &names(&["email"]), 0);
        v.record_field_name("1-1", "0-0", &names(&["email"]), 0);
        v.record_field_name("2-2", "7-3", &names(&["email"]), 0);
        v.record_field_name("3-3", "4-4", &names(&["email"]), 0);

        let report = v.report();
        assert_eq!(report.fieldname[0].safe.to_string(), "75.0%");
        assert_eq!(report.summary.safe.to_string(), "37.5%");
        assert_eq!(report.summary.load, Percentage(1.0));
    }

    #[test]
    fn test_empty_report() {
        let report = verifier().report();
        assert_eq!(report.summary.load, Percentage(0.0));
        assert_eq!(report.summary.safe, Percentage(0.0));

        let report = Verifier::new(Arc::new(Policy::empty())).report();
        assert!(report.fieldname.is_empty());
        assert_eq!(report.summary.load, Percentage(0.0));
        assert_eq!(report.summary.safe, Percentage(1.0));
    }

    #[test]
    fn test_unfired_rules_lower_summary_safety() {
        let v = Verifier::new(Arc::new(Policy::default()));
        v.record_field_name("a@x.com", "q@z.com", &names(&["email"]), 0);
        v.record_pass("Springfield", &names(&["city"]));
        v.record_pass("Anytown", &names(&["city"]));
        v.record_pass("Elsewhere", &names(&["city"]));

        let report = v.report();
        assert_eq!(report.fieldname.len(), 5);
        assert_eq!(report.fieldname[0].safe, Percentage(1.0));
        assert!(report.fieldname[1..].iter().all(|r| r.safe == Percentage(0.0)));
        assert_eq!(report.summary.safe.to_string(), "20.0%");
        assert_eq!(report.summary.load.to_string(), "25.0%");
    }

    #[test]
    fn test_heuristic_rules_join_the_summary() {
        let policy = Policy::empty()
            .with_field_name(FieldNameRule::new("email", Disposition::Mask).unwrap())
            .with_heuristic(HeuristicRule {
                model: "city".to_string(),
                p: 0.5,
                out: Disposition::Erase,
            });
        let v = Verifier::new(Arc::new(policy));
        v.record_field_name("a@x.com", "a@x.com", &names(&["email"]), 0);
        v.record_field_name("b@x.com", "q@z.com", &names(&["email"]), 0);
        v.record_heuristic("Springfield", "", &names(&["users.3"]), 0);
        v.record_pass("x", &names(&["note"]));

        let report = v.report();
        assert_eq!(report.fieldname[0].safe.to_string(), "50.0%");
        assert_eq!(report.heuristic[0].safe, Percentage(1.0));
        assert_eq!(report.heuristic[0].fields, names(&["users.3"]));
        assert_eq!(report.summary.safe.to_string(), "75.0%");
        assert_eq!(report.summary.load.to_string(), "75.0%");
    }
}
