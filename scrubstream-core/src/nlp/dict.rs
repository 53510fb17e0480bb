//! Dictionary model: exact membership of cleaned values.

use std::collections::BTreeSet;

use super::text::clean;

/// Set of known values, stored cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictModel {
    entries: BTreeSet<String>,
}

impl DictModel {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1.0 when the cleaned input is a known entry, 0.0 otherwise.
    pub fn recognize(&self, input: &str) -> f64 {
        if self.entries.contains(&clean(input)) {
            1.0
        } else {
            0.0
        }
    }

    /// Adds the cleaned input.
    pub fn train(&mut self, input: &str) {
        let cleaned = clean(input);
        if !cleaned.is_empty() {
            self.entries.insert(cleaned);
        }
    }

    /// Parses newline-delimited entries.
    pub fn from_text(text: &str) -> Self {
        let mut model = Self::new();
        for line in text.lines() {
            model.train(line);
        }
        model
    }

    /// Renders entries one per line, sorted.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(entry);
            out.push('\n');
        }
        out
    }
}
