//! Pattern-match model: a value is recognized when any regular expression
//! matches it.

use regex::Regex;

use crate::{Result, ScrubError};

/// Ordered list of regular expressions.
#[derive(Debug, Clone, Default)]
pub struct MatchModel {
    patterns: Vec<Regex>,
}

impl MatchModel {
    /// Creates a model from compiled patterns.
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when the model has no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 1.0 when any pattern matches the raw input, 0.0 otherwise.
    pub fn recognize(&self, input: &str) -> f64 {
        if self.patterns.iter().any(|p| p.is_match(input)) {
            1.0
        } else {
            0.0
        }
    }

    /// Pattern models are curated by hand; training has no effect.
    pub fn train(&mut self, _input: &str) {}

    /// Parses newline-delimited patterns, ignoring blank lines.
    pub fn from_text(text: &str) -> Result<Self> {
        let patterns = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Regex::new(line).map_err(|e| ScrubError::regex(line, e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(patterns))
    }

    /// Renders patterns one per line, in order.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for pattern in &self.patterns {
            out.push_str(pattern.as_str());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_any_pattern() {
        let m = MatchModel::from_text("^\\d{3}-\\d{3}-\\d{4}$\n\n^\\(\\d{3}\\) \\d{3}-\\d{4}$\n").unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.recognize("805-555-1212"), 1.0);
        assert_eq!(m.recognize("(805) 555-1212"), 1.0);
        assert_eq!(m.recognize("Avenue"), 0.0);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = MatchModel::from_text("([a-z]+\n").unwrap_err();
        assert!(matches!(err, ScrubError::Regex { .. }));
    }

    #[test]
    fn test_training_is_noop() {
        let mut m = MatchModel::from_text("^zip$").unwrap();
        m.train("anything");
        assert_eq!(m.to_text(), "^zip$\n");
    }
}
