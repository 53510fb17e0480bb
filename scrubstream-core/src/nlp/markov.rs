//! Order-k Markov chain over character or word tokens.
//!
//! The same transition table serves two purposes: scoring how plausible a
//! value looks (recognition, used by heuristic rules) and synthesizing a
//! plausible replacement (generation, used by `generate(model)`).

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::text::clean;
use crate::seed;

/// Marker padding the start of every training sequence.
pub const START_TOKEN: &str = "<^>";
/// Marker terminating every training sequence.
pub const END_TOKEN: &str = "<$>";

/// Probability assumed for transitions never observed during training.
const UNSEEN_PROBABILITY: f64 = 0.05;

/// Upper bound on sampling attempts per generated token.
const DRAWS_PER_TOKEN: usize = 16;

/// Declared shape of a Markov model in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkovDefinition {
    /// Lookback length of the transition table.
    #[serde(alias = "Order")]
    pub order: usize,
    /// Tokenization mode: `""` for characters, `" "` for words.
    #[serde(alias = "Delim", default)]
    pub delim: String,
}

/// Histogram of training sequence lengths, in tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LengthStats {
    freq: BTreeMap<usize, u64>,
    min: usize,
    max: usize,
}

impl LengthStats {
    fn add(&mut self, n: usize) {
        *self.freq.entry(n).or_insert(0) += 1;
        self.derive();
    }

    fn derive(&mut self) {
        self.min = self.freq.keys().next().copied().unwrap_or(0);
        self.max = self.freq.keys().next_back().copied().unwrap_or(0);
    }
}

/// Markov chain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MarkovFile", try_from = "MarkovFile")]
pub struct MarkovModel {
    order: usize,
    separator: String,
    transitions: HashMap<Vec<String>, BTreeMap<String, u64>>,
    stats: LengthStats,
}

impl MarkovModel {
    /// Creates an empty model.
    ///
    /// An order of zero is bumped to one; a chain needs at least one token of
    /// lookback.
    pub fn new(order: usize, separator: impl Into<String>) -> Self {
        Self {
            order: order.max(1),
            separator: separator.into(),
            transitions: HashMap::new(),
            stats: LengthStats::default(),
        }
    }

    /// Creates an empty model from its declared definition.
    pub fn from_definition(definition: &MarkovDefinition) -> Self {
        Self::new(definition.order, definition.delim.clone())
    }

    /// Lookback length.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Token separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Shortest and longest training sequence, in tokens.
    pub fn length_bounds(&self) -> (usize, usize) {
        (self.stats.min, self.stats.max)
    }

    /// True when nothing has been trained yet.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    fn tokenize(&self, cleaned: &str) -> Vec<String> {
        if self.separator.is_empty() {
            cleaned.chars().map(String::from).collect()
        } else {
            cleaned
                .split(self.separator.as_str())
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        }
    }

    /// Brackets tokens with start/end markers and yields each (state, next) pair.
    fn pairs(&self, tokens: Vec<String>) -> Vec<(Vec<String>, String)> {
        let mut padded = vec![START_TOKEN.to_string(); self.order];
        padded.extend(tokens);
        padded.push(END_TOKEN.to_string());

        padded
            .windows(self.order + 1)
            .map(|w| (w[..self.order].to_vec(), w[self.order].clone()))
            .collect()
    }

    /// Adds one training sequence.
    pub fn train(&mut self, input: &str) {
        let tokens = self.tokenize(&clean(input));
        if tokens.is_empty() {
            return;
        }
        self.stats.add(tokens.len());

        for (state, next) in self.pairs(tokens) {
            *self
                .transitions
                .entry(state)
                .or_default()
                .entry(next)
                .or_insert(0) += 1;
        }
    }

    fn transition_probability(&self, state: &[String], next: &str) -> f64 {
        let Some(counts) = self.transitions.get(state) else {
            return 0.0;
        };
        let total: u64 = counts.values().sum();
        match counts.get(next) {
            Some(&count) if total > 0 => count as f64 / total as f64,
            _ => 0.0,
        }
    }

    /// Confidence in [0, 1] that `input` resembles the training corpus.
    ///
    /// Inputs with fewer tokens than the model's order are too short to
    /// evaluate and score 0.
    pub fn recognize(&self, input: &str) -> f64 {
        let tokens = self.tokenize(&clean(input));
        if tokens.len() < self.order {
            return 0.0;
        }

        let pairs = self.pairs(tokens);
        let log_prob: f64 = pairs
            .iter()
            .map(|(state, next)| {
                let p = self.transition_probability(state, next);
                if p > 0.0 {
                    p.log10()
                } else {
                    UNSEEN_PROBABILITY.log10()
                }
            })
            .sum();

        10f64.powf(log_prob / (pairs.len().max(1) as f64))
    }

    fn sample(counts: &BTreeMap<String, u64>, rng: &mut ChaCha8Rng) -> Option<String> {
        let total: u64 = counts.values().sum();
        if total == 0 {
            return None;
        }
        let mut pick = rng.random_range(0..total);
        for (token, &count) in counts {
            if pick < count {
                return Some(token.clone());
            }
            pick -= count;
        }
        None
    }

    /// Derives a value deterministically from `seed`.
    ///
    /// The result has between the shortest and longest observed token count,
    /// except for an untrained model, which yields an empty string.
    pub fn generate(&self, seed: &str) -> String {
        let mut rng = seed::rng_for(&clean(seed));
        let (min, max) = (self.stats.min, self.stats.max);

        let mut history = vec![START_TOKEN.to_string(); self.order];
        let mut produced = 0usize;
        let budget = (max + self.order + 1) * DRAWS_PER_TOKEN;

        for _ in 0..budget {
            if produced >= max {
                break;
            }
            let state = &history[history.len() - self.order..];
            let Some(next) = self
                .transitions
                .get(state)
                .and_then(|counts| Self::sample(counts, &mut rng))
            else {
                break;
            };

            if next == END_TOKEN {
                if produced >= min {
                    break;
                }
                continue;
            }
            history.push(next);
            produced += 1;
        }

        history[self.order..].join(&self.separator)
    }

    /// Checks that the model matches its declared definition.
    pub fn validate(&self, definition: &MarkovDefinition) -> Result<(), String> {
        if self.order != definition.order {
            return Err(format!(
                "order {} does not match declared order {}",
                self.order, definition.order
            ));
        }
        if self.separator != definition.delim {
            return Err(format!(
                "separator {:?} does not match declared delim {:?}",
                self.separator, definition.delim
            ));
        }
        Ok(())
    }
}

/// On-disk representation of a [`MarkovModel`].
#[derive(Debug, Serialize, Deserialize)]
struct MarkovFile {
    order: usize,
    separator: String,
    transitions: Vec<TransitionEntry>,
    stats: StatsFile,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransitionEntry {
    state: Vec<String>,
    next: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatsFile {
    freq: BTreeMap<usize, u64>,
}

impl From<MarkovModel> for MarkovFile {
    fn from(model: MarkovModel) -> Self {
        let mut transitions: Vec<TransitionEntry> = model
            .transitions
            .into_iter()
            .map(|(state, next)| TransitionEntry { state, next })
            .collect();
        transitions.sort_by(|a, b| a.state.cmp(&b.state));

        Self {
            order: model.order,
            separator: model.separator,
            transitions,
            stats: StatsFile {
                freq: model.stats.freq,
            },
        }
    }
}

impl TryFrom<MarkovFile> for MarkovModel {
    type Error = String;

    fn try_from(file: MarkovFile) -> Result<Self, Self::Error> {
        if file.order == 0 {
            return Err("order must be at least 1".to_string());
        }

        let mut transitions = HashMap::with_capacity(file.transitions.len());
        for entry in file.transitions {
            if entry.state.len() != file.order {
                return Err(format!(
                    "transition state {:?} has {} tokens, expected {}",
                    entry.state,
                    entry.state.len(),
                    file.order
                ));
            }
            transitions.insert(entry.state, entry.next);
        }

        let mut stats = LengthStats {
            freq: file.stats.freq,
            ..LengthStats::default()
        };
        stats.derive();

        Ok(Self {
            order: file.order,
            separator: file.separator,
            transitions,
            stats,
        })
    }
}
