//! The [`Model`] sum type and compound models.

use std::collections::BTreeMap;

use super::dict::DictModel;
use super::markov::MarkovModel;
use super::pattern::MatchModel;
use super::text::to_same_case;

/// Named models available to a policy.
pub type ModelSet = BTreeMap<String, Model>;

/// Model flavor, as encoded in the model file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelKind {
    /// Markov chain (`.markov.json`)
    Markov,
    /// Dictionary (`.dict.txt`)
    Dict,
    /// Pattern match (`.match.txt`)
    Match,
}

impl ModelKind {
    /// All kinds, in the order compound models are assembled.
    pub const ALL: [ModelKind; 3] = [ModelKind::Markov, ModelKind::Dict, ModelKind::Match];

    /// File name extension, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ModelKind::Markov => ".markov.json",
            ModelKind::Dict => ".dict.txt",
            ModelKind::Match => ".match.txt",
        }
    }

    /// Splits a model file name into its base name and kind.
    pub fn split_file_name(file_name: &str) -> Option<(&str, ModelKind)> {
        Self::ALL.into_iter().find_map(|kind| {
            file_name
                .strip_suffix(kind.extension())
                .filter(|base| !base.is_empty())
                .map(|base| (base, kind))
        })
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Markov => write!(f, "markov"),
            ModelKind::Dict => write!(f, "dict"),
            ModelKind::Match => write!(f, "match"),
        }
    }
}

/// A trainable recognizer, optionally able to generate values.
#[derive(Debug, Clone)]
pub enum Model {
    /// Exact membership of cleaned values
    Dict(DictModel),
    /// Markov chain; the only generating flavor
    Markov(MarkovModel),
    /// Regular-expression recognizer
    Match(MatchModel),
    /// Several models sharing one name
    Compound(CompoundModel),
}

impl Model {
    /// Confidence in [0, 1] that `input` belongs to this model's domain.
    pub fn recognize(&self, input: &str) -> f64 {
        match self {
            Model::Dict(m) => m.recognize(input),
            Model::Markov(m) => m.recognize(input),
            Model::Match(m) => m.recognize(input),
            Model::Compound(m) => m.recognize(input),
        }
    }

    /// Adds one training value.
    pub fn train(&mut self, input: &str) {
        match self {
            Model::Dict(m) => m.train(input),
            Model::Markov(m) => m.train(input),
            Model::Match(m) => m.train(input),
            Model::Compound(m) => m.train(input),
        }
    }

    /// True when [`Model::generate`] can produce values.
    pub fn can_generate(&self) -> bool {
        match self {
            Model::Markov(_) => true,
            Model::Compound(m) => m.generator().is_some(),
            Model::Dict(_) | Model::Match(_) => false,
        }
    }

    /// Generates a value seeded by `seed`, or `None` for recognizer-only models.
    pub fn generate(&self, seed: &str) -> Option<String> {
        match self {
            Model::Markov(m) => Some(m.generate(seed)),
            Model::Compound(m) => m.generator().and_then(|g| g.generate(seed)),
            Model::Dict(_) | Model::Match(_) => None,
        }
    }

    /// Generates a value and re-cases it to match `like`.
    pub fn generate_like(&self, like: &str) -> Option<String> {
        self.generate(like).map(|s| to_same_case(&s, like))
    }

    /// Kinds making up this model.
    pub fn kinds(&self) -> Vec<ModelKind> {
        match self {
            Model::Dict(_) => vec![ModelKind::Dict],
            Model::Markov(_) => vec![ModelKind::Markov],
            Model::Match(_) => vec![ModelKind::Match],
            Model::Compound(m) => m.parts().iter().flat_map(Model::kinds).collect(),
        }
    }

    /// The Markov chain inside this model, if any.
    pub fn markov(&self) -> Option<&MarkovModel> {
        match self {
            Model::Markov(m) => Some(m),
            Model::Compound(m) => m.parts().iter().find_map(Model::markov),
            Model::Dict(_) | Model::Match(_) => None,
        }
    }
}

impl From<MarkovModel> for Model {
    fn from(m: MarkovModel) -> Self {
        Model::Markov(m)
    }
}

impl From<DictModel> for Model {
    fn from(m: DictModel) -> Self {
        Model::Dict(m)
    }
}

impl From<MatchModel> for Model {
    fn from(m: MatchModel) -> Self {
        Model::Match(m)
    }
}

/// Several models behind one name.
///
/// Recognition takes the best score of the parts; training trains every part;
/// generation is delegated to the first part that can generate.
#[derive(Debug, Clone, Default)]
pub struct CompoundModel {
    parts: Vec<Model>,
}

impl CompoundModel {
    /// Wraps the given parts, in order.
    pub fn new(parts: Vec<Model>) -> Self {
        Self { parts }
    }

    /// Underlying models.
    pub fn parts(&self) -> &[Model] {
        &self.parts
    }

    /// Consumes the compound, returning its parts.
    pub fn into_parts(self) -> Vec<Model> {
        self.parts
    }

    /// First part able to generate.
    pub fn generator(&self) -> Option<&Model> {
        self.parts.iter().find(|m| m.can_generate())
    }

    /// Maximum confidence over the parts, stopping early at 1.0.
    pub fn recognize(&self, input: &str) -> f64 {
        let mut best = 0.0f64;
        for part in &self.parts {
            best = best.max(part.recognize(input));
            if best >= 1.0 {
                break;
            }
        }
        best
    }

    /// Trains every part.
    pub fn train(&mut self, input: &str) {
        for part in &mut self.parts {
            part.train(input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surname_markov() -> MarkovModel {
        let mut m = MarkovModel::new(2, "");
        for name in ["smith", "jones", "taylor", "brown", "wilson"] {
            m.train(name);
        }
        m
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(
            ModelKind::split_file_name("surname.markov.json"),
            Some(("surname", ModelKind::Markov))
        );
        assert_eq!(
            ModelKind::split_file_name("city.dict.txt"),
            Some(("city", ModelKind::Dict))
        );
        assert_eq!(
            ModelKind::split_file_name("phone.match.txt"),
            Some(("phone", ModelKind::Match))
        );
        assert_eq!(ModelKind::split_file_name("notes.txt"), None);
        assert_eq!(ModelKind::split_file_name(".dict.txt"), None);
    }

    #[test]
    fn test_compound_recognizes_best_part() {
        let mut dict = DictModel::new();
        dict.train("Zyxwv");
        let compound = CompoundModel::new(vec![surname_markov().into(), dict.into()]);

        assert_eq!(compound.recognize("zyxwv"), 1.0);
        assert!(compound.recognize("smith") > 0.05);
    }

    #[test]
    fn test_compound_generates_with_first_generator() {
        let markov = surname_markov();
        let expected = markov.generate("seed");
        let model = Model::Compound(CompoundModel::new(vec![
            DictModel::new().into(),
            markov.into(),
        ]));

        assert!(model.can_generate());
        assert_eq!(model.generate("seed"), Some(expected));
        assert_eq!(model.kinds(), vec![ModelKind::Dict, ModelKind::Markov]);
    }

    #[test]
    fn test_recognizers_do_not_generate() {
        let model = Model::Dict(DictModel::new());
        assert!(!model.can_generate());
        assert_eq!(model.generate("seed"), None);

        let compound = Model::Compound(CompoundModel::new(vec![model]));
        assert!(!compound.can_generate());
    }

    #[test]
    fn test_compound_trains_every_part() {
        let mut model = Model::Compound(CompoundModel::new(vec![
            DictModel::new().into(),
            MarkovModel::new(1, "").into(),
        ]));
        model.train("Ada");

        let Model::Compound(compound) = &model else {
            panic!("expected compound");
        };
        assert_eq!(compound.parts()[0].recognize("ada"), 1.0);
        assert!(!compound.parts()[1].markov().unwrap().is_empty());
    }

    #[test]
    fn test_generate_like_matches_case() {
        let model = Model::Markov(surname_markov());
        let generated = model.generate_like("SMITH").unwrap();
        assert_eq!(generated, generated.to_uppercase());
    }
}
