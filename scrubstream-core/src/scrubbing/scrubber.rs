//! The policy-driven scrubbing engine.

use std::sync::Arc;

use tracing::trace;

use super::disposition::Disposition;
use super::mask::Masker;
use super::policy::Policy;
use super::verifier::Verifier;
use crate::nlp::ModelSet;

/// Serialized Ruby hashes are emptied rather than parsed.
const RUBY_HASH_SENTINEL: &str = "--- !ruby/hash";

/// Knobs that change how values are scrubbed.
#[derive(Debug, Clone, Default)]
pub struct ScrubberOptions {
    /// Static diversifier mixed into every masking seed.
    pub salt: String,
    /// Mask instead of generating; lets a policy run without trained models.
    pub mask_all: bool,
    /// Do not recurse into values holding serialized JSON or YAML.
    pub shallow: bool,
}

impl ScrubberOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the salt.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    /// Builder method to enable mask-instead-of-generate.
    pub fn with_mask_all(mut self, mask_all: bool) -> Self {
        self.mask_all = mask_all;
        self
    }

    /// Builder method to disable recursion into embedded documents.
    pub fn with_shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }
}

/// Applies a [`Policy`] to individual values.
///
/// Policy and models are shared read-only; a scrubber is cheap to clone so
/// each worker can own one.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use scrubstream_core::nlp::ModelSet;
/// use scrubstream_core::scrubbing::{Policy, Scrubber, ScrubberOptions};
///
/// let scrubber = Scrubber::new(
///     Arc::new(Policy::default()),
///     Arc::new(ModelSet::new()),
///     ScrubberOptions::default(),
/// ).unwrap();
///
/// let masked = scrubber.scrub_string("joe@foo.com", &["email".to_string()]);
/// assert!(masked.ends_with(".com"));
/// assert_ne!(masked, "joe@foo.com");
/// ```
#[derive(Debug, Clone)]
pub struct Scrubber {
    policy: Arc<Policy>,
    models: Arc<ModelSet>,
    masker: Masker,
    options: ScrubberOptions,
    verifier: Option<Arc<Verifier>>,
}

impl Scrubber {
    /// Creates a scrubber after validating the policy against the models.
    pub fn new(
        policy: Arc<Policy>,
        models: Arc<ModelSet>,
        options: ScrubberOptions,
    ) -> crate::Result<Self> {
        policy.validate(&models)?;
        Ok(Self {
            policy,
            models,
            masker: Masker::new(options.salt.clone()),
            options,
            verifier: None,
        })
    }

    /// Attaches a verifier that records every decision.
    pub fn with_verifier(mut self, verifier: Arc<Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// The policy in force.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Resolves the policy for a value, field-name rules first.
    fn resolve(&self, value: &str, names: &[String]) -> Option<Resolution<'_>> {
        if let Some((disposition, index)) = self.policy.match_field_name(names) {
            return Some(Resolution::FieldName(disposition, index));
        }
        self.policy
            .match_heuristic(value, &self.models)
            .map(|(disposition, index)| Resolution::Heuristic(disposition, index))
    }

    fn record(&self, resolution: &Resolution<'_>, input: &str, output: &str, names: &[String]) {
        let Some(verifier) = &self.verifier else {
            return;
        };
        match resolution {
            Resolution::FieldName(_, index) => verifier.record_field_name(input, output, names, *index),
            Resolution::Heuristic(_, index) => verifier.record_heuristic(input, output, names, *index),
        }
    }

    /// True when the value should be removed entirely (NULL in SQL).
    ///
    /// Records a hit when a rule matches, never a pass: callers are expected
    /// to call [`Scrubber::scrub_string`] when this returns false.
    pub fn erase_string(&self, value: &str, names: &[String]) -> bool {
        match self.resolve(value, names) {
            Some(resolution) => {
                let erase = *resolution.disposition() == Disposition::Erase;
                if erase {
                    self.record(&resolution, value, "", names);
                }
                erase
            }
            None => false,
        }
    }

    /// Scrubs one value.
    ///
    /// 1. A matching field-name rule decides.
    /// 2. Otherwise, unless shallow, embedded JSON or YAML collections are
    ///    scrubbed recursively.
    /// 3. Otherwise a matching heuristic rule decides.
    /// 4. Otherwise the value passes through unchanged.
    pub fn scrub_string(&self, value: &str, names: &[String]) -> String {
        if let Some((disposition, index)) = self.policy.match_field_name(names) {
            let out = self.apply(disposition, value);
            self.record(&Resolution::FieldName(disposition, index), value, &out, names);
            return out;
        }

        if !self.options.shallow {
            if let Some(out) = self.scrub_embedded(value) {
                return out;
            }
        }

        if let Some((disposition, index)) = self.policy.match_heuristic(value, &self.models) {
            let out = self.apply(disposition, value);
            self.record(&Resolution::Heuristic(disposition, index), value, &out, names);
            return out;
        }

        if let Some(verifier) = &self.verifier {
            verifier.record_pass(value, names);
        }
        value.to_string()
    }

    /// Executes a disposition on a value.
    ///
    /// # Panics
    /// Panics when a `generate` disposition names a model that is missing or
    /// cannot generate. [`Scrubber::new`] validates the policy, so this only
    /// happens if the model set changed afterwards.
    fn apply(&self, disposition: &Disposition, value: &str) -> String {
        match disposition {
            Disposition::Erase => String::new(),
            Disposition::Mask => self.masker.mask(value),
            Disposition::Pass => value.to_string(),
            Disposition::Replace(text) => text.clone(),
            Disposition::Generate(_) if self.options.mask_all => self.masker.mask(value),
            Disposition::Generate(name) => self
                .models
                .get(name)
                .and_then(|model| model.generate_like(value))
                .unwrap_or_else(|| panic!("model '{}' is missing or cannot generate", name)),
        }
    }

    /// Scrubs a value holding a serialized collection; `None` when it holds none.
    fn scrub_embedded(&self, value: &str) -> Option<String> {
        if value.starts_with(RUBY_HASH_SENTINEL) {
            return Some("{}".to_string());
        }

        let trimmed = value.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(data) = serde_json::from_str::<serde_json::Value>(value) {
                if data.is_object() || data.is_array() {
                    trace!("Scrubbing embedded JSON document");
                    let scrubbed = self.scrub_data(data, &[]);
                    if let Ok(out) = serde_json::to_string(&scrubbed) {
                        return Some(out);
                    }
                }
            }
        }

        if trimmed.starts_with("---") || value.contains('\n') {
            if let Ok(data) = serde_yaml::from_str::<serde_yaml::Value>(value) {
                if is_yaml_collection(&data) {
                    trace!("Scrubbing embedded YAML document");
                    let scrubbed = self.scrub_yaml(data, &[]);
                    if let Ok(out) = serde_yaml::to_string(&scrubbed) {
                        return Some(out);
                    }
                }
            }
        }

        None
    }

    /// Recursively scrubs a decoded JSON tree.
    ///
    /// Array elements are named by their index, object members by their key.
    pub fn scrub_data(&self, data: serde_json::Value, names: &[String]) -> serde_json::Value {
        use serde_json::Value;

        match data {
            Value::String(s) => Value::String(self.scrub_string(&s, names)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.scrub_data(item, &[i.to_string()]))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| {
                        let scrubbed = self.scrub_data(item, std::slice::from_ref(&key));
                        (key, scrubbed)
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    /// Recursively scrubs a decoded YAML tree, naming nodes like [`Scrubber::scrub_data`].
    pub fn scrub_yaml(&self, data: serde_yaml::Value, names: &[String]) -> serde_yaml::Value {
        use serde_yaml::Value;

        match data {
            Value::String(s) => Value::String(self.scrub_string(&s, names)),
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.scrub_yaml(item, &[i.to_string()]))
                    .collect(),
            ),
            Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(key, item)| {
                        let name: Vec<String> = yaml_key_name(&key).into_iter().collect();
                        let scrubbed = self.scrub_yaml(item, &name);
                        (key, scrubbed)
                    })
                    .collect(),
            ),
            Value::Tagged(mut tagged) => {
                tagged.value = self.scrub_yaml(tagged.value, names);
                Value::Tagged(tagged)
            }
            other => other,
        }
    }
}

fn is_yaml_collection(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => true,
        serde_yaml::Value::Tagged(tagged) => is_yaml_collection(&tagged.value),
        _ => false,
    }
}

fn yaml_key_name(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Which rule list resolved a value.
enum Resolution<'a> {
    FieldName(&'a Disposition, usize),
    Heuristic(&'a Disposition, usize),
}

impl Resolution<'_> {
    fn disposition(&self) -> &Disposition {
        match self {
            Resolution::FieldName(d, _) | Resolution::Heuristic(d, _) => d,
        }
    }
}
