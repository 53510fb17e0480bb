//! Loading and saving models on disk.
//!
//! Each model lives in one file named `<name><extension>`, where the
//! extension selects the flavor (see [`ModelKind::extension`]). Files sharing
//! a base name are combined into a [`CompoundModel`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::dict::DictModel;
use super::markov::MarkovModel;
use super::model::{CompoundModel, Model, ModelKind, ModelSet};
use super::pattern::MatchModel;
use crate::{Result, ScrubError};

fn file_name_of(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ScrubError::configuration(format!("not a model file: {}", path.display())))
}

fn parse_model(name: &str, kind: ModelKind, contents: &str) -> Result<Model> {
    match kind {
        ModelKind::Markov => {
            let m: MarkovModel = serde_json::from_str(contents)
                .map_err(|e| ScrubError::model(name, format!("malformed markov model: {}", e)))?;
            Ok(Model::Markov(m))
        }
        ModelKind::Dict => Ok(Model::Dict(DictModel::from_text(contents))),
        ModelKind::Match => Ok(Model::Match(MatchModel::from_text(contents)?)),
    }
}

/// Loads a single model file, returning its base name and the model.
pub fn load_model(path: &Path) -> Result<(String, Model)> {
    let file_name = file_name_of(path)?;
    let (name, kind) = ModelKind::split_file_name(file_name).ok_or_else(|| {
        ScrubError::configuration(format!(
            "unknown model file extension: {}",
            path.display()
        ))
    })?;

    let contents = fs::read_to_string(path)
        .map_err(|e| ScrubError::io(format!("reading model {}", path.display()), e))?;
    let model = parse_model(name, kind, &contents)?;
    debug!("Loaded {} model '{}' from {}", kind, name, path.display());
    Ok((name.to_string(), model))
}

fn combine(name: &str, mut parts: BTreeMap<ModelKind, Model>) -> Option<Model> {
    if parts.len() == 1 {
        return parts.pop_first().map(|(_, m)| m);
    }
    debug!("Combining {} models named '{}'", parts.len(), name);
    // BTreeMap order follows ModelKind: markov, dict, match
    Some(Model::Compound(CompoundModel::new(
        parts.into_values().collect(),
    )))
}

/// Loads every model file in a directory.
///
/// Hidden files and subdirectories are skipped, as are files whose extension
/// does not name a model flavor.
pub fn load_models(dir: &Path) -> Result<ModelSet> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScrubError::io(format!("reading model directory {}", dir.display()), e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| ScrubError::io(format!("listing {}", dir.display()), e))?;
        paths.push(entry.path());
    }
    paths.sort();

    let mut grouped: BTreeMap<String, BTreeMap<ModelKind, Model>> = BTreeMap::new();
    for path in paths {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') || path.is_dir() {
            continue;
        }
        let Some((_, kind)) = ModelKind::split_file_name(file_name) else {
            warn!("Skipping {}: not a model file", path.display());
            continue;
        };

        let (name, model) = load_model(&path)?;
        grouped.entry(name).or_default().insert(kind, model);
    }

    let models: ModelSet = grouped
        .into_iter()
        .filter_map(|(name, parts)| combine(&name, parts).map(|m| (name, m)))
        .collect();

    info!("Loaded {} models from {}", models.len(), dir.display());
    Ok(models)
}

/// Loads models from a mix of directories and individual model files.
///
/// Later paths override earlier ones when names collide.
pub fn load_model_paths<P: AsRef<Path>>(paths: &[P]) -> Result<ModelSet> {
    let mut models = ModelSet::new();
    for path in paths {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .map_err(|e| ScrubError::io(format!("reading {}", path.display()), e))?;
        if metadata.is_dir() {
            models.extend(load_models(path)?);
        } else {
            let (name, model) = load_model(path)?;
            models.insert(name, model);
        }
    }
    Ok(models)
}

fn render(name: &str, model: &Model) -> Result<Vec<(ModelKind, String)>> {
    match model {
        Model::Markov(m) => {
            let json = serde_json::to_string_pretty(m)
                .map_err(|e| ScrubError::serialization(format!("encoding model '{}'", name), e))?;
            Ok(vec![(ModelKind::Markov, json)])
        }
        Model::Dict(m) => Ok(vec![(ModelKind::Dict, m.to_text())]),
        Model::Match(m) => Ok(vec![(ModelKind::Match, m.to_text())]),
        Model::Compound(m) => {
            let mut out = Vec::new();
            for part in m.parts() {
                out.extend(render(name, part)?);
            }
            Ok(out)
        }
    }
}

/// Saves a model into `dir` under `name`, one file per flavor.
pub fn save_model(model: &Model, dir: &Path, name: &str) -> Result<()> {
    for (kind, contents) in render(name, model)? {
        let path = dir.join(format!("{}{}", name, kind.extension()));
        fs::write(&path, contents)
            .map_err(|e| ScrubError::io(format!("writing model {}", path.display()), e))?;
        debug!("Saved {} model '{}' to {}", kind, name, path.display());
    }
    Ok(())
}
