//! `learn` and `train` commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use scrubstream_core::format::json;
use scrubstream_core::format::mysql::Learner;
use scrubstream_core::nlp::{MarkovModel, ModelSet, load_models, save_model};
use scrubstream_core::{Config, Mode, Policy, SchemaContext};
use tracing::{debug, error, info};

use crate::scrub::{load_config, load_context};

#[derive(Args, Debug)]
pub struct LearnArgs {
    /// Directory holding the models; created if missing
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Input format
    #[arg(short, long, default_value = "mysql")]
    pub mode: Mode,

    /// Configuration file declaring the models and the policy
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQL files declaring the tables of the dump (repeatable)
    #[arg(short = 'x', long, value_name = "FILE")]
    pub context: Vec<PathBuf>,
}

/// Token granularity of a Markov model.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Each entry is a sequence of characters
    Words,
    /// Each entry is a sequence of space-separated words
    Sentences,
}

impl Unit {
    fn separator(self) -> &'static str {
        match self {
            Unit::Words => "",
            Unit::Sentences => " ",
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// What each corpus line is made of
    #[arg(value_enum)]
    pub unit: Unit,

    /// Number of preceding tokens each transition looks at
    #[arg(value_name = "ORDER", value_parser = clap::value_parser!(u16).range(1..))]
    pub order: u16,
}

fn existing_models(args: &LearnArgs) -> anyhow::Result<ModelSet> {
    if !args.model_dir.is_dir() {
        debug!("{} does not exist yet", args.model_dir.display());
        return Ok(ModelSet::new());
    }
    load_models(&args.model_dir)
        .with_context(|| format!("Failed to load models from {}", args.model_dir.display()))
}

fn learn_dump(policy: Arc<Policy>, context: Arc<SchemaContext>, models: ModelSet) -> anyhow::Result<(u64, ModelSet)> {
    let mut learner = Learner::new(policy, context, models);
    let mut number = 0u64;
    crate::for_each_line(std::io::stdin().lock(), |line| {
        number = number.saturating_add(1);
        if let Err(e) = learner.learn_line(line) {
            error!("Skipping line {}: {}", number, e);
        }
        Ok(())
    })?;
    Ok((learner.trained(), learner.into_models()))
}

fn prepare(args: &LearnArgs) -> anyhow::Result<(Config, ModelSet)> {
    let config = load_config(args.config.as_deref())?;
    let mut models = existing_models(args)?;
    for name in config.instantiate_missing(&mut models) {
        info!("Created model '{}'", name);
    }
    config.validate(&models).context("Invalid configuration")?;
    Ok((config, models))
}

/// Trains the configured models from stdin and saves them.
pub async fn learn(args: LearnArgs) -> anyhow::Result<()> {
    let (config, models) = prepare(&args)?;
    if models.is_empty() {
        anyhow::bail!("No models to train: declare some under \"learning\" in the configuration");
    }

    let policy = Arc::new(config.scrubbing);
    let (trained, models) = match args.mode {
        Mode::Mysql => {
            let context = Arc::new(load_context(&args.context)?);
            crate::blocking(move || learn_dump(policy, context, models)).await?
        }
        Mode::Json => {
            crate::blocking(move || {
                let mut models = models;
                let trained = json::learn_stream(std::io::stdin().lock(), &policy, &mut models)
                    .context("Failed to learn from JSON documents")?;
                Ok((trained, models))
            })
            .await?
        }
    };

    std::fs::create_dir_all(&args.model_dir)
        .with_context(|| format!("Failed to create {}", args.model_dir.display()))?;
    for (name, model) in &models {
        save_model(model, &args.model_dir, name)
            .with_context(|| format!("Failed to save model '{}'", name))?;
    }

    info!(
        "✓ Trained {} models on {} values into {}",
        models.len(),
        trained,
        args.model_dir.display()
    );
    Ok(())
}

fn train_corpus(unit: Unit, order: usize) -> anyhow::Result<MarkovModel> {
    let mut model = MarkovModel::new(order, unit.separator());
    let mut entries = 0u64;
    crate::for_each_line(std::io::stdin().lock(), |line| {
        if !line.is_empty() {
            model.train(line);
            entries = entries.saturating_add(1);
        }
        Ok(())
    })?;
    info!("✓ Trained order-{} model on {} entries", order, entries);
    Ok(model)
}

/// Builds a Markov model from stdin and prints it as JSON.
pub async fn train(args: TrainArgs) -> anyhow::Result<()> {
    let unit = args.unit;
    let order = usize::from(args.order);
    let model = crate::blocking(move || train_corpus(unit, order)).await?;

    let json = serde_json::to_string_pretty(&model).context("Failed to encode model")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::Cli;
    use clap::Parser;

    #[test]
    fn test_unit_separators() {
        assert_eq!(Unit::Words.separator(), "");
        assert_eq!(Unit::Sentences.separator(), " ");
    }

    #[test]
    fn test_train_rejects_zero_order() {
        assert!(Cli::try_parse_from(["scrubstream", "train", "words", "0"]).is_err());
        assert!(Cli::try_parse_from(["scrubstream", "train", "sentences", "2"]).is_ok());
    }

    #[test]
    fn test_prepare_instantiates_declared_models() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(
            &config,
            r#"{"learning": {"surname": {"markov": {"order": 2, "delim": ""}}},
                "scrubbing": {"fieldname": [{"in": "surname", "out": "generate(surname)"}]}}"#,
        )
        .unwrap();

        let args = LearnArgs {
            model_dir: dir.path().join("models"),
            mode: Mode::Mysql,
            config: Some(config),
            context: Vec::new(),
        };
        let (_, models) = prepare(&args).unwrap();
        assert!(models.contains_key("surname"));
        assert!(models["surname"].markov().is_some());
    }
}
