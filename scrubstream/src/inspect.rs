//! `recognize`, `generate` and `extract` commands for exploring models and data.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use scrubstream_core::format::json;
use scrubstream_core::format::mysql::Extractor;
use scrubstream_core::nlp::{Model, load_model};
use scrubstream_core::Mode;
use tracing::{error, info, warn};

use crate::scrub::load_context;

#[derive(Args, Debug)]
pub struct RecognizeArgs {
    /// Model file to score lines with
    #[arg(value_name = "MODEL_FILE")]
    pub model: PathBuf,

    /// Minimum confidence for a line to be printed
    #[arg(short, long, default_value_t = 0.5)]
    pub confidence: f64,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Model file to generate from
    #[arg(value_name = "MODEL_FILE")]
    pub model: PathBuf,

    /// Number of values to print when stdin holds no seeds
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Column or field names; `table.column` and `table.N` are accepted for SQL
    #[arg(value_name = "NAMES", required = true)]
    pub names: Vec<String>,

    /// Input format
    #[arg(short, long, default_value = "mysql")]
    pub mode: Mode,

    /// SQL files declaring the tables of the dump (repeatable)
    #[arg(short = 'x', long, value_name = "FILE")]
    pub context: Vec<PathBuf>,
}

fn open_model(path: &std::path::Path) -> anyhow::Result<Model> {
    let (name, model) =
        load_model(path).with_context(|| format!("Failed to load model {}", path.display()))?;
    info!("✓ Loaded model '{}'", name);
    Ok(model)
}

fn recognized_lines(model: &Model, confidence: f64) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    let mut matched = 0u64;
    crate::for_each_line(std::io::stdin().lock(), |line| {
        if model.recognize(line) >= confidence {
            writeln!(out, "{}", line).context("Failed to write output")?;
            matched = matched.saturating_add(1);
        }
        Ok(())
    })?;
    info!("✓ Recognized {} lines", matched);
    Ok(())
}

/// Prints the stdin lines the model recognizes with enough confidence.
pub async fn recognize(args: RecognizeArgs) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&args.confidence) {
        anyhow::bail!("Confidence must be between 0.0 and 1.0, got {}", args.confidence);
    }
    let model = open_model(&args.model)?;
    crate::blocking(move || recognized_lines(&model, args.confidence)).await
}

/// Non-empty lines of `reader`, or `1..=count` when there are none.
fn seeds<R: BufRead>(reader: R, count: u32) -> anyhow::Result<Vec<String>> {
    let mut seeds = Vec::new();
    crate::for_each_line(reader, |line| {
        if !line.is_empty() {
            seeds.push(line.to_string());
        }
        Ok(())
    })?;
    if seeds.is_empty() {
        seeds = (1..=count).map(|i| i.to_string()).collect();
    }
    Ok(seeds)
}

fn generated_values(model: &Model, count: u32) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    for seed in seeds(std::io::stdin().lock(), count)? {
        if let Some(value) = model.generate(&seed) {
            writeln!(out, "{}", value).context("Failed to write output")?;
        }
    }
    Ok(())
}

/// Prints one generated value per seed.
pub async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let model = open_model(&args.model)?;
    if !model.can_generate() {
        anyhow::bail!("{} cannot generate values; only Markov models can", args.model.display());
    }
    let count = args.count;
    crate::blocking(move || generated_values(&model, count)).await
}

fn extract_dump(extractor: &Extractor) -> anyhow::Result<u64> {
    let mut out = std::io::stdout().lock();
    let mut number = 0u64;
    let mut count = 0u64;
    crate::for_each_line(std::io::stdin().lock(), |line| {
        number = number.saturating_add(1);
        match extractor.extract_line(line) {
            Ok(values) => {
                for value in values {
                    writeln!(out, "{}", value).context("Failed to write output")?;
                    count = count.saturating_add(1);
                }
            }
            Err(e) => error!("Skipping line {}: {}", number, e),
        }
        Ok(())
    })?;
    Ok(count)
}

/// Prints the values of the named columns or fields found on stdin.
pub async fn extract(args: ExtractArgs) -> anyhow::Result<()> {
    let count = match args.mode {
        Mode::Mysql => {
            let context = Arc::new(load_context(&args.context)?);
            let extractor = Extractor::new(args.names, context);
            crate::blocking(move || extract_dump(&extractor)).await?
        }
        Mode::Json => {
            if !args.context.is_empty() {
                warn!("Context files are ignored in json mode");
            }
            let names = args.names;
            crate::blocking(move || {
                json::extract_stream(std::io::stdin().lock(), std::io::stdout().lock(), &names)
                    .context("Failed to extract from JSON documents")
            })
            .await?
        }
    };
    info!("✓ Extracted {} values", count);
    Ok(())
}
