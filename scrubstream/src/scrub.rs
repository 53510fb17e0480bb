//! `scrub` and `verify` commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use scrubstream_core::format::json;
use scrubstream_core::nlp::{ModelSet, load_model_paths};
use scrubstream_core::{
    Config, FormatOptions, Mode, SchemaContext, Scrubber, ScrubberOptions, StatementScrubber,
    Verifier, default_parallelism, run_pool,
};
use tokio::io::{AsyncWrite, BufReader};
use tracing::{debug, info, warn};

/// Options shared by `scrub` and `verify`.
#[derive(Args, Debug)]
pub struct ScrubArgs {
    /// Model directories or individual model files
    #[arg(value_name = "MODELS")]
    pub models: Vec<PathBuf>,

    /// Input format
    #[arg(short, long, default_value = "mysql")]
    pub mode: Mode,

    /// Configuration file holding the scrubbing policy
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQL files declaring the tables of the dump (repeatable)
    #[arg(short = 'x', long, value_name = "FILE")]
    pub context: Vec<PathBuf>,

    /// Secret salt mixed into every masked value
    #[arg(short, long, env = "SCRUBSTREAM_SALT", default_value = "", hide_env_values = true)]
    pub salt: String,

    /// Number of worker threads for MySQL input
    #[arg(short = 'j', long, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Mask values instead of generating them from models
    #[arg(long)]
    pub mask_all: bool,

    /// Do not look for JSON or YAML documents inside string values
    #[arg(long)]
    pub shallow: bool,

    /// Emit INSERT statements unchanged
    #[arg(long)]
    pub skip_inserts: bool,

    /// Drop statements other than INSERT, including MySQL directives
    #[arg(long)]
    pub skip_misc: bool,

    /// Drop comment, blank and free-text lines
    #[arg(long)]
    pub skip_comments: bool,
}

impl ScrubArgs {
    fn format_options(&self) -> FormatOptions {
        FormatOptions::new()
            .with_inserts(!self.skip_inserts)
            .with_misc(!self.skip_misc)
            .with_comments(!self.skip_comments)
    }

    fn scrubber_options(&self) -> ScrubberOptions {
        ScrubberOptions::new()
            .with_salt(self.salt.clone())
            .with_mask_all(self.mask_all)
            .with_shallow(self.shallow)
    }
}

/// Loads the configuration, or the built-in policy when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => {
            debug!("No configuration given, using the built-in policy");
            Ok(Config::new())
        }
    }
}

/// Reads every context file into one schema.
pub fn load_context(paths: &[PathBuf]) -> anyhow::Result<SchemaContext> {
    let mut context = SchemaContext::new();
    for path in paths {
        let tables = context
            .scan_file(path)
            .with_context(|| format!("Failed to read context {}", path.display()))?;
        debug!("Read {} tables from {}", tables, path.display());
    }
    if !paths.is_empty() {
        info!("✓ Schema context holds {} tables", context.len());
    }
    Ok(context)
}

fn load_models(paths: &[PathBuf]) -> anyhow::Result<ModelSet> {
    if paths.is_empty() {
        return Ok(ModelSet::new());
    }
    load_model_paths(paths).context("Failed to load models")
}

fn build_scrubber(args: &ScrubArgs) -> anyhow::Result<Scrubber> {
    let config = load_config(args.config.as_deref())?;
    let models = load_models(&args.models)?;
    config.validate(&models).context("Invalid configuration")?;

    Scrubber::new(
        Arc::new(config.scrubbing),
        Arc::new(models),
        args.scrubber_options(),
    )
    .context("Failed to build scrubber")
}

/// Where scrubbed output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Discard,
}

async fn scrub_dump<W>(args: &ScrubArgs, scrubber: Scrubber, writer: W) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let context = Arc::new(load_context(&args.context)?);
    let workers = args.parallelism.unwrap_or_else(default_parallelism);
    let options = args.format_options();
    run_pool(BufReader::new(tokio::io::stdin()), writer, workers, |_| {
        StatementScrubber::new(scrubber.clone(), context.clone(), options)
    })
    .await
    .context("Failed to scrub dump")
}

fn scrub_documents(scrubber: &Scrubber, output: Output) -> anyhow::Result<u64> {
    let stdin = std::io::stdin().lock();
    let count = match output {
        Output::Stdout => json::scrub_stream(stdin, std::io::stdout().lock(), scrubber),
        Output::Discard => json::scrub_stream(stdin, std::io::sink(), scrubber),
    };
    count.context("Failed to scrub JSON documents")
}

async fn run(args: &ScrubArgs, scrubber: Scrubber, output: Output) -> anyhow::Result<()> {
    match args.mode {
        Mode::Mysql => {
            match output {
                Output::Stdout => scrub_dump(args, scrubber, tokio::io::stdout()).await?,
                Output::Discard => scrub_dump(args, scrubber, tokio::io::sink()).await?,
            };
        }
        Mode::Json => {
            if !args.context.is_empty() {
                warn!("Context files are ignored in json mode");
            }
            let count = crate::blocking(move || scrub_documents(&scrubber, output)).await?;
            info!("✓ Scrubbed {} JSON documents", count);
        }
    }
    Ok(())
}

/// Scrubs stdin to stdout.
pub async fn scrub(args: ScrubArgs) -> anyhow::Result<()> {
    let scrubber = build_scrubber(&args)?;
    run(&args, scrubber, Output::Stdout).await
}

/// Scrubs stdin without output and prints a YAML report of rule usage.
pub async fn verify(args: ScrubArgs) -> anyhow::Result<()> {
    let scrubber = build_scrubber(&args)?;
    let verifier = Arc::new(Verifier::new(Arc::new(scrubber.policy().clone())));
    let scrubber = scrubber.with_verifier(verifier.clone());

    run(&args, scrubber, Output::Discard).await?;

    let report = verifier.report().to_yaml().context("Failed to render report")?;
    print!("{}", report);

    let passed = verifier.passed_fields();
    if !passed.is_empty() {
        info!("{} fields passed through unscrubbed", passed.len());
        debug!("Unscrubbed fields: {}", passed.join(", "));
    }
    Ok(())
}
