//! Streaming data sanitizer.
//!
//! Reads a MySQL dump or a stream of JSON documents on stdin and writes a
//! scrubbed copy to stdout, following a policy of field-name and heuristic
//! rules. Diagnostics go to stderr.
//!
//! # Guarantees
//! - Output order equals input order
//! - The same input, policy, models and salt always give the same output
//! - Scrubbed values never appear in logs

mod inspect;
mod scrub;
mod training;

use std::io::BufRead;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use scrubstream_core::logging::init_logging;

use crate::inspect::{ExtractArgs, GenerateArgs, RecognizeArgs};
use crate::scrub::ScrubArgs;
use crate::training::{LearnArgs, TrainArgs};

#[derive(Parser)]
#[command(name = "scrubstream")]
#[command(about = "Streaming data sanitizer for SQL dumps and JSON documents")]
#[command(version)]
#[command(long_about = "
scrubstream - Policy-driven anonymization of data streams

Reads structured data on stdin and writes a sanitized copy to stdout:
- MySQL dumps (one statement per line, as produced by mysqldump)
- Streams of concatenated JSON documents

Each value is erased, masked, replaced, regenerated from a trained model or
passed through, according to field-name rules and model-based heuristics.

EXAMPLES:
  mysqldump shop | scrubstream scrub -c policy.json -x schema.sql models/ > clean.sql
  scrubstream verify -c policy.json models/ < dump.sql
  scrubstream learn -c policy.json models/ < dump.sql
  scrubstream train words 2 < surnames.txt > models/surname.markov.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scrub stdin to stdout
    Scrub(ScrubArgs),
    /// Scrub stdin, discard the output and print a verification report
    Verify(ScrubArgs),
    /// Train the configured models from the values of stdin
    Learn(LearnArgs),
    /// Build a Markov model from a corpus on stdin, one entry per line
    Train(TrainArgs),
    /// Print the stdin lines a model recognizes
    Recognize(RecognizeArgs),
    /// Print values generated by a model
    Generate(GenerateArgs),
    /// Print the values of named columns or fields
    Extract(ExtractArgs),
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logging except errors")]
    pub quiet: bool,
}

/// Runs blocking work (stdin parsing, model training) off the async runtime.
pub(crate) async fn blocking<T, F>(work: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("Background task failed")?
}

/// Calls `visit` with each line of `reader`, trailing line breaks removed.
///
/// Invalid UTF-8 is replaced; a final line without a newline is included.
pub(crate) fn for_each_line<R, F>(mut reader: R, mut visit: F) -> anyhow::Result<()>
where
    R: BufRead,
    F: FnMut(&str) -> anyhow::Result<()>,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).context("Failed to read input")? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        visit(line.trim_end_matches(['\r', '\n', '\t']))?;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match cli.command {
        Command::Scrub(args) => scrub::scrub(args).await,
        Command::Verify(args) => scrub::verify(args).await,
        Command::Learn(args) => training::learn(args).await,
        Command::Train(args) => training::train(args).await,
        Command::Recognize(args) => inspect::recognize(args).await,
        Command::Generate(args) => inspect::generate(args).await,
        Command::Extract(args) => inspect::extract(args).await,
    }
}
