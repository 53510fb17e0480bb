//! Order-preserving worker pool for line-oriented input.
//!
//! Each worker runs on tokio's blocking thread pool and owns a private
//! [`LineProcessor`]. Every worker has its own input and output channel of
//! capacity one. Lines are dealt round-robin; once every worker holds a line,
//! one result is collected from each worker in the same order, so output
//! order always equals input order.

use std::num::NonZeroUsize;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{Result, ScrubError};

/// Turns one input line into the text to emit for it (possibly empty).
pub trait LineProcessor: Send + 'static {
    /// Processes line `number` (1-based), trailing newline included.
    fn process(&mut self, number: u64, line: &str) -> String;
}

impl<F> LineProcessor for F
where
    F: FnMut(u64, &str) -> String + Send + 'static,
{
    fn process(&mut self, number: u64, line: &str) -> String {
        self(number, line)
    }
}

/// Number of workers to use when none is configured.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

struct Worker {
    input: mpsc::Sender<(u64, String)>,
    output: mpsc::Receiver<String>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn spawn<P: LineProcessor>(mut processor: P) -> Self {
        let (input, mut lines) = mpsc::channel::<(u64, String)>(1);
        let (results, output) = mpsc::channel::<String>(1);

        let handle = tokio::task::spawn_blocking(move || {
            while let Some((number, line)) = lines.blocking_recv() {
                if results.blocking_send(processor.process(number, &line)).is_err() {
                    break;
                }
            }
        });

        Self {
            input,
            output,
            handle,
        }
    }
}

async fn drain<W: AsyncWrite + Unpin>(workers: &mut [Worker], writer: &mut W) -> Result<()> {
    for (index, worker) in workers.iter_mut().enumerate() {
        let text = worker
            .output
            .recv()
            .await
            .ok_or_else(|| ScrubError::worker(format!("worker {} exited early", index)))?;
        writer
            .write_all(text.as_bytes())
            .await
            .map_err(|e| ScrubError::io("writing output", e))?;
    }
    Ok(())
}

/// Runs `reader` through a pool of `workers` processors into `writer`.
///
/// `factory` builds the processor of each worker from its index. Lines are
/// split on `\n` and decoded lossily; a final line without a newline is
/// processed too. Returns the number of lines read.
///
/// # Errors
/// Fails on I/O errors and when a worker panics.
pub async fn run_pool<R, W, P, F>(
    mut reader: R,
    mut writer: W,
    workers: usize,
    mut factory: F,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    P: LineProcessor,
    F: FnMut(usize) -> P,
{
    let size = workers.max(1);
    let mut pool: Vec<Worker> = (0..size).map(|index| Worker::spawn(factory(index))).collect();
    debug!("Started {} workers", size);

    let mut buf = Vec::new();
    let mut number = 0u64;
    let mut slot = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| ScrubError::io("reading input", e))?;
        if read == 0 {
            break;
        }
        number = number.saturating_add(1);

        let line = String::from_utf8_lossy(&buf).into_owned();
        if let Some(worker) = pool.get(slot) {
            worker
                .input
                .send((number, line))
                .await
                .map_err(|_| ScrubError::worker(format!("worker {} stopped accepting input", slot)))?;
        }

        slot = slot.saturating_add(1);
        if slot == size {
            drain(&mut pool, &mut writer).await?;
            slot = 0;
        }
    }

    if let Some(partial) = pool.get_mut(..slot) {
        drain(partial, &mut writer).await?;
    }

    let handles: Vec<JoinHandle<()>> = pool
        .into_iter()
        .map(|worker| {
            drop(worker.input);
            worker.handle
        })
        .collect();
    for handle in handles {
        handle
            .await
            .map_err(|e| ScrubError::worker(format!("worker panicked: {}", e)))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| ScrubError::io("flushing output", e))?;
    info!("✓ Processed {} lines with {} workers", number, size);
    Ok(number)
}
