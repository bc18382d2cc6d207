use anyhow::{anyhow, Context, Result};
use futures::future::try_join_all;
use std::fmt;
use std::ops::Range;
use tokio::runtime::{Builder, Runtime};

/// Lifecycle of one benchmark run, logged as the driver moves through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Warming,
    Dispatched,
    Awaiting,
    Reduced,
    Reported,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Warming => "warming",
            Self::Dispatched => "dispatched",
            Self::Awaiting => "awaiting",
            Self::Reduced => "reduced",
            Self::Reported => "reported",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-size pool for CPU-bound batch tasks.
///
/// Each pool owns a dedicated tokio runtime whose blocking pool is capped at `workers`
/// threads. Submitted tasks beyond that wait in the runtime queue, so at most `workers`
/// batches execute at once.
pub struct WorkerPool {
    runtime: Runtime,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("bench-worker")
            .build()
            .context("failed to build worker pool runtime")?;
        Ok(Self { runtime, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every task to completion and returns their outputs in submission order.
    ///
    /// The first task error or panic is returned and the remaining tasks are abandoned; the
    /// runtime is torn down in the background instead of waiting on them.
    pub fn run_all<T, F>(self, tasks: Vec<F>) -> Result<Vec<T>>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let count = tasks.len();
        let workers = self.workers;
        let outcome = self.runtime.block_on(async move {
            let handles: Vec<_> = tasks
                .into_iter()
                .map(tokio::task::spawn_blocking)
                .collect();
            tracing::debug!(phase = %Phase::Dispatched, tasks = count, workers, "batch tasks submitted");

            let joins = handles.into_iter().enumerate().map(|(index, handle)| async move {
                let output = handle
                    .await
                    .map_err(|err| anyhow!("batch task {index} panicked: {err}"))?
                    .with_context(|| format!("batch task {index} failed"))?;
                tracing::trace!(task = index, "batch task finished");
                Ok::<T, anyhow::Error>(output)
            });
            tracing::debug!(phase = %Phase::Awaiting, tasks = count, "waiting on batch tasks");
            try_join_all(joins).await
        });

        match outcome {
            Ok(outputs) => Ok(outputs),
            Err(err) => {
                tracing::error!(error = %err, "batch task failed; abandoning run");
                self.runtime.shutdown_background();
                Err(err)
            }
        }
    }
}

/// Splits `total` items into `parts` contiguous ranges whose sizes differ by at most one.
/// The first `total % parts` ranges take the extra item. Empty ranges are dropped.
pub fn split_even(total: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let base = total / parts;
    let remainder = total % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for part in 0..parts {
        let len = base + usize::from(part < remainder);
        if len == 0 {
            break;
        }
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Splits `total` items into contiguous chunks of `chunk` items; the last one may be shorter.
pub fn split_chunks(total: usize, chunk: usize) -> Vec<Range<usize>> {
    let chunk = chunk.max(1);
    (0..total)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(total))
        .collect()
}
