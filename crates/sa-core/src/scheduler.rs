//! Pair enumeration, balanced partitioning and the parallel fan-out/fan-in.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::{Result, ScreenError};
use crate::reject::{RejectReason, RejectTally};

/// Upper bound on the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// Ordered `(first, second)` pair of tickers.
pub type PairCandidate = (String, String);

/// `min(available_parallelism, 8)`, at least 1.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_WORKERS)
}

/// All `C(n, 2)` pairs `(t[i], t[j])`, `i < j`, in the given ticker order,
/// after dropping blacklisted tickers. `max_pairs` keeps only the first N
/// pairs of that order.
pub fn enumerate_pairs<'t, I>(
    tickers: I,
    blacklist: &[String],
    max_pairs: Option<usize>,
) -> Vec<PairCandidate>
where
    I: IntoIterator<Item = &'t str>,
{
    let banned: FxHashSet<&str> = blacklist.iter().map(String::as_str).collect();
    let universe: Vec<&str> = tickers.into_iter().filter(|t| !banned.contains(t)).collect();
    let limit = max_pairs.unwrap_or(usize::MAX);

    universe
        .iter()
        .enumerate()
        .flat_map(|(i, a)| universe[i + 1..].iter().map(move |b| (*a, *b)))
        .take(limit)
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

/// Split into `n` contiguous chunks whose sizes differ by at most one; the
/// first `len % n` chunks get the extra element. Chunks may be empty when
/// `len < n`. `n == 0` is treated as 1.
pub fn split_into_chunks<T>(items: &[T], n: usize) -> Vec<&[T]> {
    let n = n.max(1);
    let (k, m) = (items.len() / n, items.len() % n);
    (0..n)
        .map(|i| &items[i * k + i.min(m)..(i + 1) * k + (i + 1).min(m)])
        .collect()
}

/// Output of one worker.
#[derive(Debug)]
pub struct ChunkOutcome<T> {
    pub results: Vec<T>,
    pub tally: RejectTally,
}

/// Joined output of every worker, in chunk order.
#[derive(Debug)]
pub struct Scheduled<T> {
    pub results: Vec<T>,
    pub tally: RejectTally,
    pub workers: usize,
    /// Chunks dropped under `tolerate_worker_failures`.
    pub failed_chunks: Vec<usize>,
}

/// Run `eval` over one chunk, sequentially.
pub fn process_chunk<T, F>(chunk: &[PairCandidate], eval: &F) -> ChunkOutcome<T>
where
    F: Fn(&str, &str) -> std::result::Result<T, RejectReason>,
{
    let mut results = Vec::new();
    let mut tally = RejectTally::default();
    for (a, b) in chunk {
        match eval(a, b) {
            Ok(r) => {
                tally.record_accept();
                results.push(r);
            }
            Err(reason) => tally.record(reason),
        }
    }
    ChunkOutcome { results, tally }
}

/// Partition `pairs` over `workers` threads, evaluate every chunk and join.
///
/// A panicking chunk is fatal ([`ScreenError::WorkerFailed`]) unless
/// `tolerate_failures` is set, in which case it contributes nothing.
pub fn run_chunks<T, F>(
    pairs: &[PairCandidate],
    workers: usize,
    tolerate_failures: bool,
    eval: F,
) -> Result<Scheduled<T>>
where
    T: Send,
    F: Fn(&str, &str) -> std::result::Result<T, RejectReason> + Sync,
{
    let workers = workers.max(1);
    let chunks = split_into_chunks(pairs, workers);
    debug!(
        pairs = pairs.len(),
        workers,
        sizes = ?chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
        "dispatching chunks"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("sa-worker-{i}"))
        .build()
        .map_err(|e| ScreenError::Pool(e.to_string()))?;

    let outcomes: Vec<std::thread::Result<ChunkOutcome<T>>> = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| catch_unwind(AssertUnwindSafe(|| process_chunk(chunk, &eval))))
            .collect()
    });

    let mut results = Vec::new();
    let mut tally = RejectTally::default();
    let mut failed_chunks = Vec::new();
    for (idx, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(part) => {
                results.extend(part.results);
                tally.merge(&part.tally);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                if !tolerate_failures {
                    return Err(ScreenError::WorkerFailed { chunk: idx, message });
                }
                warn!(chunk = idx, pairs = chunks[idx].len(), %message, "dropping failed chunk");
                failed_chunks.push(idx);
            }
        }
    }

    Ok(Scheduled {
        results,
        tally,
        workers,
        failed_chunks,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
