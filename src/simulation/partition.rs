use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Workers used when the hardware parallelism cannot be queried
const FALLBACK_WORKERS: usize = 2;

/// How temperature levels are split across parallel workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// `num_temps / workers` levels each, the remainder appended to the last worker.
    /// The last worker can carry up to `workers - 1` extra levels.
    RemainderToLast,
    /// Sizes differ by at most one level; the first `num_temps % workers` workers get one extra
    #[default]
    Balanced,
}

/// Number of workers for a sweep over `num_temps` levels
///
/// Uses the available hardware parallelism unless `max_threads` is given, and
/// never exceeds the number of levels so every worker owns at least one.
pub fn worker_count(num_temps: usize, max_threads: Option<usize>) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_WORKERS);
    max_threads.unwrap_or(available).max(1).min(num_temps.max(1))
}

/// Split `0..num_temps` into `workers` contiguous, ordered, non-empty ranges
pub fn partition_levels(
    num_temps: usize,
    workers: usize,
    strategy: PartitionStrategy,
) -> Vec<Range<usize>> {
    let workers = workers.max(1).min(num_temps.max(1));
    let per_worker = num_temps / workers;
    let remainder = num_temps % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let len = match strategy {
            PartitionStrategy::RemainderToLast if i == workers - 1 => per_worker + remainder,
            PartitionStrategy::RemainderToLast => per_worker,
            PartitionStrategy::Balanced => per_worker + usize::from(i < remainder),
        };
        ranges.push(start..start + len);
        start += len;
    }
    debug_assert_eq!(start, num_temps);
    ranges
}
