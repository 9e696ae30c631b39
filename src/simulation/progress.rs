use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared, lock-free progress of one simulation
///
/// Cloning yields another handle to the same counters, which lets a parent
/// observe its partitions while they run on worker threads.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    inner: Arc<ProgressState>,
}

#[derive(Debug, Default)]
struct ProgressState {
    completed: AtomicUsize,
    running: AtomicBool,
    done: AtomicBool,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of schedule entries measured so far
    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// Whether the simulation is currently sweeping
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Relaxed)
    }

    /// Whether the simulation stopped, successfully or not
    pub fn is_done(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    /// Reset the counters for a new attempt and mark the simulation running
    pub(crate) fn start(&self) {
        self.inner.completed.store(0, Ordering::Relaxed);
        self.inner.done.store(false, Ordering::Release);
        self.inner.running.store(true, Ordering::Relaxed);
    }

    pub(crate) fn advance(&self) {
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_completed(&self, completed: usize) {
        self.inner.completed.store(completed, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self) {
        self.inner.running.store(false, Ordering::Relaxed);
        self.inner.done.store(true, Ordering::Release);
    }

    /// Guard that marks the counter done when dropped, including during unwinding
    pub(crate) fn finish_on_drop(&self) -> FinishGuard {
        FinishGuard(self.clone())
    }
}

pub(crate) struct FinishGuard(ProgressCounter);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// One status line of a running sweep
#[derive(Debug, Clone, Copy)]
pub struct Status {
    pub size: usize,
    /// Index of the schedule entry being processed
    pub index: usize,
    pub total: usize,
    pub temperature: f64,
    pub working_threads: usize,
    pub threads: usize,
}

impl Status {
    pub fn percent(&self) -> f64 {
        if self.total <= 1 {
            return 100.0;
        }
        self.index as f64 * 100.0 / (self.total - 1) as f64
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total.to_string().len();
        write!(
            f,
            " | N={:<5} | run:{:>width$}/{:<width$} | T={:<6.3} | {:>6.2}% | threads: {:>3}/{:<3} |",
            self.size,
            self.index + 1,
            self.total,
            self.temperature,
            self.percent(),
            self.working_threads,
            self.threads,
        )
    }
}
