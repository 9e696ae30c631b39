//! Temperature sweep orchestration
//!
//! A [`Simulation`] owns one lattice, a [`TemperatureSchedule`] and the energy
//! and magnetization series measured along it. It runs either sequentially on
//! the calling thread or split into independent partitions over contiguous
//! temperature ranges, one worker thread each, whose series are concatenated
//! in temperature order afterwards.

mod partition;
mod progress;
mod schedule;

pub use partition::{partition_levels, worker_count, PartitionStrategy};
pub use progress::{ProgressCounter, Status};
pub use schedule::TemperatureSchedule;

use crate::error::{Result, SimulationError};
use crate::ising::analysis::{self, BlockSummary};
use crate::ising::{Algorithm, FieldMode, SpinLattice};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the orchestrating thread polls partition progress
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Schedule computed, no measurements yet
    Constructed,
    Running,
    /// All measurements taken; running again is rejected
    Finished,
}

/// Where the sweep is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Sequential,
    #[default]
    Parallel,
}

/// Monte Carlo sweep of a square Ising lattice over a temperature range
#[derive(Debug)]
pub struct Simulation {
    size: usize,
    schedule: TemperatureSchedule,
    shuffle_again_after: usize,
    /// Sweeps run after each re-randomization, before measuring
    pub thermalize_sweeps: usize,
    /// Sweeps between two consecutive measurements
    pub sweeps_per_iteration: usize,
    pub algorithm: Algorithm,
    pub coupling: f64,
    pub magnetic_field: f64,
    pub field_mode: FieldMode,
    /// Lattice seed; partition `i` of a parallel run uses `seed + i`
    pub seed: Option<u64>,
    /// Log status lines while running
    pub print_status: bool,
    /// A sequential run logs its status every `status_interval` measurements
    pub status_interval: usize,
    /// A parallel run logs the aggregated status this often
    pub status_period: Duration,
    pub partition_strategy: PartitionStrategy,
    /// Upper bound on worker threads; hardware parallelism when `None`
    pub max_threads: Option<usize>,
    lattice: Option<SpinLattice>,
    energies: Vec<f64>,
    magnetizations: Vec<f64>,
    progress: ProgressCounter,
    state: SimulationState,
}

impl Simulation {
    /// Set up a sweep of a `size`×`size` lattice over `num_temps` temperatures
    /// linearly spaced in `[temp_start, temp_end]`, measuring `num_iterations`
    /// times per temperature.
    ///
    /// The lattice is re-randomized and re-thermalized before every
    /// `shuffle_again_after`-th measurement; pass `usize::MAX` to keep evolving
    /// the same ensemble for the whole sweep.
    pub fn new(
        size: usize,
        num_temps: usize,
        temp_start: f64,
        temp_end: f64,
        num_iterations: usize,
        shuffle_again_after: usize,
    ) -> Result<Self> {
        if size == 0 {
            return Err(SimulationError::InvalidConfig(
                "lattice size must be positive".to_string(),
            ));
        }
        if shuffle_again_after == 0 {
            return Err(SimulationError::InvalidConfig(
                "re-randomization interval must be positive".to_string(),
            ));
        }
        let schedule = TemperatureSchedule::linear(num_temps, temp_start, temp_end, num_iterations)?;
        Ok(Self::from_schedule(size, schedule, shuffle_again_after))
    }

    fn from_schedule(size: usize, schedule: TemperatureSchedule, shuffle_again_after: usize) -> Self {
        let capacity = schedule.len();
        Self {
            size,
            schedule,
            shuffle_again_after,
            thermalize_sweeps: 10,
            sweeps_per_iteration: 1,
            algorithm: Algorithm::default(),
            coupling: 1.0,
            magnetic_field: 0.0,
            field_mode: FieldMode::default(),
            seed: None,
            print_status: true,
            status_interval: 10_000,
            status_period: Duration::from_secs(20),
            partition_strategy: PartitionStrategy::default(),
            max_threads: None,
            lattice: None,
            energies: Vec::with_capacity(capacity),
            magnetizations: Vec::with_capacity(capacity),
            progress: ProgressCounter::new(),
            state: SimulationState::Constructed,
        }
    }

    /// Side length of the simulated lattice
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn schedule(&self) -> &TemperatureSchedule {
        &self.schedule
    }

    /// Temperature of every measurement
    pub fn temps(&self) -> &[f64] {
        self.schedule.temps()
    }

    /// Normalized energies measured so far; complete once the simulation is finished
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Magnetizations measured so far; complete once the simulation is finished
    pub fn magnetizations(&self) -> &[f64] {
        &self.magnetizations
    }

    pub fn num_temps(&self) -> usize {
        self.schedule.num_temps()
    }

    pub fn num_iterations(&self) -> usize {
        self.schedule.num_iterations()
    }

    pub fn temp_start(&self) -> f64 {
        self.schedule.start()
    }

    pub fn temp_end(&self) -> f64 {
        self.schedule.end()
    }

    pub fn shuffle_again_after(&self) -> usize {
        self.shuffle_again_after
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SimulationState::Finished
    }

    /// Lattice of the last sequential run; `None` before running and for parallel runs
    pub fn lattice(&self) -> Option<&SpinLattice> {
        self.lattice.as_ref()
    }

    /// Handle to the live progress counters of this simulation
    pub fn progress(&self) -> &ProgressCounter {
        &self.progress
    }

    /// Per-temperature statistics of the measured series
    pub fn summarize(&self) -> Vec<BlockSummary> {
        analysis::summarize_blocks(
            self.size,
            self.num_iterations(),
            self.temps(),
            &self.energies,
            &self.magnetizations,
        )
    }

    /// Run in the given mode
    pub fn run(&mut self, mode: RunMode) -> Result<()> {
        match mode {
            RunMode::Sequential => self.run_sequential(),
            RunMode::Parallel => self.run_parallel(),
        }
    }

    fn ensure_not_finished(&self) -> Result<()> {
        if self.is_finished() {
            return Err(SimulationError::AlreadyFinished);
        }
        Ok(())
    }

    /// Reject settings whose algorithm cannot sample the configured Hamiltonian
    pub fn validate_settings(&self) -> Result<()> {
        let field_active = self.field_mode == FieldMode::PerNeighbor && self.magnetic_field != 0.0;
        if field_active && !self.algorithm.supports_field() {
            return Err(SimulationError::InvalidConfig(format!(
                "{} updates cannot sample a non-zero external field (h = {})",
                self.algorithm, self.magnetic_field
            )));
        }
        Ok(())
    }

    fn build_lattice(&self) -> SpinLattice {
        let mut lattice = match self.seed {
            Some(seed) => SpinLattice::with_seed(self.size, seed),
            None => SpinLattice::new(self.size),
        };
        lattice.set_coupling(self.coupling);
        lattice.set_magnetic_field(self.magnetic_field, self.field_mode);
        lattice
    }

    /// Measure every schedule entry in order on the calling thread
    pub fn run_sequential(&mut self) -> Result<()> {
        self.ensure_not_finished()?;
        self.validate_settings()?;
        self.state = SimulationState::Running;
        self.progress.start();

        let mut lattice = match self.lattice.take() {
            Some(lattice) => lattice,
            None => self.build_lattice(),
        };
        let total = self.schedule.len();
        let num_iterations = self.schedule.num_iterations();
        let status_interval = self.status_interval.max(1);

        for (i, &temperature) in self.schedule.temps().iter().enumerate() {
            // Restart from a fresh, decorrelated ensemble
            if i % self.shuffle_again_after == 0 {
                lattice.init_random();
                self.algorithm
                    .sweeps(&mut lattice, temperature, self.thermalize_sweeps);
                debug!(
                    "N={}: re-randomized and thermalized at T={:.4} ({} sweeps)",
                    self.size, temperature, self.thermalize_sweeps
                );
            }
            if self.print_status && i % status_interval == 0 {
                let status = Status {
                    size: self.size,
                    index: i,
                    total,
                    temperature,
                    working_threads: 1,
                    threads: 1,
                };
                info!("{}", status);
            }

            self.algorithm
                .sweeps(&mut lattice, temperature, self.sweeps_per_iteration);
            let magnetization = lattice.magnetization();
            debug_assert!((-1.0..=1.0).contains(&magnetization));
            self.energies.push(lattice.total_energy());
            self.magnetizations.push(magnetization);
            self.progress.advance();

            if (i + 1) % num_iterations == 0 {
                debug!(
                    "N={}: done T={:.4}, {} temperatures remaining",
                    self.size,
                    temperature,
                    (total - i - 1) / num_iterations
                );
            }
        }

        self.lattice = Some(lattice);
        self.state = SimulationState::Finished;
        self.progress.finish();
        Ok(())
    }

    /// Independent sub-simulation over the temperature levels in `levels`
    fn partition(&self, index: usize, levels: Range<usize>) -> Result<Simulation> {
        let schedule = self.schedule.blocks(levels)?;
        let mut sub = Simulation::from_schedule(self.size, schedule, self.shuffle_again_after);
        sub.thermalize_sweeps = self.thermalize_sweeps;
        sub.sweeps_per_iteration = self.sweeps_per_iteration;
        sub.algorithm = self.algorithm;
        sub.coupling = self.coupling;
        sub.magnetic_field = self.magnetic_field;
        sub.field_mode = self.field_mode;
        sub.seed = self.seed.map(|seed| seed.wrapping_add(index as u64));
        sub.print_status = false;
        Ok(sub)
    }

    /// Split the temperature range across worker threads and merge the results
    ///
    /// Every partition owns its lattice, schedule and series and runs
    /// sequentially and validates its own settings; the calling thread only
    /// reports aggregated progress. The merged series follow the schedule order
    /// regardless of which partition finishes first. If any partition fails,
    /// the first failure is returned as [`SimulationError::Partition`] and this
    /// simulation goes back to [`SimulationState::Constructed`] without
    /// measurements.
    pub fn run_parallel(&mut self) -> Result<()> {
        self.ensure_not_finished()?;

        let workers = worker_count(self.num_temps(), self.max_threads);
        let ranges = partition_levels(self.num_temps(), workers, self.partition_strategy);
        info!("{} threads will be used for calculation", workers);

        let mut partitions = ranges
            .into_iter()
            .enumerate()
            .map(|(index, levels)| self.partition(index, levels))
            .collect::<Result<Vec<_>>>()?;
        for (index, sub) in partitions.iter().enumerate() {
            debug!(
                "partition {}: T={:.4}..={:.4}, {} temperatures, {} measurements",
                index,
                sub.temp_start(),
                sub.temp_end(),
                sub.num_temps(),
                sub.schedule.len()
            );
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ising-worker-{i}"))
            .build()
            .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;

        let counters: Vec<ProgressCounter> =
            partitions.iter().map(|sub| sub.progress.clone()).collect();
        let mut outcomes: Vec<Result<()>> = partitions.iter().map(|_| Ok(())).collect();

        self.state = SimulationState::Running;
        self.progress.start();

        let this = &*self;
        pool.in_place_scope(|scope| {
            for (sub, outcome) in partitions.iter_mut().zip(outcomes.iter_mut()) {
                scope.spawn(move |_| {
                    let _done = sub.progress.finish_on_drop();
                    *outcome = sub.run_sequential();
                });
            }
            this.monitor(&counters, workers);
        });

        let mut failures = outcomes
            .into_iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.err().map(|e| (index, e)));
        if let Some((index, source)) = failures.next() {
            for (other, err) in failures {
                warn!("partition {} failed as well: {}", other, err);
            }
            self.state = SimulationState::Constructed;
            self.progress.finish();
            return Err(SimulationError::Partition {
                index,
                source: Box::new(source),
            });
        }

        for sub in &partitions {
            self.energies.extend_from_slice(&sub.energies);
            self.magnetizations.extend_from_slice(&sub.magnetizations);
        }
        debug_assert_eq!(self.energies.len(), self.schedule.len());
        debug_assert_eq!(self.magnetizations.len(), self.schedule.len());

        self.progress.set_completed(self.schedule.len());
        self.progress.finish();
        self.state = SimulationState::Finished;
        info!("N={}: {} measurements merged from {} partitions", self.size, self.energies.len(), workers);
        Ok(())
    }

    /// Poll partition progress until every partition is done
    fn monitor(&self, counters: &[ProgressCounter], threads: usize) {
        if self.print_status {
            info!("{}", self.aggregate_status(counters, threads));
        }
        let mut last_report = Instant::now();

        while !counters.iter().all(ProgressCounter::is_done) {
            self.progress
                .set_completed(counters.iter().map(ProgressCounter::completed).sum());
            if self.print_status && last_report.elapsed() >= self.status_period {
                info!("{}", self.aggregate_status(counters, threads));
                last_report = Instant::now();
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn aggregate_status(&self, counters: &[ProgressCounter], threads: usize) -> Status {
        let total = self.schedule.len();
        let completed: usize = counters.iter().map(ProgressCounter::completed).sum();
        let index = completed.min(total.saturating_sub(1));
        Status {
            size: self.size,
            index,
            total,
            temperature: self.schedule.temps()[index],
            working_threads: counters.iter().filter(|c| c.is_running()).count(),
            threads,
        }
    }
}
