//! Configuration management for temperature sweeps
//!
//! This module handles the YAML campaign description, its defaults and
//! validation, and turns it into ready-to-run simulations.

mod args;

pub use args::Args;

use ising_sim::{Algorithm, FieldMode, PartitionStrategy, RunMode, Simulation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A sweep campaign: one temperature sweep per lattice size
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SweepConfig {
    /// Lattice side lengths, simulated in order
    pub lattice_sizes: Vec<usize>,
    /// Number of distinct temperatures
    pub num_temps: usize,
    /// First temperature (inclusive)
    pub temp_start: f64,
    /// Last temperature (inclusive)
    pub temp_end: f64,
    /// Measurements per temperature
    pub num_iterations: usize,
    /// Re-randomize the lattice every this many measurements (default: never)
    pub shuffle_again_after: Option<usize>,
    pub thermalize_sweeps: Option<usize>,
    pub sweeps_per_iteration: Option<usize>,
    pub algorithm: Option<Algorithm>,
    /// Coupling constant J
    pub coupling: Option<f64>,
    /// External field h
    pub field: Option<f64>,
    pub field_mode: Option<FieldMode>,
    pub seed: Option<u64>,
    pub run_mode: Option<RunMode>,
    pub max_threads: Option<usize>,
    pub partition: Option<PartitionStrategy>,
    /// Sequential status line every this many measurements
    pub status_interval: Option<usize>,
    /// Parallel status line every this many seconds
    pub status_period_secs: Option<u64>,
    /// Path of the results table
    pub output: Option<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            lattice_sizes: vec![16],
            num_temps: 8,
            temp_start: 2.0,
            temp_end: 2.6,
            num_iterations: 1000,
            shuffle_again_after: Some(usize::MAX),
            thermalize_sweeps: Some(10),
            sweeps_per_iteration: Some(1),
            algorithm: Some(Algorithm::Wolff),
            coupling: Some(1.0),
            field: Some(0.0),
            field_mode: Some(FieldMode::Ignored),
            seed: None,
            run_mode: Some(RunMode::Parallel),
            max_threads: None,
            partition: Some(PartitionStrategy::Balanced),
            status_interval: Some(10_000),
            status_period_secs: Some(20),
            output: Some("IsingResults.tsv".to_string()),
        }
    }
}

impl SweepConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config = serde_yml::from_str::<SweepConfig>(&content)?.with_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.shuffle_again_after.is_none() {
            self.shuffle_again_after = defaults.shuffle_again_after;
        }
        if self.thermalize_sweeps.is_none() {
            self.thermalize_sweeps = defaults.thermalize_sweeps;
        }
        if self.sweeps_per_iteration.is_none() {
            self.sweeps_per_iteration = defaults.sweeps_per_iteration;
        }
        if self.algorithm.is_none() {
            self.algorithm = defaults.algorithm;
        }
        if self.coupling.is_none() {
            self.coupling = defaults.coupling;
        }
        if self.field.is_none() {
            self.field = defaults.field;
        }
        if self.field_mode.is_none() {
            self.field_mode = defaults.field_mode;
        }
        if self.run_mode.is_none() {
            self.run_mode = defaults.run_mode;
        }
        if self.partition.is_none() {
            self.partition = defaults.partition;
        }
        if self.status_interval.is_none() {
            self.status_interval = defaults.status_interval;
        }
        if self.status_period_secs.is_none() {
            self.status_period_secs = defaults.status_period_secs;
        }
        if self.output.is_none() {
            self.output = defaults.output;
        }
        self
    }

    /// Apply command-line overrides
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(algorithm) = args.algorithm {
            self.algorithm = Some(algorithm);
        }
        if let Some(threads) = args.threads {
            self.max_threads = Some(threads);
        }
        if let Some(seed) = args.seed {
            self.seed = Some(seed);
        }
        if let Some(ref output) = args.output {
            self.output = Some(output.clone());
        }
        if args.sequential {
            self.run_mode = Some(RunMode::Sequential);
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.lattice_sizes.is_empty() {
            return Err("At least one lattice size is required".to_string());
        }
        if self.lattice_sizes.contains(&0) {
            return Err("Lattice sizes must be positive".to_string());
        }
        if self.num_temps < 2 {
            return Err("At least 2 temperatures are required".to_string());
        }
        if !self.temp_start.is_finite() || !self.temp_end.is_finite() {
            return Err("Temperatures must be finite".to_string());
        }
        if self.temp_start < 0.0 || self.temp_end < 0.0 {
            return Err("Temperatures must not be negative".to_string());
        }
        if self.num_iterations == 0 {
            return Err("Iterations per temperature must be positive".to_string());
        }
        if self.shuffle_again_after == Some(0) {
            return Err("Re-randomization interval must be positive".to_string());
        }
        if self.sweeps_per_iteration == Some(0) {
            return Err("Sweeps per iteration must be positive".to_string());
        }
        if self.max_threads == Some(0) {
            return Err("Maximum thread count must be positive".to_string());
        }
        if self.status_interval == Some(0) {
            return Err("Status interval must be positive".to_string());
        }
        if let Some(coupling) = self.coupling {
            if !coupling.is_finite() {
                return Err("Coupling constant must be finite".to_string());
            }
        }
        if let Some(field) = self.field {
            if !field.is_finite() {
                return Err("External field must be finite".to_string());
            }
            let field_active = field != 0.0 && self.field_mode == Some(FieldMode::PerNeighbor);
            let algorithm = self.algorithm.unwrap_or_default();
            if field_active && !algorithm.supports_field() {
                return Err(format!(
                    "Algorithm '{}' cannot sample a non-zero external field; use metropolis or heat_bath",
                    algorithm
                ));
            }
        }
        Ok(())
    }

    /// Build the simulation for one lattice size
    pub fn build_simulation(&self, size: usize) -> ising_sim::Result<Simulation> {
        let defaults = Self::default();
        let mut sim = Simulation::new(
            size,
            self.num_temps,
            self.temp_start,
            self.temp_end,
            self.num_iterations,
            self.shuffle_again_after.or(defaults.shuffle_again_after).unwrap_or(usize::MAX),
        )?;

        if let Some(sweeps) = self.thermalize_sweeps {
            sim.thermalize_sweeps = sweeps;
        }
        if let Some(sweeps) = self.sweeps_per_iteration {
            sim.sweeps_per_iteration = sweeps;
        }
        if let Some(algorithm) = self.algorithm {
            sim.algorithm = algorithm;
        }
        if let Some(coupling) = self.coupling {
            sim.coupling = coupling;
        }
        if let Some(field) = self.field {
            sim.magnetic_field = field;
        }
        if let Some(mode) = self.field_mode {
            sim.field_mode = mode;
        }
        if let Some(partition) = self.partition {
            sim.partition_strategy = partition;
        }
        if let Some(interval) = self.status_interval {
            sim.status_interval = interval;
        }
        if let Some(secs) = self.status_period_secs {
            sim.status_period = Duration::from_secs(secs);
        }
        sim.seed = self.seed;
        sim.max_threads = self.max_threads;
        Ok(sim)
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const MINIMAL_YAML: &str = "
lattice_sizes: [4, 8]
num_temps: 4
temp_start: 2.0
temp_end: 2.6
num_iterations: 10
";

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = serde_yml::from_str::<SweepConfig>(MINIMAL_YAML)
            .unwrap()
            .with_defaults();
        assert!(config.validate().is_ok());
        assert_eq!(config.lattice_sizes, vec![4, 8]);
        assert_eq!(config.algorithm, Some(Algorithm::Wolff));
        assert_eq!(config.shuffle_again_after, Some(usize::MAX));
        assert_eq!(config.thermalize_sweeps, Some(10));
        assert_eq!(config.run_mode(), RunMode::Parallel);
        assert_eq!(config.partition, Some(PartitionStrategy::Balanced));
    }

    #[test]
    fn test_enum_values_parse_from_yaml() {
        let yaml = format!(
            "{MINIMAL_YAML}algorithm: heat_bath_random\nfield_mode: per_neighbor\nrun_mode: sequential\npartition: remainder_to_last\n"
        );
        let config = serde_yml::from_str::<SweepConfig>(&yaml).unwrap();
        assert_eq!(config.algorithm, Some(Algorithm::HeatBathRandom));
        assert_eq!(config.field_mode, Some(FieldMode::PerNeighbor));
        assert_eq!(config.run_mode(), RunMode::Sequential);
        assert_eq!(config.partition, Some(PartitionStrategy::RemainderToLast));
    }

    #[test]
    fn test_config_validation() {
        let mut config = SweepConfig::default();
        assert!(config.validate().is_ok());

        config.num_temps = 1;
        assert!(config.validate().is_err());
        config.num_temps = 8; // Reset

        config.shuffle_again_after = Some(0);
        assert!(config.validate().is_err());
        config.shuffle_again_after = None;

        config.lattice_sizes = vec![16, 0];
        assert!(config.validate().is_err());
        config.lattice_sizes = vec![];
        assert!(config.validate().is_err());
        config.lattice_sizes = vec![16];

        config.temp_end = f64::INFINITY;
        assert!(config.validate().is_err());
        config.temp_end = 2.6;

        config.num_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_field_requires_field_aware_algorithm() {
        let mut config = SweepConfig::default();
        config.field = Some(0.5);
        config.field_mode = Some(FieldMode::PerNeighbor);
        config.algorithm = Some(Algorithm::Wolff);
        assert!(config.validate().is_err());

        config.algorithm = None; // Defaults to Wolff
        assert!(config.validate().is_err());

        config.algorithm = Some(Algorithm::HeatBath);
        assert!(config.validate().is_ok());

        // An ignored or zero field leaves Wolff valid
        config.algorithm = Some(Algorithm::Wolff);
        config.field_mode = Some(FieldMode::Ignored);
        assert!(config.validate().is_ok());
        config.field_mode = Some(FieldMode::PerNeighbor);
        config.field = Some(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_simulation() {
        let mut config = SweepConfig::default();
        config.thermalize_sweeps = Some(50);
        config.sweeps_per_iteration = Some(5);
        config.algorithm = Some(Algorithm::Metropolis);
        config.seed = Some(9);

        let sim = config.build_simulation(32).unwrap();
        assert_eq!(sim.size(), 32);
        assert_eq!(sim.num_temps(), 8);
        assert_eq!(sim.temps().len(), 8000);
        assert_eq!(sim.thermalize_sweeps, 50);
        assert_eq!(sim.sweeps_per_iteration, 5);
        assert_eq!(sim.algorithm, Algorithm::Metropolis);
        assert_eq!(sim.seed, Some(9));
        assert_eq!(sim.shuffle_again_after(), usize::MAX);
    }

    #[test]
    fn test_apply_args() {
        let mut config = SweepConfig::default();
        let args = Args {
            config_file: "config.yaml".to_string(),
            algorithm: Some(Algorithm::HeatBath),
            threads: Some(3),
            seed: Some(1),
            output: Some("out.tsv".to_string()),
            log: None,
            sequential: true,
        };
        config.apply_args(&args);
        assert_eq!(config.algorithm, Some(Algorithm::HeatBath));
        assert_eq!(config.max_threads, Some(3));
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.output.as_deref(), Some("out.tsv"));
        assert_eq!(config.run_mode(), RunMode::Sequential);
    }

    #[test]
    fn test_file_io() {
        let config = SweepConfig::default();

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), serde_yml::to_string(&config).unwrap()).unwrap();

        let loaded = SweepConfig::from_file(temp_file.path()).unwrap();
        assert!(loaded.validate().is_ok());
        assert_eq!(loaded.lattice_sizes, config.lattice_sizes);
        assert_eq!(loaded.num_iterations, config.num_iterations);
    }
}
