//! Integration tests for temperature sweeps
//!
//! These run complete sweeps through the public API and check structural
//! guarantees of the measured series plus coarse statistical behavior.

use approx::assert_relative_eq;
use ising_sim::ising::analysis::{critical_temperature_2d, mean};
use ising_sim::{
    Algorithm, FieldMode, PartitionStrategy, RunMode, Simulation, SimulationError, SpinLattice,
};
use serde::Deserialize;
use std::path::PathBuf;

fn sweep(
    size: usize,
    num_temps: usize,
    temp_start: f64,
    temp_end: f64,
    num_iterations: usize,
    shuffle_again_after: usize,
) -> Simulation {
    let mut sim = Simulation::new(
        size,
        num_temps,
        temp_start,
        temp_end,
        num_iterations,
        shuffle_again_after,
    )
    .unwrap();
    sim.print_status = false;
    sim
}

fn check_series(sim: &Simulation, temp_start: f64, temp_end: f64) {
    let total = sim.num_temps() * sim.num_iterations();
    assert!(sim.is_finished());
    assert_eq!(sim.temps().len(), total);
    assert_eq!(sim.energies().len(), total);
    assert_eq!(sim.magnetizations().len(), total);
    assert_eq!(sim.temps()[0], temp_start);
    assert_eq!(sim.temps()[total - 1], temp_end);
    for &e in sim.energies() {
        assert!((0.0..=1.0).contains(&e), "energy {} out of range", e);
    }
    for &m in sim.magnetizations() {
        assert!((-1.0..=1.0).contains(&m), "magnetization {} out of range", m);
    }
}

#[test]
fn test_sequential_and_parallel_sweeps() {
    let mut sequential = sweep(8, 16, 1.0, 4.0, 50, 25);
    sequential.run(RunMode::Sequential).unwrap();
    check_series(&sequential, 1.0, 4.0);
    assert_eq!(sequential.energies().len(), 800);

    let mut parallel = sweep(8, 16, 1.0, 4.0, 50, 25);
    parallel.max_threads = Some(4);
    parallel.run(RunMode::Parallel).unwrap();
    check_series(&parallel, 1.0, 4.0);
    assert_eq!(parallel.energies().len(), 800);

    assert_eq!(sequential.temps(), parallel.temps());
}

#[test]
fn test_parallel_sweep_with_every_algorithm() {
    for algorithm in [
        Algorithm::Metropolis,
        Algorithm::HeatBath,
        Algorithm::HeatBathRandom,
        Algorithm::Wolff,
    ] {
        for strategy in [PartitionStrategy::Balanced, PartitionStrategy::RemainderToLast] {
            let mut sim = sweep(5, 5, 0.5, 5.0, 6, 3);
            sim.algorithm = algorithm;
            sim.partition_strategy = strategy;
            sim.max_threads = Some(2);
            sim.run_parallel().unwrap();
            check_series(&sim, 0.5, 5.0);
        }
    }
}

#[test]
fn test_more_threads_than_temperatures() {
    let mut sim = sweep(4, 2, 1.0, 2.0, 10, 10);
    sim.max_threads = Some(64);
    sim.run_parallel().unwrap();
    check_series(&sim, 1.0, 2.0);
}

#[test]
fn test_finished_simulation_is_idempotent() {
    let mut sim = sweep(6, 4, 1.0, 3.0, 5, 5);
    sim.run(RunMode::Parallel).unwrap();
    let energies = sim.energies().to_vec();

    for mode in [RunMode::Sequential, RunMode::Parallel] {
        assert!(matches!(sim.run(mode), Err(SimulationError::AlreadyFinished)));
    }
    assert_eq!(sim.energies(), energies.as_slice());
}

#[test]
fn test_low_temperature_orders() {
    // Metropolis on a tiny lattice reaches the ground state quickly at T << T_c
    for seed in 0..4 {
        let mut sim = sweep(3, 2, 0.1, 0.2, 1000, usize::MAX);
        sim.algorithm = Algorithm::Metropolis;
        sim.thermalize_sweeps = 100;
        sim.seed = Some(seed);
        sim.run_sequential().unwrap();

        let abs_mag: Vec<f64> = sim.magnetizations().iter().map(|m| m.abs()).collect();
        assert!(mean(&abs_mag) > 0.9, "seed {}: <|m|> = {}", seed, mean(&abs_mag));
        assert!(mean(sim.energies()) < 0.1);
    }
}

#[test]
fn test_high_temperature_disorders() {
    // At T >> T_c nearly every Metropolis proposal is accepted, so each sweep draws fresh fair spins
    let mut sim = sweep(3, 2, 500.0, 1000.0, 1000, usize::MAX);
    sim.algorithm = Algorithm::Metropolis;
    sim.seed = Some(11);
    sim.run_sequential().unwrap();

    let m = mean(sim.magnetizations());
    assert!(m.abs() < 0.1, "<m> = {}", m);

    // For 9 fair spins <|m|> is about 0.27
    let abs_mag: Vec<f64> = sim.magnetizations().iter().map(|m| m.abs()).collect();
    let abs_mean = mean(&abs_mag);
    assert!((0.15..0.4).contains(&abs_mean), "<|m|> = {}", abs_mean);

    // Uncorrelated bonds put the normalized energy near 1/2
    assert!((mean(sim.energies()) - 0.5).abs() < 0.1);
}

#[test]
fn test_summary_brackets_critical_point() {
    let mut sim = sweep(8, 2, 1.0, 5.0, 200, 200);
    sim.seed = Some(5);
    sim.thermalize_sweeps = 50;
    sim.run_sequential().unwrap();

    let blocks = sim.summarize();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].temperature < critical_temperature_2d());
    assert!(blocks[1].temperature > critical_temperature_2d());
    assert!(blocks[0].mean_abs_magnetization > blocks[1].mean_abs_magnetization);
    assert!(blocks[0].mean_energy < blocks[1].mean_energy);
}

#[test]
fn test_field_modes_agree_without_field() {
    let mut lattice = SpinLattice::with_seed(6, 1);
    let ignored = lattice.local_field_energy(2, 3, 1);
    lattice.set_magnetic_field(0.0, FieldMode::PerNeighbor);
    assert_relative_eq!(lattice.local_field_energy(2, 3, 1), ignored);
}

#[derive(Deserialize)]
struct ExampleSweep {
    lattice_sizes: Vec<usize>,
    num_temps: usize,
    temp_start: f64,
    temp_end: f64,
    num_iterations: usize,
    algorithm: Algorithm,
    run_mode: RunMode,
}

fn example_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("example")
        .join(filename)
}

#[test]
fn test_example_configs_parse() {
    for name in ["sweep.yaml", "sequential_metropolis.yaml"] {
        let content = std::fs::read_to_string(example_path(name)).unwrap();
        let example: ExampleSweep = serde_yml::from_str(&content).unwrap();
        assert!(!example.lattice_sizes.is_empty());
        assert!(example.num_temps >= 2);
        assert!(example.num_iterations > 0);
        assert!(example.temp_start < example.temp_end);
        let _ = (example.algorithm, example.run_mode);
    }
}

#[test]
#[ignore] // Full-size sweep, slow in debug builds
fn test_example_sweep_runs() {
    let content = std::fs::read_to_string(example_path("sweep.yaml")).unwrap();
    let example: ExampleSweep = serde_yml::from_str(&content).unwrap();
    for &size in &example.lattice_sizes {
        let mut sim = sweep(
            size,
            example.num_temps,
            example.temp_start,
            example.temp_end,
            example.num_iterations,
            usize::MAX,
        );
        sim.algorithm = example.algorithm;
        sim.run(example.run_mode).unwrap();
        check_series(&sim, example.temp_start, example.temp_end);
    }
}
