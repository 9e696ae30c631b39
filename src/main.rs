//! Ising Temperature Sweep Command-Line Interface
//!
//! Runs one Monte Carlo temperature sweep per configured lattice size and
//! writes all measurements to a single tab-separated table.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use ising_sim::{Simulation, SimulationError};
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;
use tracing::{info, warn};

mod config;
mod io;

use config::{Args, SweepConfig};
use io::{report_summary, setup_output, write_results};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_output(args.log.as_ref());

    info!("Reading configuration from: {}", args.config_file);
    let mut config = SweepConfig::from_file(&args.config_file)
        .map_err(|e| eyre!("{}", e))
        .wrap_err_with(|| format!("Unable to load configuration file: {}", args.config_file))?;
    config.apply_args(&args);
    config
        .validate()
        .map_err(|e| eyre!(e))
        .wrap_err("Invalid configuration after command-line overrides")?;
    info!("Configuration loaded:\n{:?}", config);

    let sims = run_sweeps(&config)?;

    for sim in &sims {
        report_summary(sim);
    }

    let output = config
        .output
        .clone()
        .unwrap_or_else(|| "IsingResults.tsv".to_string());
    let file = File::create(&output)
        .wrap_err_with(|| format!("Unable to create results file: {}", output))?;
    let mut writer = BufWriter::new(file);
    write_results(&mut writer, config.num_temps, config.num_iterations, &sims)
        .wrap_err_with(|| format!("Failed to write results to: {}", output))?;
    info!("Results written to: {}", output);

    Ok(())
}

/// Run the configured sweep for every lattice size in turn
fn run_sweeps(config: &SweepConfig) -> Result<Vec<Simulation>> {
    let mode = config.run_mode();
    let mut sims = Vec::with_capacity(config.lattice_sizes.len());

    for &size in &config.lattice_sizes {
        let mut sim = config
            .build_simulation(size)
            .wrap_err_with(|| format!("Unable to set up simulation for N={}", size))?;

        info!(
            "Starting {:?} sweep: N={}, {} temperatures in [{}, {}], {} iterations each, {} updates",
            mode,
            size,
            sim.num_temps(),
            sim.temp_start(),
            sim.temp_end(),
            sim.num_iterations(),
            sim.algorithm
        );
        let started = Instant::now();
        match sim.run(mode) {
            Ok(()) => {}
            Err(SimulationError::AlreadyFinished) => {
                warn!("Simulation for N={} was already finished; keeping its results", size);
            }
            Err(e) => return Err(e).wrap_err_with(|| format!("Sweep failed for N={}", size)),
        }
        info!(
            "N={} finished in {:.1} s",
            size,
            started.elapsed().as_secs_f64()
        );
        sims.push(sim);
    }

    Ok(sims)
}
