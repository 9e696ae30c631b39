//! Command-line argument parsing for temperature sweeps

use clap::Parser;
use ising_sim::Algorithm;

/// 2D Ising temperature sweep with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override the update algorithm (metropolis, heat_bath, heat_bath_random, wolff)
    #[arg(long)]
    pub algorithm: Option<Algorithm>,

    /// Override the maximum number of worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Override the lattice seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the results table path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write log output to this file instead of stdout
    #[arg(long)]
    pub log: Option<String>,

    /// Run every lattice size on the calling thread only
    #[arg(long)]
    pub sequential: bool,
}
