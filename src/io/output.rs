//! Output formatting and logging utilities

use ising_sim::ising::analysis::critical_temperature_2d;
use ising_sim::Simulation;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Digits after the decimal point in the results table
const PRECISION: usize = 10;

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Route log output to a file, or to stdout when no path is given
pub fn setup_output(log_path: Option<&String>) {
    match log_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_thread_names(true)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Log will be written to: {}", path);
            }
            Err(e) => eprintln!("Could not create log file {}: {}", path, e),
        },
        None => {
            let stdout_layer = layer()
                .with_writer(io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
        }
    }
}

/// Write the measured series of every simulation as one tab-separated table
///
/// All simulations are expected to share `num_temps` and `num_iterations`;
/// they appear in the given order, each contributing one row per schedule
/// entry. Susceptibility and heat capacity are written as 0 and left to
/// post-processing.
pub fn write_results<W: Write>(
    writer: &mut W,
    num_temps: usize,
    num_iterations: usize,
    sims: &[Simulation],
) -> io::Result<()> {
    writeln!(writer, "numOfTemps:\t{}", num_temps)?;
    writeln!(writer, "numOfIterations:\t{}", num_iterations)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "N\ttemp\tmagnetization\tenergy\tsusceptibility\theatCapacity"
    )?;

    for sim in sims {
        let rows = sim
            .temps()
            .iter()
            .zip(sim.magnetizations())
            .zip(sim.energies());
        for ((temp, magnetization), energy) in rows {
            writeln!(
                writer,
                "{}\t{:.p$}\t{:.p$}\t{:.p$}\t{:.p$}\t{:.p$}",
                sim.size(),
                temp,
                magnetization,
                energy,
                0.0,
                0.0,
                p = PRECISION
            )?;
        }
    }
    writer.flush()
}

/// Log the per-temperature statistics of a finished simulation
pub fn report_summary(sim: &Simulation) {
    let tc = critical_temperature_2d();
    info!("");
    info!("Summary for N={} (exact T_c = {:.4})", sim.size(), tc);
    info!(
        "  {:>8} {:>10} {:>10} {:>12} {:>12}",
        "T", "<e>", "<|m|>", "chi", "C"
    );
    for block in sim.summarize() {
        let marker = if block.temperature < tc { "<" } else { " " };
        info!(
            "{} {:>8.4} {:>10.6} {:>10.6} {:>12.6} {:>12.6}",
            marker,
            block.temperature,
            block.mean_energy,
            block.mean_abs_magnetization,
            block.susceptibility,
            block.heat_capacity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ising_sim::RunMode;
    use std::fs;
    use tempfile::NamedTempFile;

    fn finished(size: usize) -> Simulation {
        let mut sim = Simulation::new(size, 3, 1.0, 2.0, 2, 2).unwrap();
        sim.print_status = false;
        sim.seed = Some(3);
        sim.run(RunMode::Sequential).unwrap();
        sim
    }

    #[test]
    fn test_results_table_layout() {
        let sims = vec![finished(4), finished(6)];
        let mut buffer = Vec::new();
        write_results(&mut buffer, 3, 2, &sims).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "numOfTemps:\t3");
        assert_eq!(lines[1], "numOfIterations:\t2");
        assert_eq!(lines[2], "");
        assert_eq!(
            lines[3],
            "N\ttemp\tmagnetization\tenergy\tsusceptibility\theatCapacity"
        );
        assert_eq!(lines.len(), 4 + 6 + 6);

        let first: Vec<&str> = lines[4].split('\t').collect();
        assert_eq!(first.len(), 6);
        assert_eq!(first[0], "4");
        assert_eq!(first[1], "1.0000000000");
        assert_eq!(first[4], "0.0000000000");
        assert_eq!(first[5], "0.0000000000");

        let last: Vec<&str> = lines[15].split('\t').collect();
        assert_eq!(last[0], "6");
        assert_eq!(last[1], "2.0000000000");
    }

    #[test]
    fn test_results_match_series() {
        let sim = finished(5);
        let mut buffer = Vec::new();
        write_results(&mut buffer, 3, 2, std::slice::from_ref(&sim)).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        for (line, (&m, &e)) in text
            .lines()
            .skip(4)
            .zip(sim.magnetizations().iter().zip(sim.energies()))
        {
            let fields: Vec<f64> = line.split('\t').map(|f| f.parse().unwrap()).collect();
            assert!((fields[2] - m).abs() < 1e-9);
            assert!((fields[3] - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_results_to_file() {
        let sims = vec![finished(4)];
        let temp_file = NamedTempFile::new().unwrap();
        {
            let mut file = File::create(temp_file.path()).unwrap();
            write_results(&mut file, 3, 2, &sims).unwrap();
        }
        let content = fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.starts_with("numOfTemps:\t3\n"));
        assert_eq!(content.lines().count(), 10);
    }
}
