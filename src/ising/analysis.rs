//! Utility functions for analyzing temperature sweep results

/// Critical temperature for the 2D Ising model (exact result)
/// T_c = 2J / (k_B * ln(1 + √2)) ≈ 2.269 J/k_B
pub fn critical_temperature_2d() -> f64 {
    2.0 / (1.0 + 2.0_f64.sqrt()).ln()
}

/// Arithmetic mean, 0 for an empty sample
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population variance, 0 for fewer than two samples
pub fn variance(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    samples.iter().map(|s| (s - m) * (s - m)).sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation (n - 1 in the denominator)
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let sum_sq: f64 = samples.iter().map(|s| (s - m) * (s - m)).sum();
    (sum_sq / (samples.len() - 1) as f64).sqrt()
}

/// Autocorrelation function of a time series for lags `0..n/2`
///
/// Each lag is normalized by the variance sum over the same overlap window,
/// so lag 0 is always 1 for a non-constant series. A constant series yields
/// zeros.
pub fn autocorrelation(samples: &[f64]) -> Vec<f64> {
    let m = mean(samples);
    let n = samples.len();

    (0..n / 2)
        .map(|lag| {
            let mut numerator = 0.0;
            let mut denominator = 0.0;
            for i in 0..n - lag {
                let xi = samples[i] - m;
                numerator += xi * (samples[i + lag] - m);
                denominator += xi * xi;
            }
            if denominator == 0.0 {
                0.0
            } else {
                numerator / denominator
            }
        })
        .collect()
}

/// Statistics over all measurements taken at one temperature
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummary {
    pub temperature: f64,
    /// Mean normalized energy in [0, 1]
    pub mean_energy: f64,
    /// Mean absolute magnetization per site
    pub mean_abs_magnetization: f64,
    /// Magnetic susceptibility per site, `N² * var(|m|) / T`
    pub susceptibility: f64,
    /// Heat capacity per site, `N² * var(u) / T²` with `u` the physical energy per site
    pub heat_capacity: f64,
}

/// Summarize observable series block by block
///
/// `temps`, `energies` and `magnetizations` must be indexed like a temperature
/// schedule whose blocks are `block_len` entries long. Only complete blocks are
/// summarized, so a partial prefix of a running sweep is accepted.
pub fn summarize_blocks(
    size: usize,
    block_len: usize,
    temps: &[f64],
    energies: &[f64],
    magnetizations: &[f64],
) -> Vec<BlockSummary> {
    if block_len == 0 {
        return Vec::new();
    }
    let num_sites = (size * size) as f64;
    let measured = energies.len().min(magnetizations.len()).min(temps.len());

    (0..measured / block_len)
        .map(|block| {
            let range = block * block_len..(block + 1) * block_len;
            let temperature = temps[range.start];

            // The normalized energy e relates to the physical energy per site by u = 4 (e - 0.5)
            let per_site: Vec<f64> = energies[range.clone()]
                .iter()
                .map(|e| 4.0 * (e - 0.5))
                .collect();
            let abs_mag: Vec<f64> = magnetizations[range.clone()].iter().map(|m| m.abs()).collect();

            let (susceptibility, heat_capacity) = if temperature > 0.0 {
                (
                    num_sites * variance(&abs_mag) / temperature,
                    num_sites * variance(&per_site) / (temperature * temperature),
                )
            } else {
                (0.0, 0.0)
            };

            BlockSummary {
                temperature,
                mean_energy: mean(&energies[range]),
                mean_abs_magnetization: mean(&abs_mag),
                susceptibility,
                heat_capacity,
            }
        })
        .collect()
}
