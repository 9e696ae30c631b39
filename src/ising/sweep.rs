use super::lattice::SpinLattice;
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Update algorithm used to advance a lattice at a given temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Single-spin Metropolis in raster order
    Metropolis,
    /// Single-spin heat-bath in raster order
    HeatBath,
    /// Single-spin heat-bath on `N²` uniformly chosen sites
    HeatBathRandom,
    /// Single-cluster Wolff flips
    #[default]
    Wolff,
}

impl Algorithm {
    /// Perform one sweep at `temperature`
    pub fn sweep(self, lattice: &mut SpinLattice, temperature: f64) {
        match self {
            Algorithm::Metropolis => metropolis_sweep(lattice, temperature),
            Algorithm::HeatBath => heat_bath_sweep(lattice, temperature),
            Algorithm::HeatBathRandom => heat_bath_random_sweep(lattice, temperature),
            Algorithm::Wolff => {
                wolff_sweep(lattice, temperature);
            }
        }
    }

    /// Perform `sweeps` sweeps at `temperature`
    pub fn sweeps(self, lattice: &mut SpinLattice, temperature: f64, sweeps: usize) {
        for _ in 0..sweeps {
            self.sweep(lattice, temperature);
        }
    }

    /// Whether the algorithm samples the Hamiltonian including a `PerNeighbor` field
    pub fn supports_field(self) -> bool {
        !matches!(self, Algorithm::Wolff)
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Metropolis => "metropolis",
            Algorithm::HeatBath => "heat_bath",
            Algorithm::HeatBathRandom => "heat_bath_random",
            Algorithm::Wolff => "wolff",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "metropolis" => Ok(Self::Metropolis),
            "heat_bath" | "heatbath" => Ok(Self::HeatBath),
            "heat_bath_random" => Ok(Self::HeatBathRandom),
            "wolff" => Ok(Self::Wolff),
            _ => Err(format!(
                "unknown algorithm '{s}', expected 'metropolis', 'heat_bath', 'heat_bath_random' or 'wolff'"
            )),
        }
    }
}

/// One Metropolis sweep over all sites in raster order
///
/// Each site gets a uniformly random proposal. A proposal equal to the current
/// spin is skipped; otherwise the flip is accepted when `ΔE < 0` or with
/// probability `exp(-ΔE / T)`.
pub fn metropolis_sweep(lattice: &mut SpinLattice, temperature: f64) {
    let n = lattice.size();
    for (x, y) in iproduct!(0..n, 0..n) {
        let proposal = lattice.random_spin();
        if proposal == lattice.get(x, y) {
            continue;
        }

        // ΔE = E(proposal) - E(current) = 2 * E(proposal)
        let delta_e = 2.0 * lattice.local_field_energy(x, y, proposal);
        if delta_e < 0.0 || lattice.uniform() < (-delta_e / temperature).exp() {
            lattice.flip(x, y);
        }
    }
    lattice.record_sweep();
}

pub fn metropolis_sweeps(lattice: &mut SpinLattice, temperature: f64, sweeps: usize) {
    for _ in 0..sweeps {
        metropolis_sweep(lattice, temperature);
    }
}

/// Probability that the heat-bath update sets a site to +1
///
/// `local_field` is the neighbor sum plus any field term (see
/// [`SpinLattice::effective_field`]). With `k = -J * local_field / T` this is
/// `exp(-k) / (2 cosh k)`, evaluated as `1 / (1 + exp(2k))` so it stays finite
/// for large `|k|`.
#[inline]
pub fn heat_bath_up_probability(coupling: f64, local_field: f64, temperature: f64) -> f64 {
    let k = -coupling * local_field / temperature;
    1.0 / (1.0 + (2.0 * k).exp())
}

#[inline]
fn heat_bath_update(lattice: &mut SpinLattice, x: usize, y: usize, temperature: f64) {
    let p_up = heat_bath_up_probability(lattice.coupling, lattice.effective_field(x, y), temperature);
    let spin = if lattice.uniform() < p_up { 1 } else { -1 };
    lattice.set(x, y, spin);
}

/// One heat-bath sweep over all sites in raster order
pub fn heat_bath_sweep(lattice: &mut SpinLattice, temperature: f64) {
    let n = lattice.size();
    for (x, y) in iproduct!(0..n, 0..n) {
        heat_bath_update(lattice, x, y, temperature);
    }
    lattice.record_sweep();
}

pub fn heat_bath_sweeps(lattice: &mut SpinLattice, temperature: f64, sweeps: usize) {
    for _ in 0..sweeps {
        heat_bath_sweep(lattice, temperature);
    }
}

/// One heat-bath sweep of `N²` updates on sites picked uniformly with replacement
pub fn heat_bath_random_sweep(lattice: &mut SpinLattice, temperature: f64) {
    for _ in 0..lattice.num_sites() {
        let (x, y) = lattice.random_site();
        heat_bath_update(lattice, x, y, temperature);
    }
    lattice.record_sweep();
}

pub fn heat_bath_random_sweeps(lattice: &mut SpinLattice, temperature: f64, sweeps: usize) {
    for _ in 0..sweeps {
        heat_bath_random_sweep(lattice, temperature);
    }
}

/// Wolff bond activation probability `1 - exp(-2J / T)`
#[inline]
pub fn wolff_add_probability(coupling: f64, temperature: f64) -> f64 {
    1.0 - (-2.0 * coupling / temperature).exp()
}

/// Grow and flip one Wolff cluster, returning its size
///
/// The cluster move has no field-dependent acceptance step, so it samples the
/// zero-field Hamiltonian only; [`Algorithm::supports_field`] is false for it.
///
/// The seed is flipped immediately, then the cluster grows breadth-first:
/// a neighbor opposite to the (already flipped) current site joins with
/// probability `1 - exp(-2J / T)`. Joined sites are flipped on entry, so they
/// can never satisfy the join condition again and the queue always drains.
pub fn wolff_sweep(lattice: &mut SpinLattice, temperature: f64) -> usize {
    let add_probability = wolff_add_probability(lattice.coupling, temperature);

    let seed = lattice.random_site();
    lattice.flip(seed.0, seed.1);
    let mut queue = VecDeque::from([seed]);
    let mut cluster_size = 1;

    while let Some((x, y)) = queue.pop_front() {
        let spin = lattice.get(x, y);
        for (nx, ny) in lattice.neighbors(x, y) {
            if lattice.get(nx, ny) == -spin && lattice.uniform() < add_probability {
                lattice.flip(nx, ny);
                queue.push_back((nx, ny));
                cluster_size += 1;
            }
        }
    }

    lattice.record_sweep();
    cluster_size
}

/// Perform `sweeps` Wolff sweeps, returning the total number of flipped sites
pub fn wolff_sweeps(lattice: &mut SpinLattice, temperature: f64, sweeps: usize) -> usize {
    (0..sweeps).map(|_| wolff_sweep(lattice, temperature)).sum()
}
