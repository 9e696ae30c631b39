use itertools::iproduct;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lattice site addressed as `(x, y)` with `0 <= x, y < size`
pub type Site = (usize, usize);

/// How the external field `h` enters the local energy of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    /// `E = -J * s * Σ s_n`, the field is not part of the energy
    #[default]
    Ignored,
    /// `E = -J * s * Σ (s_n + h)`, the field is added to every neighbor term
    PerNeighbor,
}

/// Square 2D Ising lattice with periodic boundaries
///
/// Spins are stored row-major (`x + y * size`) and always hold -1 or +1.
/// Every lattice owns its random source, so lattices driven on different
/// threads never share a stream. The lattice side is fixed at construction.
#[derive(Debug)]
pub struct SpinLattice {
    size: usize,
    spins: Vec<i8>,
    /// Coupling constant J (positive: ferromagnet, negative: antiferromagnet)
    pub coupling: f64,
    /// External magnetic field h
    pub magnetic_field: f64,
    /// Field term formula used by `local_field_energy`
    pub field_mode: FieldMode,
    performed_sweeps: u64,
    rng: StdRng,
}

impl Clone for SpinLattice {
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            spins: self.spins.clone(),
            coupling: self.coupling,
            magnetic_field: self.magnetic_field,
            field_mode: self.field_mode,
            performed_sweeps: self.performed_sweeps,
            rng: StdRng::from_entropy(), // Create new RNG for the clone
        }
    }
}

impl SpinLattice {
    /// Create a lattice with random spins and an entropy-seeded generator
    pub fn new(size: usize) -> Self {
        Self::with_rng(size, StdRng::from_entropy())
    }

    /// Create a lattice with random spins drawn from a seeded generator
    pub fn with_seed(size: usize, seed: u64) -> Self {
        Self::with_rng(size, StdRng::seed_from_u64(seed))
    }

    /// Create a lattice with all spins -1
    pub fn new_cold(size: usize) -> Self {
        let mut lattice = Self::new(size);
        lattice.init_cold();
        lattice
    }

    fn with_rng(size: usize, rng: StdRng) -> Self {
        assert!(size > 0, "lattice size must be positive");
        let mut lattice = Self {
            size,
            spins: vec![-1; size * size],
            coupling: 1.0,
            magnetic_field: 0.0,
            field_mode: FieldMode::Ignored,
            performed_sweeps: 0,
            rng,
        };
        lattice.init_random();
        lattice
    }

    /// Set the coupling constant
    pub fn set_coupling(&mut self, coupling: f64) {
        self.coupling = coupling;
    }

    /// Set the external field and how it enters the energy
    pub fn set_magnetic_field(&mut self, field: f64, mode: FieldMode) {
        self.magnetic_field = field;
        self.field_mode = mode;
    }

    /// Side length of the lattice
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of sites (`size²`)
    pub fn num_sites(&self) -> usize {
        self.spins.len()
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn field(&self) -> f64 {
        self.magnetic_field
    }

    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Number of sweeps any update algorithm has performed on this lattice
    pub fn performed_sweeps(&self) -> u64 {
        self.performed_sweeps
    }

    pub(crate) fn record_sweep(&mut self) {
        self.performed_sweeps += 1;
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.size && y < self.size,
            "site ({x}, {y}) outside {0}x{0} lattice",
            self.size
        );
        x + y * self.size
    }

    /// Spin at `(x, y)`; no wraparound, coordinates must be in range
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> i8 {
        self.spins[self.index(x, y)]
    }

    /// Overwrite the spin at `(x, y)`
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, spin: i8) {
        debug_assert!(spin == 1 || spin == -1, "invalid spin value {spin}");
        let idx = self.index(x, y);
        self.spins[idx] = spin;
    }

    /// Negate the spin at `(x, y)`
    #[inline]
    pub fn flip(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        self.spins[idx] = -self.spins[idx];
    }

    /// The four periodic neighbors of `(x, y)` in the order east, north, west, south
    ///
    /// ```text
    ///        1
    ///        |
    ///   2 -- s -- 0
    ///        |
    ///        3
    /// ```
    #[inline]
    pub fn neighbors(&self, x: usize, y: usize) -> [Site; 4] {
        let n = self.size;
        [
            ((x + 1) % n, y),
            (x, (y + 1) % n),
            ((x + n - 1) % n, y),
            (x, (y + n - 1) % n),
        ]
    }

    /// Sum of the four neighbor spins of `(x, y)`
    #[inline]
    pub fn neighbor_sum(&self, x: usize, y: usize) -> i32 {
        self.neighbors(x, y)
            .iter()
            .map(|&(nx, ny)| self.get(nx, ny) as i32)
            .sum()
    }

    /// Assign every site independently to -1 or +1
    pub fn init_random(&mut self) {
        for idx in 0..self.spins.len() {
            self.spins[idx] = if self.rng.gen_bool(0.5) { 1 } else { -1 };
        }
    }

    /// Assign every site to -1
    pub fn init_cold(&mut self) {
        self.spins.fill(-1);
    }

    /// Whether the external field enters the energy of this lattice
    pub fn has_active_field(&self) -> bool {
        self.field_mode == FieldMode::PerNeighbor && self.magnetic_field != 0.0
    }

    /// Neighbor sum of `(x, y)` plus the field term of the current field mode
    pub fn effective_field(&self, x: usize, y: usize) -> f64 {
        let field_term = match self.field_mode {
            FieldMode::Ignored => 0.0,
            FieldMode::PerNeighbor => 4.0 * self.magnetic_field,
        };
        self.neighbor_sum(x, y) as f64 + field_term
    }

    /// Energy contribution of `(x, y)` if it held `candidate`
    pub fn local_field_energy(&self, x: usize, y: usize, candidate: i8) -> f64 {
        debug_assert!(candidate == 1 || candidate == -1, "invalid spin value {candidate}");
        -self.coupling * candidate as f64 * self.effective_field(x, y)
    }

    /// Normalized energy of the configuration
    ///
    /// The raw sum counts every bond twice and a site contributes at most 4 bonds,
    /// hence the division by `2 * 4 * N²`; the shift by 0.5 maps the result onto
    /// [0, 1] (for `|J| = 1` and no field).
    pub fn total_energy(&self) -> f64 {
        let n = self.size;
        let raw: f64 = iproduct!(0..n, 0..n)
            .map(|(x, y)| self.local_field_energy(x, y, self.get(x, y)))
            .sum();
        raw / (2.0 * 4.0 * self.num_sites() as f64) + 0.5
    }

    /// Mean spin value in [-1, 1]
    pub fn magnetization(&self) -> f64 {
        let total: i64 = self.spins.iter().map(|&s| s as i64).sum();
        debug_assert!(
            total.unsigned_abs() as usize <= self.spins.len(),
            "magnetization {total} exceeds number of sites"
        );
        total as f64 / self.num_sites() as f64
    }

    /// Uniform real in [0, 1)
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniformly random spin value
    #[inline]
    pub fn random_spin(&mut self) -> i8 {
        if self.rng.gen_bool(0.5) {
            1
        } else {
            -1
        }
    }

    /// Uniformly random site
    #[inline]
    pub fn random_site(&mut self) -> Site {
        let x = self.rng.gen_range(0..self.size);
        let y = self.rng.gen_range(0..self.size);
        (x, y)
    }
}

impl fmt::Display for SpinLattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.spins.chunks(self.size) {
            for &spin in row {
                write!(f, "{:2}", if spin == 1 { "↑" } else { "↓" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
