use crate::error::{Result, SimulationError};
use std::ops::Range;

/// Ordered temperature schedule of a sweep
///
/// Every distinct temperature (a *level*) is repeated `num_iterations` times in
/// a row, so level `i` occupies `[i * num_iterations, (i + 1) * num_iterations)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSchedule {
    levels: Vec<f64>,
    num_iterations: usize,
    temps: Vec<f64>,
}

impl TemperatureSchedule {
    /// Linearly spaced levels from `start` to `end`, both inclusive
    pub fn linear(num_temps: usize, start: f64, end: f64, num_iterations: usize) -> Result<Self> {
        if num_temps < 2 {
            return Err(SimulationError::InvalidConfig(format!(
                "at least 2 temperatures are required, got {num_temps}"
            )));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "temperature range [{start}, {end}] is not finite"
            )));
        }
        if start < 0.0 || end < 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "temperatures must not be negative, got [{start}, {end}]"
            )));
        }

        let step = (end - start) / (num_temps - 1) as f64;
        let levels = (0..num_temps)
            .map(|i| if i == num_temps - 1 { end } else { start + i as f64 * step })
            .collect();
        Self::from_levels(levels, num_iterations)
    }

    /// Schedule over explicit levels, each repeated `num_iterations` times
    pub fn from_levels(levels: Vec<f64>, num_iterations: usize) -> Result<Self> {
        if num_iterations == 0 {
            return Err(SimulationError::InvalidConfig(
                "number of iterations per temperature must be positive".to_string(),
            ));
        }
        if levels.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "temperature schedule is empty".to_string(),
            ));
        }

        let temps = levels
            .iter()
            .flat_map(|&t| itertools::repeat_n(t, num_iterations))
            .collect();
        Ok(Self {
            levels,
            num_iterations,
            temps,
        })
    }

    /// Sub-schedule holding the levels in `blocks`
    pub fn blocks(&self, blocks: Range<usize>) -> Result<Self> {
        Self::from_levels(self.levels[blocks].to_vec(), self.num_iterations)
    }

    /// Every schedule entry, one per measurement
    pub fn temps(&self) -> &[f64] {
        &self.temps
    }

    /// Distinct temperatures in schedule order
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Index range occupied by level `level`
    pub fn block(&self, level: usize) -> Range<usize> {
        level * self.num_iterations..(level + 1) * self.num_iterations
    }

    pub fn num_temps(&self) -> usize {
        self.levels.len()
    }

    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    pub fn start(&self) -> f64 {
        self.levels[0]
    }

    pub fn end(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.temps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temps.is_empty()
    }
}
