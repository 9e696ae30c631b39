//! Monte Carlo temperature sweeps of the 2D Ising ferromagnet

pub mod error;
pub mod ising;
pub mod simulation;

pub use error::{Result, SimulationError};
pub use ising::{Algorithm, FieldMode, SpinLattice};
pub use simulation::{PartitionStrategy, RunMode, Simulation, SimulationState, TemperatureSchedule};
