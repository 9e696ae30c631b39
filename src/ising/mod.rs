pub mod analysis;
pub mod lattice;
pub mod sweep;

pub use lattice::{FieldMode, Site, SpinLattice};
pub use sweep::{
    heat_bath_random_sweep, heat_bath_random_sweeps, heat_bath_sweep, heat_bath_sweeps,
    metropolis_sweep, metropolis_sweeps, wolff_sweep, wolff_sweeps, Algorithm,
};
