//! Error types for the Ising sweep engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("this simulation is already finished")]
    AlreadyFinished,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("partition {index} failed: {source}")]
    Partition {
        index: usize,
        #[source]
        source: Box<SimulationError>,
    },

    #[error("could not build worker pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
