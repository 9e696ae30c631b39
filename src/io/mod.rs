//! Input/Output operations for temperature sweeps
//!
//! This module handles logging setup and the results table.

mod output;

pub use output::{report_summary, setup_output, write_results};
