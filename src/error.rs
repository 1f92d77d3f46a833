use thiserror::Error;

use crate::solver::Pass;

#[derive(Debug, Error)]
pub enum FluidError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("unsupported channel count {0}")]
    UnsupportedChannels(usize),

    #[error("failed to allocate {bytes} bytes for a grid buffer")]
    Allocation { bytes: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{pass} pass failed: {reason}")]
    Dispatch { pass: Pass, reason: String },
}

pub type FluidResult<T> = Result<T, FluidError>;
