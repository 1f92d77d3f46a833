mod buffer;
mod config;
mod error;
mod field;
mod grid;
mod initializer;
mod input;
mod palette;
mod par;
mod precision;
mod simulation;
mod slab;
mod solver;
mod state;
mod vec2;

pub use buffer::{GridBuffer, Region, MAX_CHANNELS};
pub use config::{SimulationConfig, SolverParams};
pub use error::{FluidError, FluidResult};
pub use field::{ColorField, Field2, ScalarField, VelocityField};
pub use grid::Grid2;
pub use initializer::{
    initial_density, initial_pressure, initial_velocity, swirl_velocity, tile_color,
    SWIRL_PERIOD, TILE_CYCLE, TILE_SIZE,
};
pub use input::{InputHandle, TouchEvent};
pub use palette::SeedColor;
pub use precision::{
    f16_bits_to_f32, f32_to_f16_bits, PlanarLayout, PrecisionConverter, StorageCodec,
    StorageFormat, F16_MAX, F16_MIN_POSITIVE,
};
pub use simulation::FluidSimulation;
pub use slab::Slab;
pub use solver::{
    advect, advect_into, apply_splats_into, blend_dye_into, diffuse_jacobi_into, divergence,
    divergence_diagnostic_into, divergence_into, jacobi_pressure_into, mean_abs_divergence,
    splat_weight, subtract_gradient_into, Pass, Solver, Splat, StepReport,
};
pub use state::{
    FluidState, DENSITY_CHANNELS, DIVERGENCE_CHANNELS, PRESSURE_CHANNELS, VELOCITY_CHANNELS,
};
pub use vec2::Vec2;
