use serde::{Deserialize, Serialize};

use crate::precision::StorageFormat;
use crate::{FluidError, FluidResult};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    // Multiplier applied to the frame time before it drives advection.
    // Velocity is in cells per scaled time unit, so with 1.0 a host passes
    // 1.0 per frame; a host passing seconds at 60 Hz would use 60.0.
    pub dt_scale: f32,
    pub jacobi_iterations: usize,
    // Kinematic viscosity. Zero skips the diffusion pass.
    pub viscosity: f32,
    pub diffusion_iterations: usize,
    pub splat_radius: f32,
    pub splat_force: f32,
    pub dye_strength: f32,
    pub velocity_dissipation: f32,
    pub density_dissipation: f32,
    pub warm_start_pressure: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            dt_scale: 1.0,
            jacobi_iterations: 31,
            viscosity: 0.0,
            diffusion_iterations: 20,
            splat_radius: 10.0,
            splat_force: 1.5,
            dye_strength: 0.8,
            velocity_dissipation: 1.0,
            density_dissipation: 1.0,
            warm_start_pressure: false,
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> FluidResult<()> {
        let finite_non_negative = [
            ("dt_scale", self.dt_scale),
            ("viscosity", self.viscosity),
            ("splat_force", self.splat_force),
        ];
        for (name, value) in finite_non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(FluidError::InvalidConfig(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if !self.splat_radius.is_finite() || self.splat_radius <= 0.0 {
            return Err(FluidError::InvalidConfig(format!(
                "splat_radius must be > 0, got {}",
                self.splat_radius
            )));
        }
        let unit_interval = [
            ("dye_strength", self.dye_strength),
            ("velocity_dissipation", self.velocity_dissipation),
            ("density_dissipation", self.density_dissipation),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(FluidError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.viscosity > 0.0 && self.diffusion_iterations == 0 {
            return Err(FluidError::InvalidConfig(
                "diffusion_iterations must be > 0 when viscosity is set".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: usize,
    pub height: usize,
    pub format: StorageFormat,
    pub solver: SolverParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            format: StorageFormat::Float16,
            solver: SolverParams::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(width: usize, height: usize, format: StorageFormat) -> Self {
        Self {
            width,
            height,
            format,
            ..Self::default()
        }
    }

    pub fn with_solver(mut self, solver: SolverParams) -> Self {
        self.solver = solver;
        self
    }

    pub fn validate(&self) -> FluidResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FluidError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        self.solver.validate()
    }
}
