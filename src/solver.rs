// Boundary rules:
// - advection samples clamp to the nearest in-grid position;
// - divergence treats velocity outside the grid as zero;
// - pressure outside the grid mirrors the centre cell (zero normal gradient);
// - diffusion clamps neighbour lookups to the edge cell.

use std::fmt;

use crate::config::SolverParams;
use crate::field::{ColorField, Field2, ScalarField, VelocityField};
use crate::input::TouchEvent;
use crate::slab::Slab;
use crate::state::{FluidState, DIVERGENCE_CHANNELS};
use crate::{FluidError, FluidResult, Grid2, Vec2};

const SPLAT_CUTOFF_RADII: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    Inject,
    AdvectVelocity,
    DiffuseVelocity,
    Divergence,
    Pressure,
    Project,
    AdvectDensity,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::Inject => "inject",
            Pass::AdvectVelocity => "advect-velocity",
            Pass::DiffuseVelocity => "diffuse-velocity",
            Pass::Divergence => "divergence",
            Pass::Pressure => "pressure",
            Pass::Project => "project",
            Pass::AdvectDensity => "advect-density",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    pub dt: f32,
    pub events_applied: usize,
    pub events_dropped: usize,
    // Mean |div v| of the advected velocity, before projection.
    pub divergence_before: f32,
    // Mean |div v| of the committed, projected velocity.
    pub divergence_after: f32,
    pub pressure_iterations: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Splat {
    pub position: Vec2,
    pub impulse: Vec2,
    pub color: Option<[f32; 4]>,
}

#[derive(Clone, Debug)]
pub struct Solver {
    grid: Grid2,
    params: SolverParams,
    splats: Vec<Splat>,
    velocity_a: VelocityField,
    velocity_b: VelocityField,
    velocity_rhs: VelocityField,
    density_a: ColorField,
    density_b: ColorField,
    pressure_a: ScalarField,
    pressure_b: ScalarField,
    divergence: ScalarField,
    diagnostic: Field2<DIVERGENCE_CHANNELS>,
}

impl Solver {
    pub fn new(grid: Grid2, params: SolverParams) -> FluidResult<Self> {
        params.validate()?;
        Ok(Self {
            grid,
            params,
            splats: Vec::new(),
            velocity_a: VelocityField::try_zeros(grid)?,
            velocity_b: VelocityField::try_zeros(grid)?,
            velocity_rhs: VelocityField::try_zeros(grid)?,
            density_a: ColorField::try_zeros(grid)?,
            density_b: ColorField::try_zeros(grid)?,
            pressure_a: ScalarField::try_zeros(grid)?,
            pressure_b: ScalarField::try_zeros(grid)?,
            divergence: ScalarField::try_zeros(grid)?,
            diagnostic: Field2::try_zeros(grid)?,
        })
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn params(&self) -> SolverParams {
        self.params
    }

    pub fn set_params(&mut self, params: SolverParams) -> FluidResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    // Runs one frame. On error the failing pass is not committed; passes
    // before it in the same frame remain committed.
    pub fn step(
        &mut self,
        state: &mut FluidState,
        events: &[TouchEvent],
        dt: f32,
    ) -> FluidResult<StepReport> {
        assert_eq!(state.grid(), self.grid, "solver grid does not match state");
        let params = self.params;
        let dt = frame_dt(dt, params.dt_scale);
        let mut report = StepReport {
            dt,
            ..StepReport::default()
        };

        self.collect_splats(events, &mut report);
        if !self.splats.is_empty() {
            self.inject(state)?;
        }
        self.advect_velocity(state, dt)?;
        if params.viscosity > 0.0 && dt > 0.0 {
            self.diffuse_velocity(state, dt)?;
        }
        report.divergence_before = self.compute_divergence(state)?;
        report.pressure_iterations = self.relax_pressure(state)?;
        report.divergence_after = self.project(state)?;
        self.advect_density(state, dt)?;
        Ok(report)
    }

    fn collect_splats(&mut self, events: &[TouchEvent], report: &mut StepReport) {
        self.splats.clear();
        for event in events {
            if !event.is_finite() {
                report.events_dropped += 1;
                continue;
            }
            let position = self.grid.clamp_position(event.position);
            if position != event.position {
                log::trace!(
                    "clamped touch at ({}, {}) to ({}, {})",
                    event.position.x,
                    event.position.y,
                    position.x,
                    position.y
                );
            }
            self.splats.push(Splat {
                position,
                impulse: event.delta.scale(self.params.splat_force),
                color: event.color.map(|color| color.rgba()),
            });
        }
        report.events_applied = self.splats.len();
    }

    fn inject(&mut self, state: &mut FluidState) -> FluidResult<()> {
        let radius = self.params.splat_radius;
        state.velocity.source().decode_into(&mut self.velocity_a);
        apply_splats_into(&mut self.velocity_b, &self.velocity_a, &self.splats, radius);
        commit(&mut state.velocity, &self.velocity_b, Pass::Inject)?;

        if self.splats.iter().any(|splat| splat.color.is_some()) {
            state.density.source().decode_into(&mut self.density_a);
            blend_dye_into(
                &mut self.density_b,
                &self.density_a,
                &self.splats,
                radius,
                self.params.dye_strength,
            );
            commit(&mut state.density, &self.density_b, Pass::Inject)?;
        }
        Ok(())
    }

    fn advect_velocity(&mut self, state: &mut FluidState, dt: f32) -> FluidResult<()> {
        state.velocity.source().decode_into(&mut self.velocity_a);
        advect_into(
            &mut self.velocity_b,
            &self.velocity_a,
            &self.velocity_a,
            dt,
            self.params.velocity_dissipation,
        );
        commit(&mut state.velocity, &self.velocity_b, Pass::AdvectVelocity)
    }

    fn diffuse_velocity(&mut self, state: &mut FluidState, dt: f32) -> FluidResult<()> {
        let alpha = 1.0 / (self.params.viscosity * dt);
        state.velocity.source().decode_into(&mut self.velocity_rhs);
        for _ in 0..self.params.diffusion_iterations {
            state.velocity.source().decode_into(&mut self.velocity_a);
            diffuse_jacobi_into(&mut self.velocity_b, &self.velocity_a, &self.velocity_rhs, alpha);
            commit(&mut state.velocity, &self.velocity_b, Pass::DiffuseVelocity)?;
        }
        Ok(())
    }

    fn compute_divergence(&mut self, state: &mut FluidState) -> FluidResult<f32> {
        state.velocity.source().decode_into(&mut self.velocity_a);
        divergence_into(&mut self.divergence, &self.velocity_a);
        check_finite(&self.divergence, Pass::Divergence)?;
        divergence_diagnostic_into(&mut self.diagnostic, &self.divergence);
        state.divergence.encode_from(&self.diagnostic);
        Ok(self.divergence.mean_abs())
    }

    fn relax_pressure(&mut self, state: &mut FluidState) -> FluidResult<usize> {
        if !self.params.warm_start_pressure {
            state.pressure.clear();
        }
        let iterations = self.params.jacobi_iterations;
        for _ in 0..iterations {
            state.pressure.source().decode_into(&mut self.pressure_a);
            jacobi_pressure_into(&mut self.pressure_b, &self.pressure_a, &self.divergence);
            commit(&mut state.pressure, &self.pressure_b, Pass::Pressure)?;
        }
        Ok(iterations)
    }

    fn project(&mut self, state: &mut FluidState) -> FluidResult<f32> {
        state.velocity.source().decode_into(&mut self.velocity_a);
        state.pressure.source().decode_into(&mut self.pressure_a);
        subtract_gradient_into(&mut self.velocity_b, &self.velocity_a, &self.pressure_a);
        commit(&mut state.velocity, &self.velocity_b, Pass::Project)?;
        state.velocity.source().decode_into(&mut self.velocity_a);
        divergence_into(&mut self.divergence, &self.velocity_a);
        Ok(self.divergence.mean_abs())
    }

    fn advect_density(&mut self, state: &mut FluidState, dt: f32) -> FluidResult<()> {
        state.velocity.source().decode_into(&mut self.velocity_a);
        state.density.source().decode_into(&mut self.density_a);
        advect_into(
            &mut self.density_b,
            &self.density_a,
            &self.velocity_a,
            dt,
            self.params.density_dissipation,
        );
        commit(&mut state.density, &self.density_b, Pass::AdvectDensity)
    }
}

fn frame_dt(dt: f32, scale: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt * scale
    } else {
        0.0
    }
}

fn check_finite<const C: usize>(field: &Field2<C>, pass: Pass) -> FluidResult<()> {
    if field.all_finite() {
        Ok(())
    } else {
        Err(FluidError::Dispatch {
            pass,
            reason: "output contains non-finite values".to_string(),
        })
    }
}

fn commit<const C: usize>(slab: &mut Slab, field: &Field2<C>, pass: Pass) -> FluidResult<()> {
    check_finite(field, pass)?;
    slab.destination_mut().encode_from(field);
    slab.swap();
    log::trace!("{pass} committed");
    Ok(())
}

// Gaussian falloff `exp(-r²/radius²)`, cut to zero past three radii.
pub fn splat_weight(distance_squared: f32, radius: f32) -> f32 {
    let cutoff = SPLAT_CUTOFF_RADII * radius;
    if distance_squared > cutoff * cutoff {
        return 0.0;
    }
    (-distance_squared / (radius * radius)).exp()
}

pub fn apply_splats_into(
    out: &mut VelocityField,
    velocity: &VelocityField,
    splats: &[Splat],
    radius: f32,
) {
    out.fill_with_index(|x, y| {
        let cell = Vec2::new(x as f32, y as f32);
        let mut value = velocity.get(x, y);
        for splat in splats {
            let w = splat_weight(cell.sub(splat.position).length_squared(), radius);
            value[0] += splat.impulse.x * w;
            value[1] += splat.impulse.y * w;
        }
        value
    });
}

pub fn blend_dye_into(
    out: &mut ColorField,
    density: &ColorField,
    splats: &[Splat],
    radius: f32,
    strength: f32,
) {
    out.fill_with_index(|x, y| {
        let cell = Vec2::new(x as f32, y as f32);
        let mut value = density.get(x, y);
        for splat in splats {
            let Some(color) = splat.color else {
                continue;
            };
            let w = splat_weight(cell.sub(splat.position).length_squared(), radius);
            let t = (strength * w).min(1.0);
            for (channel, target) in value.iter_mut().zip(color) {
                *channel += (target - *channel) * t;
            }
        }
        value
    });
}

pub fn advect_into<const C: usize>(
    out: &mut Field2<C>,
    field: &Field2<C>,
    velocity: &VelocityField,
    dt: f32,
    dissipation: f32,
) {
    if dt == 0.0 && dissipation == 1.0 {
        out.clone_from(field);
        return;
    }
    out.fill_with_index(|x, y| {
        let v = velocity.vector(x, y);
        let upstream = Vec2::new(x as f32 - v.x * dt, y as f32 - v.y * dt);
        field.sample_linear(upstream).map(|value| value * dissipation)
    });
}

pub fn advect<const C: usize>(field: &Field2<C>, velocity: &VelocityField, dt: f32) -> Field2<C> {
    let mut out = Field2::zeros(field.grid());
    advect_into(&mut out, field, velocity, dt, 1.0);
    out
}

// One Jacobi sweep of the implicit viscosity system
// `(alpha + 4) x = alpha * rhs + sum(neighbours)`, `alpha = 1 / (nu dt)`.
pub fn diffuse_jacobi_into(
    out: &mut VelocityField,
    current: &VelocityField,
    rhs: &VelocityField,
    alpha: f32,
) {
    let beta = 4.0 + alpha;
    out.fill_with_index(|x, y| {
        let (xi, yi) = (x as i64, y as i64);
        let left = current.sample_clamped(xi - 1, yi);
        let right = current.sample_clamped(xi + 1, yi);
        let down = current.sample_clamped(xi, yi - 1);
        let up = current.sample_clamped(xi, yi + 1);
        let b = rhs.get(x, y);
        std::array::from_fn(|c| (left[c] + right[c] + down[c] + up[c] + alpha * b[c]) / beta)
    });
}

// Central-difference divergence. Velocity beyond the grid counts as zero.
pub fn divergence_into(out: &mut ScalarField, velocity: &VelocityField) {
    const WALL: [f32; 2] = [0.0, 0.0];
    out.fill_with_index(|x, y| {
        let (xi, yi) = (x as i64, y as i64);
        let right = velocity.sample_or(xi + 1, yi, WALL)[0];
        let left = velocity.sample_or(xi - 1, yi, WALL)[0];
        let up = velocity.sample_or(xi, yi + 1, WALL)[1];
        let down = velocity.sample_or(xi, yi - 1, WALL)[1];
        [0.5 * ((right - left) + (up - down))]
    });
}

pub fn divergence(velocity: &VelocityField) -> ScalarField {
    let mut out = ScalarField::zeros(velocity.grid());
    divergence_into(&mut out, velocity);
    out
}

pub fn mean_abs_divergence(velocity: &VelocityField) -> f32 {
    divergence(velocity).mean_abs()
}

// Signed divergence, its positive part and its negative part's magnitude.
pub fn divergence_diagnostic_into(out: &mut Field2<DIVERGENCE_CHANNELS>, divergence: &ScalarField) {
    out.fill_with_index(|x, y| {
        let value = divergence.scalar(x, y);
        [value, value.max(0.0), (-value).max(0.0)]
    });
}

pub fn jacobi_pressure_into(out: &mut ScalarField, pressure: &ScalarField, divergence: &ScalarField) {
    out.fill_with_index(|x, y| {
        let (xi, yi) = (x as i64, y as i64);
        let center = pressure.scalar(x, y);
        let left = pressure.scalar_or(xi - 1, yi, center);
        let right = pressure.scalar_or(xi + 1, yi, center);
        let down = pressure.scalar_or(xi, yi - 1, center);
        let up = pressure.scalar_or(xi, yi + 1, center);
        [(left + right + down + up - divergence.scalar(x, y)) * 0.25]
    });
}

pub fn subtract_gradient_into(out: &mut VelocityField, velocity: &VelocityField, pressure: &ScalarField) {
    out.fill_with_index(|x, y| {
        let (xi, yi) = (x as i64, y as i64);
        let center = pressure.scalar(x, y);
        let left = pressure.scalar_or(xi - 1, yi, center);
        let right = pressure.scalar_or(xi + 1, yi, center);
        let down = pressure.scalar_or(xi, yi - 1, center);
        let up = pressure.scalar_or(xi, yi + 1, center);
        let v = velocity.get(x, y);
        [v[0] - 0.5 * (right - left), v[1] - 0.5 * (up - down)]
    });
}
