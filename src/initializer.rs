use std::f32::consts::PI;

use crate::field::{ColorField, ScalarField, VelocityField};
use crate::palette::SeedColor;
use crate::state::FluidState;
use crate::{FluidResult, Grid2};

pub const SWIRL_PERIOD: usize = 100;
pub const TILE_SIZE: usize = 100;
pub const TILE_CYCLE: usize = 4;

const TILE_COLORS: [SeedColor; 4] = [
    SeedColor::Orange,
    SeedColor::Red,
    SeedColor::Blue,
    SeedColor::Green,
];

pub fn swirl_velocity(x: usize, y: usize) -> [f32; 2] {
    let radian_x = 2.0 * PI * (x % SWIRL_PERIOD) as f32 / SWIRL_PERIOD as f32;
    let radian_y = 2.0 * PI * (y % SWIRL_PERIOD) as f32 / SWIRL_PERIOD as f32;
    [radian_x.sin(), radian_y.cos()]
}

pub fn tile_color(x: usize, y: usize) -> SeedColor {
    let tile_x = (x / TILE_SIZE) % TILE_CYCLE;
    let tile_y = (y / TILE_SIZE) % TILE_CYCLE;
    TILE_COLORS[(tile_x + tile_y) % TILE_CYCLE]
}

pub fn initial_velocity(grid: Grid2) -> FluidResult<VelocityField> {
    VelocityField::try_from_fn(grid, swirl_velocity)
}

pub fn initial_pressure(grid: Grid2) -> FluidResult<ScalarField> {
    ScalarField::try_zeros(grid)
}

pub fn initial_density(grid: Grid2) -> FluidResult<ColorField> {
    ColorField::try_from_fn(grid, |x, y| tile_color(x, y).rgba())
}

// Nothing is written unless all three fields were built.
pub fn seed_state(state: &mut FluidState) -> FluidResult<()> {
    let grid = state.grid();
    let velocity = initial_velocity(grid)?;
    let pressure = initial_pressure(grid)?;
    let density = initial_density(grid)?;
    state.velocity.clear();
    state.pressure.clear();
    state.density.clear();
    state.divergence.clear();
    state.velocity.source_mut().encode_from(&velocity);
    state.pressure.source_mut().encode_from(&pressure);
    state.density.source_mut().encode_from(&density);
    log::debug!(
        "seeded {}x{} fluid state ({})",
        grid.width(),
        grid.height(),
        state.format()
    );
    Ok(())
}
