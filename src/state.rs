use crate::buffer::GridBuffer;
use crate::initializer;
use crate::precision::StorageFormat;
use crate::slab::Slab;
use crate::{FluidResult, Grid2};

pub const VELOCITY_CHANNELS: usize = 2;
pub const PRESSURE_CHANNELS: usize = 1;
pub const DENSITY_CHANNELS: usize = 4;
pub const DIVERGENCE_CHANNELS: usize = 3;

#[derive(Clone, Debug)]
pub struct FluidState {
    grid: Grid2,
    format: StorageFormat,
    pub(crate) velocity: Slab,
    pub(crate) pressure: Slab,
    pub(crate) density: Slab,
    // Diagnostic view of the last divergence pass: signed value, positive
    // part, negative part.
    pub(crate) divergence: GridBuffer,
}

impl FluidState {
    pub fn new(width: usize, height: usize, format: StorageFormat) -> FluidResult<Self> {
        let grid = Grid2::try_new(width, height)?;
        let velocity = Slab::create(grid, VELOCITY_CHANNELS, format)?;
        let pressure = Slab::create(grid, PRESSURE_CHANNELS, format)?;
        let density = Slab::create(grid, DENSITY_CHANNELS, format)?;
        let divergence = GridBuffer::create(grid, DIVERGENCE_CHANNELS, format)?;
        let mut state = Self {
            grid,
            format,
            velocity,
            pressure,
            density,
            divergence,
        };
        initializer::seed_state(&mut state)?;
        log::info!("created {width}x{height} fluid state with {format} storage");
        Ok(state)
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    pub fn velocity(&self) -> &Slab {
        &self.velocity
    }

    pub fn pressure(&self) -> &Slab {
        &self.pressure
    }

    pub fn density(&self) -> &Slab {
        &self.density
    }

    pub fn divergence(&self) -> &GridBuffer {
        &self.divergence
    }

    // Re-seeds every buffer. On failure the previous contents are kept.
    pub fn reset(&mut self) -> FluidResult<()> {
        initializer::seed_state(self)
    }

    pub fn memory_footprint(&self) -> usize {
        let slab_bytes = |slab: &Slab| slab.source().as_bytes().len() * 2;
        slab_bytes(&self.velocity)
            + slab_bytes(&self.pressure)
            + slab_bytes(&self.density)
            + self.divergence.as_bytes().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::SeedColor;
    use crate::FluidError;

    #[test]
    fn new_rejects_empty_grid() {
        assert!(matches!(
            FluidState::new(0, 8, StorageFormat::Float16),
            Err(FluidError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn buffers_carry_expected_channels() {
        let state = FluidState::new(6, 5, StorageFormat::Float32).unwrap();
        assert_eq!(state.velocity().channels(), 2);
        assert_eq!(state.pressure().channels(), 1);
        assert_eq!(state.density().channels(), 4);
        assert_eq!(state.divergence().channels(), 3);
        assert_eq!(state.density().grid(), state.grid());
    }

    #[test]
    fn half_storage_halves_footprint() {
        let half = FluidState::new(8, 8, StorageFormat::Float16).unwrap();
        let full = FluidState::new(8, 8, StorageFormat::Float32).unwrap();
        assert_eq!(full.memory_footprint(), half.memory_footprint() * 2);
        assert_eq!(full.memory_footprint(), 8 * 8 * (2 * 2 + 2 + 2 * 4 + 3) * 4);
    }

    #[test]
    fn reset_restores_seeded_density() {
        let mut state = FluidState::new(3, 3, StorageFormat::Float16).unwrap();
        let seeded = state.density().source().read_values();
        state.density.source_mut().write_values(&[0.0; 3 * 3 * 4]);
        state.reset().unwrap();
        assert_eq!(state.density().source().read_values(), seeded);
        let density = state.density().source().to_field::<4>();
        let orange = SeedColor::Orange.rgba();
        for (value, expected) in density.get(1, 1).iter().zip(orange) {
            assert!((value - expected).abs() < 1e-3);
        }
    }
}
