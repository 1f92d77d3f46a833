use crate::grid::Grid2;
use crate::par::should_parallel;
use crate::{FluidError, FluidResult, Vec2};
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct Field2<const C: usize> {
    grid: Grid2,
    data: Vec<[f32; C]>,
}

pub type ScalarField = Field2<1>;
pub type VelocityField = Field2<2>;
pub type ColorField = Field2<4>;

impl<const C: usize> Field2<C> {
    pub fn new(grid: Grid2, fill: [f32; C]) -> Self {
        let data = vec![fill; grid.size()];
        Self { grid, data }
    }

    pub fn zeros(grid: Grid2) -> Self {
        Self::new(grid, [0.0; C])
    }

    pub fn from_fn(grid: Grid2, f: impl Fn(usize, usize) -> [f32; C] + Sync) -> Self {
        let mut field = Self::zeros(grid);
        field.fill_with_index(f);
        field
    }

    pub fn try_new(grid: Grid2, fill: [f32; C]) -> FluidResult<Self> {
        let len = grid.size();
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FluidError::Allocation {
                bytes: len.saturating_mul(std::mem::size_of::<[f32; C]>()),
            })?;
        data.resize(len, fill);
        Ok(Self { grid, data })
    }

    pub fn try_zeros(grid: Grid2) -> FluidResult<Self> {
        Self::try_new(grid, [0.0; C])
    }

    pub fn try_from_fn(
        grid: Grid2,
        f: impl Fn(usize, usize) -> [f32; C] + Sync,
    ) -> FluidResult<Self> {
        let mut field = Self::try_zeros(grid)?;
        field.fill_with_index(f);
        Ok(field)
    }

    pub fn from_flat(grid: Grid2, values: &[f32]) -> Self {
        assert_eq!(
            values.len(),
            grid.size() * C,
            "flat field length does not match {}x{}x{}",
            grid.width(),
            grid.height(),
            C
        );
        let data = values
            .chunks_exact(C)
            .map(|chunk| std::array::from_fn(|c| chunk[c]))
            .collect();
        Self { grid, data }
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn channels(&self) -> usize {
        C
    }

    pub fn get(&self, x: usize, y: usize) -> [f32; C] {
        self.data[self.grid.idx(x, y)]
    }

    pub fn cells(&self) -> &[[f32; C]] {
        &self.data
    }

    pub fn as_flat(&self) -> &[f32] {
        self.data.as_flattened()
    }

    pub fn as_flat_mut(&mut self) -> &mut [f32] {
        self.data.as_flattened_mut()
    }

    pub fn sample_clamped(&self, x: i64, y: i64) -> [f32; C] {
        let (cx, cy) = self.grid.clamp_coord(x, y);
        self.get(cx, cy)
    }

    pub fn sample_or(&self, x: i64, y: i64, outside: [f32; C]) -> [f32; C] {
        if self.grid.contains(x, y) {
            self.get(x as usize, y as usize)
        } else {
            outside
        }
    }

    // Bilinear sample at a grid-space position. Positions outside the grid
    // clamp to the nearest edge cell; sampling never wraps.
    pub fn sample_linear(&self, pos: Vec2) -> [f32; C] {
        let pos = self.grid.clamp_position(pos);
        let x0 = pos.x.floor() as i64;
        let y0 = pos.y.floor() as i64;
        let sx = pos.x - x0 as f32;
        let sy = pos.y - y0 as f32;
        let v00 = self.sample_clamped(x0, y0);
        let v10 = self.sample_clamped(x0 + 1, y0);
        let v01 = self.sample_clamped(x0, y0 + 1);
        let v11 = self.sample_clamped(x0 + 1, y0 + 1);
        std::array::from_fn(|c| {
            let vx0 = v00[c] + (v10[c] - v00[c]) * sx;
            let vx1 = v01[c] + (v11[c] - v01[c]) * sx;
            vx0 + (vx1 - vx0) * sy
        })
    }

    pub fn fill_with_index(&mut self, f: impl Fn(usize, usize) -> [f32; C] + Sync) {
        let grid = self.grid;
        if should_parallel(self.data.len() * C) {
            self.data.par_iter_mut().enumerate().for_each(|(i, value)| {
                let (x, y) = grid.coords(i);
                *value = f(x, y);
            });
        } else {
            for (i, value) in self.data.iter_mut().enumerate() {
                let (x, y) = grid.coords(i);
                *value = f(x, y);
            }
        }
    }

    pub fn clone_from(&mut self, other: &Self) {
        self.assert_same_grid(other);
        self.data.clone_from(&other.data);
    }

    pub fn all_finite(&self) -> bool {
        self.as_flat().iter().all(|value| value.is_finite())
    }

    pub fn abs_sum(&self) -> f32 {
        if should_parallel(self.data.len() * C) {
            self.as_flat().par_iter().map(|value| value.abs()).sum()
        } else {
            self.as_flat().iter().map(|value| value.abs()).sum()
        }
    }

    pub fn mean_abs(&self) -> f32 {
        self.abs_sum() / (self.data.len() * C) as f32
    }

    fn assert_same_grid(&self, other: &Self) {
        assert_eq!(self.grid, other.grid, "field grid mismatch");
    }
}

impl ScalarField {
    pub fn scalar(&self, x: usize, y: usize) -> f32 {
        self.get(x, y)[0]
    }

    pub fn scalar_or(&self, x: i64, y: i64, outside: f32) -> f32 {
        self.sample_or(x, y, [outside])[0]
    }
}

impl VelocityField {
    pub fn vector(&self, x: usize, y: usize) -> Vec2 {
        Vec2::from(self.get(x, y))
    }
}
