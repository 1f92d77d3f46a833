use crate::{FluidError, FluidResult, Vec2};

// Dimensions of a cell-centred grid. Cell (x, y) sits at grid-space
// position (x, y); positions are measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Grid2 {
    width: usize,
    height: usize,
}

impl Grid2 {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0, "width must be > 0");
        assert!(height > 0, "height must be > 0");
        Self { width, height }
    }

    pub fn try_new(width: usize, height: usize) -> FluidResult<Self> {
        if width == 0 || height == 0 || width.checked_mul(height).is_none() {
            return Err(FluidError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    pub fn clamp_coord(&self, x: i64, y: i64) -> (usize, usize) {
        let max_x = (self.width - 1) as i64;
        let max_y = (self.height - 1) as i64;
        let cx = x.clamp(0, max_x) as usize;
        let cy = y.clamp(0, max_y) as usize;
        (cx, cy)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    // Clamps a grid-space position onto the span of cell centres.
    // Non-finite components collapse to the origin edge.
    pub fn clamp_position(&self, pos: Vec2) -> Vec2 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = if pos.x.is_finite() { pos.x.clamp(0.0, max_x) } else { 0.0 };
        let y = if pos.y.is_finite() { pos.y.clamp(0.0, max_y) } else { 0.0 };
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_rejects_empty_axes() {
        assert!(matches!(
            Grid2::try_new(0, 4),
            Err(FluidError::InvalidDimensions { width: 0, height: 4 })
        ));
        assert!(Grid2::try_new(4, 0).is_err());
        assert!(Grid2::try_new(usize::MAX, 2).is_err());
        assert_eq!(Grid2::try_new(3, 2).map(|g| g.size()).ok(), Some(6));
    }

    #[test]
    fn idx_is_row_major() {
        let grid = Grid2::new(5, 3);
        assert_eq!(grid.idx(0, 0), 0);
        assert_eq!(grid.idx(4, 0), 4);
        assert_eq!(grid.idx(1, 2), 11);
        assert_eq!(grid.coords(11), (1, 2));
    }

    #[test]
    fn clamp_coord_stays_inside() {
        let grid = Grid2::new(4, 3);
        assert_eq!(grid.clamp_coord(-5, 1), (0, 1));
        assert_eq!(grid.clamp_coord(9, 9), (3, 2));
    }

    #[test]
    fn clamp_position_handles_nan_and_edges() {
        let grid = Grid2::new(4, 4);
        assert_eq!(grid.clamp_position(Vec2::new(-1.0, 7.5)), Vec2::new(0.0, 3.0));
        assert_eq!(grid.clamp_position(Vec2::new(f32::NAN, 1.5)), Vec2::new(0.0, 1.5));
    }
}
