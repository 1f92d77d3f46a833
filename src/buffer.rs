use crate::field::Field2;
use crate::precision::{PlanarLayout, PrecisionConverter, StorageFormat};
use crate::{FluidError, FluidResult, Grid2};

pub const MAX_CHANNELS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(grid: Grid2) -> Self {
        Self::new(0, 0, grid.width(), grid.height())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridBuffer {
    grid: Grid2,
    channels: usize,
    format: StorageFormat,
    bytes: Vec<u8>,
}

impl GridBuffer {
    pub fn create(grid: Grid2, channels: usize, format: StorageFormat) -> FluidResult<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(FluidError::UnsupportedChannels(channels));
        }
        let len = grid
            .size()
            .checked_mul(channels)
            .and_then(|n| n.checked_mul(format.bytes_per_scalar()))
            .ok_or(FluidError::InvalidDimensions {
                width: grid.width(),
                height: grid.height(),
            })?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| FluidError::Allocation { bytes: len })?;
        bytes.resize(len, 0);
        Ok(Self {
            grid,
            channels,
            format,
            bytes,
        })
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

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    pub fn cell_bytes(&self) -> usize {
        self.channels * self.format.bytes_per_scalar()
    }

    pub fn row_bytes(&self) -> usize {
        self.grid.width() * self.cell_bytes()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn converter(&self) -> PrecisionConverter {
        PrecisionConverter::new(self.format, self.channels)
    }

    pub fn same_shape(&self, other: &Self) -> bool {
        self.grid == other.grid && self.channels == other.channels && self.format == other.format
    }

    // Overwrites `region` with rows taken from `bytes`, which must already be
    // in this buffer's format and channel count.
    pub fn replace_region(&mut self, region: Region, bytes: &[u8], bytes_per_row: usize) {
        let row_len = self.check_region(region, bytes.len(), bytes_per_row);
        let cell_bytes = self.cell_bytes();
        let row_bytes = self.row_bytes();
        for row in 0..region.height {
            let src = row * bytes_per_row;
            let dst = (region.y + row) * row_bytes + region.x * cell_bytes;
            self.bytes[dst..dst + row_len].copy_from_slice(&bytes[src..src + row_len]);
        }
    }

    pub fn read_region(&self, region: Region, out: &mut [u8], bytes_per_row: usize) {
        let row_len = self.check_region(region, out.len(), bytes_per_row);
        let cell_bytes = self.cell_bytes();
        let row_bytes = self.row_bytes();
        for row in 0..region.height {
            let src = (region.y + row) * row_bytes + region.x * cell_bytes;
            let dst = row * bytes_per_row;
            out[dst..dst + row_len].copy_from_slice(&self.bytes[src..src + row_len]);
        }
    }

    pub fn write_values(&mut self, values: &[f32]) {
        let converter = self.converter();
        let (width, height) = (self.width(), self.height());
        assert_eq!(
            values.len(),
            width * height * self.channels,
            "value count does not match buffer shape"
        );
        let packed = converter.to_storage(values, width, height);
        let row_bytes = self.row_bytes();
        self.replace_region(Region::full(self.grid), &packed, row_bytes);
    }

    pub fn read_values(&self) -> Vec<f32> {
        self.converter()
            .from_storage(&self.bytes, self.width(), self.height())
    }

    pub fn decode_into<const C: usize>(&self, field: &mut Field2<C>) {
        self.check_field(field.grid(), C);
        self.format.codec().decode(&self.bytes, field.as_flat_mut());
    }

    pub fn encode_from<const C: usize>(&mut self, field: &Field2<C>) {
        self.check_field(field.grid(), C);
        self.format.codec().encode(field.as_flat(), &mut self.bytes);
    }

    pub fn to_field<const C: usize>(&self) -> Field2<C> {
        let mut field = Field2::zeros(self.grid);
        self.decode_into(&mut field);
        field
    }

    pub fn clear(&mut self) {
        // All-zero bytes are +0.0 in both formats.
        self.bytes.fill(0);
    }

    fn check_field(&self, grid: Grid2, channels: usize) {
        assert_eq!(grid, self.grid, "field grid does not match buffer");
        assert_eq!(channels, self.channels, "field channel count does not match buffer");
    }

    fn check_region(&self, region: Region, len: usize, bytes_per_row: usize) -> usize {
        assert!(
            region.x + region.width <= self.grid.width()
                && region.y + region.height <= self.grid.height(),
            "region {region:?} exceeds {}x{} grid",
            self.grid.width(),
            self.grid.height()
        );
        let row_len = region.width * self.cell_bytes();
        assert!(bytes_per_row >= row_len, "row stride shorter than region row");
        let layout = PlanarLayout {
            width: region.width,
            height: region.height,
            row_bytes: bytes_per_row,
        };
        let required = layout.required_len(row_len);
        assert!(len >= required, "region data holds {len} bytes, needs {required}");
        row_len
    }
}
