use crate::buffer::GridBuffer;
use crate::precision::StorageFormat;
use crate::{FluidResult, Grid2};

#[derive(Clone, Debug)]
pub struct Slab {
    buffers: [GridBuffer; 2],
    front: usize,
}

impl Slab {
    pub fn create(grid: Grid2, channels: usize, format: StorageFormat) -> FluidResult<Self> {
        let a = GridBuffer::create(grid, channels, format)?;
        let b = GridBuffer::create(grid, channels, format)?;
        Ok(Self {
            buffers: [a, b],
            front: 0,
        })
    }

    pub fn grid(&self) -> Grid2 {
        self.buffers[0].grid()
    }

    pub fn channels(&self) -> usize {
        self.buffers[0].channels()
    }

    pub fn format(&self) -> StorageFormat {
        self.buffers[0].format()
    }

    pub fn source(&self) -> &GridBuffer {
        &self.buffers[self.front]
    }

    pub fn source_mut(&mut self) -> &mut GridBuffer {
        &mut self.buffers[self.front]
    }

    pub fn destination(&self) -> &GridBuffer {
        &self.buffers[1 - self.front]
    }

    pub fn destination_mut(&mut self) -> &mut GridBuffer {
        &mut self.buffers[1 - self.front]
    }

    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    pub fn front_index(&self) -> usize {
        self.front
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }
}
