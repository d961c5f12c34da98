use serde::{Deserialize, Serialize};

use crate::{
    bounds::BoundingBox,
    coords::{Chunk, Region},
};

/// Integer ceiling division. Written as `(value + (divisor - 1)) / divisor` in 64-bit, so it
/// never overflows for `u32` inputs.
#[inline]
pub const fn ceil_div(value: u64, divisor: u64) -> u64 {
    (value + (divisor - 1)) / divisor
}

/// Number of chunk columns and regions needed to cover a normalized world.
///
/// Counts are at least one on each axis, so even a world made of a single voxel, which has a
/// size of zero, still produces one chunk and one region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub chunks_x: u32,
    pub chunks_z: u32,
    pub regions_x: u32,
    pub regions_z: u32,
}

impl GridSize {
    /// Computes the grid from the box size (`max - min`) on X and Z. Y is never partitioned.
    pub fn from_size(size_x: u32, size_z: u32) -> Self {
        let chunks_x = Self::chunks_for_size(size_x, Chunk::X_AXIS_SIZE);
        let chunks_z = Self::chunks_for_size(size_z, Chunk::Z_AXIS_SIZE);

        Self {
            chunks_x,
            chunks_z,
            regions_x: Self::regions_for_chunks(chunks_x),
            regions_z: Self::regions_for_chunks(chunks_z),
        }
    }

    pub fn from_bounds(bounds: &BoundingBox) -> Self {
        let (size_x, _, size_z) = bounds.size();
        Self::from_size(size_x, size_z)
    }

    /// Number of chunk columns along an axis with the given size and chunk axis size.
    pub fn chunks_for_size(size: u32, axis_size: usize) -> u32 {
        (ceil_div(size as u64, axis_size as u64) as u32).max(1)
    }

    /// Number of regions needed for the given number of chunks along an axis.
    pub fn regions_for_chunks(chunks: u32) -> u32 {
        (ceil_div(chunks as u64, Region::AXIS_SIZE as u64) as u32).max(1)
    }

    /// Total number of region cells, which is also the number of artifacts produced.
    pub fn region_count(&self) -> u64 {
        self.regions_x as u64 * self.regions_z as u64
    }

    /// Iterates over all region cells in row-major order: X is the outer loop, Z the inner one.
    pub fn regions(&self) -> impl Iterator<Item = Region> + use<> {
        let regions_z = self.regions_z;

        (0..self.regions_x as i32)
            .flat_map(move |x| (0..regions_z as i32).map(move |z| Region::new(x, z)))
    }

    /// Checks if the given normalized chunk is inside a region cell of this grid.
    pub fn covers(&self, chunk: Chunk) -> bool {
        let region = Region::from_chunk(chunk);

        region.x >= 0
            && region.z >= 0
            && (region.x as u32) < self.regions_x
            && (region.z as u32) < self.regions_z
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{}x{} chunks, {}x{} regions",
            self.chunks_x, self.chunks_z, self.regions_x, self.regions_z
        ))
    }
}
