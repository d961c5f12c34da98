use serde::{Deserialize, Serialize};

use crate::coords::Chunk;

/// Points to a region coordinates in the world in a 2d grid.
///
/// A Region is a 2d grid container with [`Self::BUFFER_SIZE`] [`Chunk`]s and is persisted as a
/// single output artifact.
#[derive(Debug, Default, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub z: i32,
}

impl Region {
    pub const AXIS_SIZE: usize = 32;
    pub const X_END: u8 = (Self::AXIS_SIZE - 1) as u8;
    pub const Z_END: u8 = (Self::AXIS_SIZE - 1) as u8;

    pub const BUFFER_SIZE: usize = Self::AXIS_SIZE * Self::AXIS_SIZE;

    const X_SHIFT: usize = Self::AXIS_SIZE.ilog2() as usize;
    const Z_MASK: usize = Self::AXIS_SIZE - 1;

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn from_chunk(chunk: Chunk) -> Self {
        Region::new(
            chunk.x.div_euclid(Region::AXIS_SIZE as i32),
            chunk.z.div_euclid(Region::AXIS_SIZE as i32),
        )
    }

    /// Checks if the given chunk falls within this region footprint.
    #[inline]
    pub fn contains(&self, chunk: Chunk) -> bool {
        Self::from_chunk(chunk) == *self
    }

    /// Returns the world chunk at the given local coordinates of this region.
    pub fn chunk(&self, local: RegionChunk) -> Chunk {
        Chunk::new(
            self.x * Self::AXIS_SIZE as i32 + local.x as i32,
            self.z * Self::AXIS_SIZE as i32 + local.z as i32,
        )
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("({}, {})", self.x, self.z))
    }
}

/// A chunk coordinate relative to the region it belongs.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct RegionChunk {
    pub x: u8,
    pub z: u8,
}

impl RegionChunk {
    #[inline(always)]
    pub const fn new(x: u8, z: u8) -> Self {
        Self { x, z }
    }

    #[inline(always)]
    pub const fn to_index(self) -> usize {
        (self.x as usize) << Region::X_SHIFT | self.z as usize
    }

    #[inline(always)]
    pub const fn from_index(index: usize) -> Self {
        Self::new(
            (index >> Region::X_SHIFT) as u8,
            (index & Region::Z_MASK) as u8,
        )
    }

    pub fn from_chunk(chunk: Chunk) -> Self {
        let x = chunk.x.rem_euclid(Region::AXIS_SIZE as i32);
        let z = chunk.z.rem_euclid(Region::AXIS_SIZE as i32);

        debug_assert!(x >= 0 && x < Region::AXIS_SIZE as i32);
        debug_assert!(z >= 0 && z < Region::AXIS_SIZE as i32);

        Self::new(x as u8, z as u8)
    }

    /// Iterates over all local chunks of a region, in index order.
    pub fn all() -> impl Iterator<Item = RegionChunk> {
        (0..Region::BUFFER_SIZE).map(Self::from_index)
    }
}

impl std::fmt::Display for RegionChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("({}, {})", self.x, self.z))
    }
}
