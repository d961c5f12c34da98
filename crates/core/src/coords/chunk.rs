use serde::{Deserialize, Serialize};

use crate::coords::Voxel;

/// Points to a chunk coordinates in the world in a 2d grid.
///
/// A Chunk is a full height column of [`Self::X_AXIS_SIZE`] by [`Self::Z_AXIS_SIZE`] voxels. The
/// Y axis is never partitioned.
#[derive(Debug, Default, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Chunk {
    pub x: i32,
    pub z: i32,
}

impl Chunk {
    pub const X_AXIS_SIZE: usize = 16;
    pub const Z_AXIS_SIZE: usize = 16;
    pub const X_END: u8 = (Self::X_AXIS_SIZE - 1) as u8;
    pub const Z_END: u8 = (Self::Z_AXIS_SIZE - 1) as u8;

    /// Creates a new chunk coordinates.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the chunk which contains the given voxel.
    ///
    /// This handles negative coordinates, so voxel (-1, 0, -17) lives in chunk (-1, -2).
    pub fn from_voxel(voxel: Voxel) -> Self {
        Self::new(
            voxel.x.div_euclid(Self::X_AXIS_SIZE as i32),
            voxel.z.div_euclid(Self::Z_AXIS_SIZE as i32),
        )
    }

    /// Returns the first voxel (lowest X and Z, at height zero) of this chunk.
    pub fn origin(self) -> Voxel {
        Voxel::new(
            self.x * Self::X_AXIS_SIZE as i32,
            0,
            self.z * Self::Z_AXIS_SIZE as i32,
        )
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("({}, {})", self.x, self.z))
    }
}

impl From<(i32, i32)> for Chunk {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Represents a voxel coordinate inside a [`Chunk`] column. X and Z are relative and always
/// within chunk bounds. Y is kept as is, since columns span the full height.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct ColumnVoxel {
    pub x: u8,
    pub y: i32,
    pub z: u8,
}

impl ColumnVoxel {
    #[inline(always)]
    pub const fn new(x: u8, y: i32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Converts a world voxel into its position inside the owning chunk column.
    ///
    /// This converts (1, -3, 17) into (1, -3, 1).
    #[inline]
    pub fn from_voxel(voxel: Voxel) -> Self {
        let x = voxel.x.rem_euclid(Chunk::X_AXIS_SIZE as i32) as u8;
        let z = voxel.z.rem_euclid(Chunk::Z_AXIS_SIZE as i32) as u8;

        Self::new(x, voxel.y, z)
    }

    /// Converts back to a world voxel, given the chunk this column belongs to.
    #[inline]
    pub fn to_voxel(self, chunk: Chunk) -> Voxel {
        chunk
            .origin()
            .translated(Voxel::new(self.x as i32, self.y, self.z as i32))
    }
}

impl std::fmt::Display for ColumnVoxel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("({}, {}, {})", self.x, self.y, self.z))
    }
}
