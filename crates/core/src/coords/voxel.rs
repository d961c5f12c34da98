use serde::{Deserialize, Serialize};

/// Points to a voxel in the world, in absolute integer coordinates.
///
/// Coordinates are unbounded and can be negative while the world is being accumulated. After
/// normalization every voxel is zero-based.
#[derive(Debug, Default, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Voxel {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Voxel {
    pub const ZERO: Voxel = Voxel::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this voxel moved by the given offset on each axis.
    #[inline]
    pub const fn translated(self, offset: Voxel) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.z + offset.z)
    }

    /// Returns this voxel relative to the given origin, or `None` if any axis doesn't fit in an
    /// `i32`.
    #[inline]
    pub const fn checked_relative_to(self, origin: Voxel) -> Option<Self> {
        let (Some(x), Some(y), Some(z)) = (
            self.x.checked_sub(origin.x),
            self.y.checked_sub(origin.y),
            self.z.checked_sub(origin.z),
        ) else {
            return None;
        };

        Some(Self::new(x, y, z))
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Voxel) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Voxel) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

impl std::fmt::Display for Voxel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("({}, {}, {})", self.x, self.y, self.z))
    }
}

impl From<(i32, i32, i32)> for Voxel {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<Voxel> for (i32, i32, i32) {
    fn from(value: Voxel) -> Self {
        (value.x, value.y, value.z)
    }
}
