use serde::{Deserialize, Serialize};

use crate::coords::Voxel;

/// How a [`BoundingBox`] is initialized before the first voxel is added.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsMode {
    /// Box starts at (0, 0, 0) on both corners, so the origin is always inside it even if no
    /// voxel occupies it. This keeps exported worlds placed the same way older exports were.
    #[default]
    OriginInclusive,
    /// Box starts at the first added voxel and only contains what was actually added.
    Tight,
}

/// Axis-aligned box containing every accumulated voxel. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    min: Voxel,
    max: Voxel,
    mode: BoundsMode,
    empty: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(BoundsMode::default())
    }
}

impl BoundingBox {
    pub fn new(mode: BoundsMode) -> Self {
        Self {
            min: Voxel::ZERO,
            max: Voxel::ZERO,
            mode,
            empty: true,
        }
    }

    /// Creates a box spanning the given corners. Corners are sorted per axis.
    pub fn from_corners(a: Voxel, b: Voxel) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
            mode: BoundsMode::Tight,
            empty: false,
        }
    }

    /// Widens the box, if needed, so it contains the given voxel.
    pub fn include(&mut self, voxel: Voxel) {
        if self.empty && self.mode == BoundsMode::Tight {
            self.min = voxel;
            self.max = voxel;
        } else {
            self.min = self.min.min(voxel);
            self.max = self.max.max(voxel);
        }

        self.empty = false;
    }

    /// Lowest corner, inclusive.
    #[inline]
    pub fn min(&self) -> Voxel {
        self.min
    }

    /// Highest corner, inclusive.
    #[inline]
    pub fn max(&self) -> Voxel {
        self.max
    }

    pub fn mode(&self) -> BoundsMode {
        self.mode
    }

    /// Checks if no voxel was ever included.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn contains(&self, voxel: Voxel) -> bool {
        voxel.min(self.min) == self.min && voxel.max(self.max) == self.max
    }

    /// Returns `max - min` on each axis.
    ///
    /// This is the distance between corners, not the number of voxels, so a box holding a
    /// single voxel has size zero.
    pub fn size(&self) -> (u32, u32, u32) {
        let axis = |min: i32, max: i32| (max as i64 - min as i64) as u32;

        (
            axis(self.min.x, self.max.x),
            axis(self.min.y, self.max.y),
            axis(self.min.z, self.max.z),
        )
    }

    /// Returns this box moved so its lowest corner is at the origin.
    ///
    /// Returns `None` when the box is wider than `i32::MAX` on any axis, since its highest corner
    /// can't be represented after the move.
    pub fn normalized(&self) -> Option<Self> {
        let max = self.max.checked_relative_to(self.min)?;

        Some(Self {
            min: Voxel::ZERO,
            max,
            ..*self
        })
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("[{} ~ {}]", self.min, self.max))
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn origin_inclusive_starts_at_origin() {
        // Arrange
        let mut bounds = BoundingBox::default();

        // Act
        bounds.include(Voxel::new(10, 20, 30));

        // Assert
        assert_eq!(bounds.min(), Voxel::ZERO);
        assert_eq!(bounds.max(), Voxel::new(10, 20, 30));
        assert_eq!(bounds.size(), (10, 20, 30));
    }

    #[test]
    fn tight_starts_at_first_voxel() {
        // Arrange
        let mut bounds = BoundingBox::new(BoundsMode::Tight);

        // Act
        bounds.include(Voxel::new(10, 20, 30));
        bounds.include(Voxel::new(12, 21, 30));

        // Assert
        assert_eq!(bounds.min(), Voxel::new(10, 20, 30));
        assert_eq!(bounds.max(), Voxel::new(12, 21, 30));
        assert_eq!(bounds.size(), (2, 1, 0));
        assert!(!bounds.contains(Voxel::ZERO));
    }

    #[test]
    fn random_includes_are_contained() {
        let mut rnd = StdRng::seed_from_u64(42);
        let mut bounds = BoundingBox::default();
        let mut voxels = vec![];

        for _ in 0..1000 {
            let voxel = Voxel::new(
                rnd.random_range(-5000..5000),
                rnd.random_range(-300..300),
                rnd.random_range(-5000..5000),
            );
            bounds.include(voxel);
            voxels.push(voxel);
        }

        for voxel in voxels {
            assert!(bounds.contains(voxel), "{voxel} outside {bounds}");
        }
        assert!(bounds.contains(Voxel::ZERO));
    }

    #[test]
    fn size_does_not_overflow_on_extremes() {
        let bounds = BoundingBox::from_corners(
            Voxel::new(i32::MIN, 0, 0),
            Voxel::new(i32::MAX, 0, 0),
        );

        assert_eq!(bounds.size(), (u32::MAX, 0, 0));
    }

    #[test]
    fn normalized_keeps_extents() {
        let bounds = BoundingBox::from_corners(Voxel::new(-5, 0, 0), Voxel::new(10, 0, 20));

        let normalized = bounds.normalized().unwrap();

        assert_eq!(normalized.min(), Voxel::ZERO);
        assert_eq!(normalized.max(), Voxel::new(15, 0, 20));
        assert_eq!(normalized.size(), bounds.size());
    }

    #[test]
    fn normalized_too_wide() {
        let wide = BoundingBox::from_corners(
            Voxel::new(-2_000_000_000, 0, 0),
            Voxel::new(2_000_000_000, 0, 0),
        );
        let lowest = BoundingBox::from_corners(Voxel::new(i32::MIN, 0, 0), Voxel::ZERO);
        let lowest_only =
            BoundingBox::from_corners(Voxel::new(i32::MIN, 0, 0), Voxel::new(i32::MIN, 0, 0));

        assert_eq!(wide.normalized(), None);
        assert_eq!(lowest.normalized(), None);
        assert_eq!(lowest_only.normalized().map(|b| b.max()), Some(Voxel::ZERO));
    }
}
