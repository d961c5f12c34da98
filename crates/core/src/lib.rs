pub mod block;
pub mod bounds;
pub mod coords;
pub mod grid;
pub mod palette;

pub use block::{BlockId, PlacedVoxel, VoxelSet, VoxelSlot};
pub use bounds::{BoundingBox, BoundsMode};
pub use grid::GridSize;
pub use palette::{BlockResolver, Palette, PaletteError, Rgb};
