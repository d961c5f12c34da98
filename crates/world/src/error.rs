use thiserror::Error;
use voxmap_core::{
    BoundingBox,
    coords::{Region, Voxel},
};

/// Errors which can happen while exporting a world.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output directory couldn't be created or the config file couldn't be read.
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    /// The export config file isn't a valid ron document.
    #[error("Failed to parse config: {0}")]
    Config(#[from] ron::error::SpannedError),
    /// The world is wider than `i32::MAX` on some axis, so it can't be moved to the origin.
    #[error("World bounds {bounds} are too large to be normalized")]
    WorldTooLarge { bounds: BoundingBox },
    /// A voxel lies outside the bounds used to normalize it.
    #[error("Voxel {voxel} is outside of world bounds {bounds}")]
    OutOfBounds { voxel: Voxel, bounds: BoundingBox },
    /// The region writer failed. Regions before this one were already written.
    #[error("Failed to write region {region}: {source}")]
    RegionWrite {
        region: Region,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
