use std::path::Path;

use voxmap_core::{VoxelSet, coords::Region};

use crate::progress::ProgressObserver;

/// Persists a single region cell.
///
/// The writer receives the whole normalized [`VoxelSet`] on every call and is responsible for
/// selecting the voxels whose chunk falls inside the region's 32x32 chunk footprint. It may
/// report its own sub-progress through [`crate::Counter::Chunks`].
///
/// Regions are written one at a time, in row-major order (X outer, Z inner). Any error aborts
/// the export, leaving already written regions in place.
pub trait RegionWriter {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_region(
        &mut self,
        region: Region,
        voxels: &VoxelSet,
        output: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<(), Self::Error>;
}

impl<W: RegionWriter + ?Sized> RegionWriter for &mut W {
    type Error = W::Error;

    fn write_region(
        &mut self,
        region: Region,
        voxels: &VoxelSet,
        output: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<(), Self::Error> {
        (**self).write_region(region, voxels, output, progress)
    }
}
