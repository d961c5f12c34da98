//! Converts an unbounded voxel field into region files.
//!
//! Voxels are accumulated in a [`World`] by any number of producers, then the sealed world is
//! exported by a [`WorldExporter`], which partitions it into 16x16 chunk columns grouped into
//! 32x32 chunk regions and hands each region to a [`RegionWriter`].
pub use voxmap_archive::{
    ArchiveConfig, ArchiveError, ArchiveRegionWriter, ChunkColumn, ColumnEntry, RegionArchive,
};
pub use voxmap_core::{
    BlockId, BlockResolver, BoundingBox, BoundsMode, GridSize, Palette, PlacedVoxel, Rgb,
    VoxelSet, coords,
};
pub use voxmap_world::{
    Counter, ExportConfig, ExportError, ExportSummary, NoProgress, ProgressCounters,
    ProgressObserver, RegionWriter, SealedWorld, World, WorldExporter,
};

/// Exports the world using an [`ArchiveRegionWriter`], writing one archive per region into
/// [`ExportConfig::output_dir`].
pub fn export_to_archives(
    world: SealedWorld,
    config: ExportConfig,
    archive: ArchiveConfig,
    progress: &dyn ProgressObserver,
) -> Result<ExportSummary, ExportError> {
    WorldExporter::new(config).export(world, ArchiveRegionWriter::new(archive), progress)
}
