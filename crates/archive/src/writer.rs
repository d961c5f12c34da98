use std::path::{Path, PathBuf};

use futures_lite::future::block_on;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use voxmap_core::{
    BlockId, VoxelSet,
    coords::{Chunk, ColumnVoxel, Region, RegionChunk},
};
use voxmap_world::{Counter, ProgressObserver, RegionWriter};

use crate::{ArchiveError, RegionArchive};

/// Number of sub-progress steps per chunk: one to gather its voxels, one to store it.
pub const CHUNK_STAGES: u64 = 2;

/// A single voxel inside a [`ChunkColumn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub voxel: ColumnVoxel,
    pub block: BlockId,
}

/// All voxels of a chunk, sorted by height, then Z, then X.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkColumn {
    pub chunk: Chunk,
    pub entries: Vec<ColumnEntry>,
}

/// Naming of region archive files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub prefix: String,
    pub extension: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            prefix: "r.".to_string(),
            extension: "rgn".to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Returns the file path of the given region inside the output directory.
    pub fn region_path(&self, output: &Path, region: Region) -> PathBuf {
        output.join(format!(
            "{}{}.{}.{}",
            self.prefix, region.x, region.z, self.extension
        ))
    }
}

/// [`RegionWriter`] which stores each region in a [`RegionArchive`] of [`ChunkColumn`]s.
///
/// Only non-empty columns are stored, but every region cell gets a file, even if it has no
/// voxels at all.
#[derive(Debug, Clone, Default)]
pub struct ArchiveRegionWriter {
    config: ArchiveConfig,
}

impl ArchiveRegionWriter {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Reads back all columns of a region previously written to the given output directory.
    pub fn read_region(
        &self,
        output: &Path,
        region: Region,
    ) -> Result<Vec<ChunkColumn>, ArchiveError> {
        let path = self.config.region_path(output, region);

        block_on(async {
            let mut archive = RegionArchive::<ChunkColumn>::open(&path).await?;
            let columns = archive.read_all().await?;
            Ok::<_, ArchiveError>(columns.into_iter().map(|(_, column)| column).collect())
        })
    }

    /// Selects the voxels of the given region and splits them by chunk, indexed by
    /// [`RegionChunk::to_index`].
    fn gather(
        region: Region,
        voxels: &VoxelSet,
        progress: &dyn ProgressObserver,
    ) -> Vec<Vec<ColumnEntry>> {
        let mut columns = vec![Vec::new(); Region::BUFFER_SIZE];

        for placed in voxels.iter() {
            let chunk = Chunk::from_voxel(placed.voxel);
            if !region.contains(chunk) {
                continue;
            }

            columns[RegionChunk::from_chunk(chunk).to_index()].push(ColumnEntry {
                voxel: ColumnVoxel::from_voxel(placed.voxel),
                block: placed.block.clone(),
            });
        }

        for (index, entries) in columns.iter_mut().enumerate() {
            entries.sort_by_key(|entry| (entry.voxel.y, entry.voxel.z, entry.voxel.x));
            progress.update(Counter::Chunks, index as u64 + 1);
        }

        columns
    }

    async fn store(
        path: &Path,
        region: Region,
        columns: Vec<Vec<ColumnEntry>>,
        progress: &dyn ProgressObserver,
    ) -> Result<usize, ArchiveError> {
        let mut archive = RegionArchive::<ChunkColumn>::create(path).await?;
        let mut stored = 0;

        for (index, entries) in columns.into_iter().enumerate() {
            if !entries.is_empty() {
                let local = RegionChunk::from_index(index);
                let column = ChunkColumn {
                    chunk: region.chunk(local),
                    entries,
                };

                archive.write(local, &column).await?;
                stored += 1;
            }

            progress.update(
                Counter::Chunks,
                (Region::BUFFER_SIZE + index) as u64 + 1,
            );
        }

        archive.save_header().await?;

        Ok(stored)
    }
}

impl RegionWriter for ArchiveRegionWriter {
    type Error = ArchiveError;

    fn write_region(
        &mut self,
        region: Region,
        voxels: &VoxelSet,
        output: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<(), Self::Error> {
        let path = self.config.region_path(output, region);
        trace!("[Archive] Writing region {region} to {path:?}");

        progress.begin(Counter::Chunks, Region::BUFFER_SIZE as u64 * CHUNK_STAGES);

        let columns = Self::gather(region, voxels, progress);
        let stored = block_on(Self::store(&path, region, columns, progress))?;

        debug!("[Archive] Region {region} written with {stored} chunks");

        Ok(())
    }
}
