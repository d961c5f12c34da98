use tracing::{debug, info, warn};
use voxmap_core::{BoundingBox, GridSize, VoxelSet, coords::Chunk};

use crate::{
    ExportConfig, ExportError, RegionWriter, SealedWorld,
    progress::{Counter, ProgressObserver},
};

/// Voxel progress is only reported once every this many slots, plus once at the end.
pub const VOXEL_PROGRESS_STEP: u64 = 256;

/// Outcome of [`normalize`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Slots visited, including empty ones.
    pub processed: u64,
    /// Empty slots found and skipped.
    pub anomalies: u64,
}

/// Outcome of a successful [`WorldExporter::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub processed: u64,
    pub anomalies: u64,
    /// Bounding box as it was accumulated, before normalization.
    pub bounds: BoundingBox,
    pub grid: GridSize,
    pub regions_written: u64,
}

/// Translates every placed voxel by `-bounds.min()`, so the box lowest corner becomes the origin.
///
/// Empty slots are skipped and logged, but still count as processed. [`Counter::Voxels`] is
/// reported every [`VOXEL_PROGRESS_STEP`] slots and once more at the end, so the last reported
/// value is always the number of slots.
///
/// Fails with [`ExportError::WorldTooLarge`], before touching any voxel, when the bounds are
/// wider than `i32::MAX` on some axis. A voxel outside the given bounds which can't be
/// translated fails with [`ExportError::OutOfBounds`].
pub fn normalize(
    voxels: &mut VoxelSet,
    bounds: &BoundingBox,
    progress: &dyn ProgressObserver,
) -> Result<NormalizeStats, ExportError> {
    if bounds.normalized().is_none() {
        return Err(ExportError::WorldTooLarge { bounds: *bounds });
    }

    let origin = bounds.min();
    let mut stats = NormalizeStats::default();

    progress.begin(Counter::Voxels, voxels.len() as u64);

    for (index, slot) in voxels.slots_mut().iter_mut().enumerate() {
        if let Some(placed) = slot {
            placed.voxel = placed
                .voxel
                .checked_relative_to(origin)
                .ok_or(ExportError::OutOfBounds {
                    voxel: placed.voxel,
                    bounds: *bounds,
                })?;
        } else {
            warn!("[Export] Empty voxel slot {index}. Skipping it.");
            stats.anomalies += 1;
        }

        stats.processed += 1;
        if stats.processed % VOXEL_PROGRESS_STEP == 0 {
            progress.update(Counter::Voxels, stats.processed);
        }
    }

    progress.update(Counter::Voxels, stats.processed);

    Ok(stats)
}

/// Turns a [`SealedWorld`] into region artifacts. Check crate level docs for the whole flow.
#[derive(Debug, Clone, Default)]
pub struct WorldExporter {
    config: ExportConfig,
}

impl WorldExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Normalizes the world, computes the region grid and writes every region cell, in
    /// row-major order, using the given writer.
    ///
    /// The first writer error stops the export and is returned. Regions written before it are
    /// not removed.
    pub fn export<W>(
        &self,
        world: SealedWorld,
        mut writer: W,
        progress: &dyn ProgressObserver,
    ) -> Result<ExportSummary, ExportError>
    where
        W: RegionWriter,
    {
        let (mut voxels, bounds) = world.into_parts();
        let Some(normalized) = bounds.normalized() else {
            warn!("[Export] World bounds {bounds} are too large. Nothing will be written.");
            return Err(ExportError::WorldTooLarge { bounds });
        };

        let output = self.config.output_dir.as_path();
        std::fs::create_dir_all(output)?;

        debug!(
            "[Export] Normalizing {} voxels. Bounds: {bounds}",
            voxels.len()
        );

        let stats = normalize(&mut voxels, &bounds, progress)?;
        if stats.anomalies > 0 {
            warn!("[Export] {} empty voxel slots skipped.", stats.anomalies);
        }

        let grid = GridSize::from_bounds(&bounds);
        let last_chunk = Chunk::from_voxel(normalized.max());
        if !grid.covers(last_chunk) {
            warn!("[Export] Chunk {last_chunk} is outside of grid ({grid}). Its voxels won't be written.");
        }

        let region_count = grid.region_count();
        info!(
            "[Export] Needed regions: {}x{}",
            grid.regions_x, grid.regions_z
        );
        progress.begin(Counter::Regions, region_count);

        let mut regions_written = 0;
        for region in grid.regions() {
            debug!("[Export] Generating region {region}");

            writer
                .write_region(region, &voxels, output, progress)
                .map_err(|source| {
                    warn!("[Export] Failed to write region {region}. Error: {source}");
                    ExportError::RegionWrite {
                        region,
                        source: Box::new(source),
                    }
                })?;

            regions_written += 1;
            progress.update(Counter::Regions, regions_written);
        }

        info!("[Export] {regions_written} regions written to {output:?}");

        Ok(ExportSummary {
            processed: stats.processed,
            anomalies: stats.anomalies,
            bounds,
            grid,
            regions_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::Path};

    use voxmap_core::{BoundsMode, PlacedVoxel, coords::{Region, Voxel}};

    use super::*;
    use crate::{NoProgress, World};

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir()
            .join("voxmap")
            .join(format!("{:#08}", rand::random_range(0..u32::MAX)))
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Disk is full")]
    struct DiskFull;

    /// Records every call and fails on the given call number, if any.
    #[derive(Default)]
    struct MockWriter {
        calls: Vec<Region>,
        voxels: Vec<VoxelSet>,
        fail_at: Option<usize>,
    }

    impl RegionWriter for MockWriter {
        type Error = DiskFull;

        fn write_region(
            &mut self,
            region: Region,
            voxels: &VoxelSet,
            _output: &Path,
            _progress: &dyn ProgressObserver,
        ) -> Result<(), Self::Error> {
            self.calls.push(region);
            self.voxels.push(voxels.clone());

            if self.fail_at == Some(self.calls.len()) {
                Err(DiskFull)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct ProgressLog {
        events: RefCell<Vec<(Counter, Option<u64>, u64)>>,
    }

    impl ProgressLog {
        fn updates(&self, counter: Counter) -> Vec<u64> {
            self.events
                .borrow()
                .iter()
                .filter(|(c, begin, _)| *c == counter && begin.is_none())
                .map(|(_, _, value)| *value)
                .collect()
        }

        fn max(&self, counter: Counter) -> Option<u64> {
            self.events
                .borrow()
                .iter()
                .find(|(c, begin, _)| *c == counter && begin.is_some())
                .and_then(|(_, begin, _)| *begin)
        }
    }

    impl ProgressObserver for ProgressLog {
        fn begin(&self, counter: Counter, max: u64) {
            self.events.borrow_mut().push((counter, Some(max), 0));
        }

        fn update(&self, counter: Counter, value: u64) {
            self.events.borrow_mut().push((counter, None, value));
        }
    }

    fn voxel_set(count: usize) -> VoxelSet {
        (0..count)
            .map(|i| PlacedVoxel::new(Voxel::new(i as i32, 0, 0), "a"))
            .collect()
    }

    #[test]
    fn normalize_progress_reports() {
        let cases: [(usize, &[u64]); 5] = [
            (0, &[0]),
            (1, &[1]),
            (255, &[255]),
            (256, &[256, 256]),
            (257, &[256, 257]),
        ];

        for (total, expected) in cases {
            // Arrange
            let mut voxels = voxel_set(total);
            let progress = ProgressLog::default();

            // Act
            let stats = normalize(&mut voxels, &BoundingBox::default(), &progress).unwrap();

            // Assert
            assert_eq!(stats.processed, total as u64);
            assert_eq!(progress.max(Counter::Voxels), Some(total as u64));
            assert_eq!(progress.updates(Counter::Voxels), expected, "total {total}");
        }
    }

    #[test]
    fn normalize_large_total() {
        let mut voxels = voxel_set(1000);
        let progress = ProgressLog::default();

        normalize(&mut voxels, &BoundingBox::default(), &progress).unwrap();

        assert_eq!(progress.updates(Counter::Voxels), [256, 512, 768, 1000]);
    }

    #[test]
    fn normalize_skips_empty_slots() {
        // Arrange
        let mut voxels: VoxelSet = [
            Some(PlacedVoxel::new(Voxel::new(-5, 3, 2), "a")),
            None,
            Some(PlacedVoxel::new(Voxel::new(0, 4, 2), "b")),
        ]
        .into_iter()
        .collect();
        let bounds = BoundingBox::from_corners(Voxel::new(-5, 3, 2), Voxel::new(0, 4, 2));
        let progress = ProgressLog::default();

        // Act
        let stats = normalize(&mut voxels, &bounds, &progress).unwrap();

        // Assert
        assert_eq!(
            stats,
            NormalizeStats {
                processed: 3,
                anomalies: 1
            }
        );
        assert_eq!(progress.updates(Counter::Voxels), [3]);
        assert_eq!(voxels.slots()[1], None);

        let normalized = voxels.iter().map(|p| p.voxel).collect::<Vec<_>>();
        assert_eq!(normalized, [Voxel::new(0, 0, 0), Voxel::new(5, 1, 0)]);
    }

    #[test]
    fn export_scenario() {
        // Arrange
        let world = World::new();
        world.add_voxel(-5, 0, 0, "a");
        world.add_voxel(0, 0, 0, "b");
        world.add_voxel(10, 0, 20, "c");
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));
        let mut writer = MockWriter::default();

        // Act
        let summary = exporter
            .export(world.seal(), &mut writer, &NoProgress)
            .unwrap();

        // Assert
        assert_eq!(summary.bounds.min(), Voxel::new(-5, 0, 0));
        assert_eq!(summary.bounds.max(), Voxel::new(10, 0, 20));
        assert_eq!(summary.bounds.size(), (15, 0, 20));
        assert_eq!(summary.grid.chunks_x, 1);
        assert_eq!(summary.grid.chunks_z, 2);
        assert_eq!(summary.grid.region_count(), 1);
        assert_eq!(summary.regions_written, 1);
        assert_eq!(writer.calls, [Region::new(0, 0)]);

        let normalized = writer.voxels[0].iter().map(|p| p.voxel).collect::<Vec<_>>();
        assert_eq!(
            normalized,
            [
                Voxel::new(0, 0, 0),
                Voxel::new(5, 0, 0),
                Voxel::new(15, 0, 20)
            ]
        );
    }

    #[test]
    fn export_minimum_becomes_zero() {
        // Arrange
        let world = World::new();
        world.add_voxel(-40, -3, 7, "a");
        world.add_voxel(12, 5, -19, "a");
        world.add_voxel(-1, 0, 0, "a");
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));
        let mut writer = MockWriter::default();

        // Act
        exporter
            .export(world.seal(), &mut writer, &NoProgress)
            .unwrap();

        // Assert
        let min = writer.voxels[0]
            .iter()
            .map(|p| p.voxel)
            .reduce(Voxel::min)
            .unwrap();
        assert_eq!(min, Voxel::ZERO);
    }

    #[test]
    fn export_row_major_order() {
        // Arrange
        let world = World::new();
        // Two regions on X (33 chunks) and three on Z (65 chunks)
        world.add_voxel(33 * 16, 0, 65 * 16, "a");
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));
        let mut writer = MockWriter::default();
        let progress = ProgressLog::default();

        // Act
        let summary = exporter.export(world.seal(), &mut writer, &progress).unwrap();

        // Assert
        assert_eq!(summary.grid.regions_x, 2);
        assert_eq!(summary.grid.regions_z, 3);
        assert_eq!(
            writer.calls,
            [
                Region::new(0, 0),
                Region::new(0, 1),
                Region::new(0, 2),
                Region::new(1, 0),
                Region::new(1, 1),
                Region::new(1, 2),
            ]
        );
        assert_eq!(progress.max(Counter::Regions), Some(6));
        assert_eq!(progress.updates(Counter::Regions), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn export_single_voxel_at_origin() {
        let world = World::new();
        world.add_voxel(0, 0, 0, "a");
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));
        let mut writer = MockWriter::default();

        let summary = exporter
            .export(world.seal(), &mut writer, &NoProgress)
            .unwrap();

        assert_eq!(summary.grid.chunks_x, 1);
        assert_eq!(summary.grid.chunks_z, 1);
        assert_eq!(writer.calls, [Region::new(0, 0)]);
    }

    #[test]
    fn export_counts_anomalies() {
        let world = World::new();
        world.add_voxel(1, 1, 1, "a");
        world.add_slot(Voxel::new(2, 2, 2), None);
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));

        let summary = exporter
            .export(world.seal(), MockWriter::default(), &NoProgress)
            .unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.anomalies, 1);
    }

    #[test]
    fn export_halts_on_writer_failure() {
        // Arrange
        let world = World::new();
        // Three regions on Z, one on X
        world.add_voxel(0, 0, 65 * 16, "a");
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));
        let mut writer = MockWriter {
            fail_at: Some(2),
            ..Default::default()
        };
        let progress = ProgressLog::default();

        // Act
        let res = exporter.export(world.seal(), &mut writer, &progress);

        // Assert
        match res {
            Err(ExportError::RegionWrite { region, source }) => {
                assert_eq!(region, Region::new(0, 1));
                assert_eq!(source.to_string(), "Disk is full");
            }
            other => panic!("Expected region write error, got {other:?}"),
        }
        assert_eq!(writer.calls, [Region::new(0, 0), Region::new(0, 1)]);
        assert_eq!(progress.max(Counter::Regions), Some(3));
        assert_eq!(progress.updates(Counter::Regions), [1]);
    }

    #[test]
    fn export_creates_output_dir() {
        let output = temp_dir().join("nested");
        let exporter = WorldExporter::new(ExportConfig::new(&output));

        exporter
            .export(World::new().seal(), MockWriter::default(), &NoProgress)
            .unwrap();

        assert!(output.is_dir());
    }

    fn min_voxel(voxels: &VoxelSet) -> Voxel {
        voxels.iter().map(|p| p.voxel).reduce(Voxel::min).unwrap()
    }

    #[test]
    fn export_tight_world_starts_at_origin() {
        // Arrange
        let tight = World::with_bounds_mode(BoundsMode::Tight);
        let origin_inclusive = World::new();
        for world in [&tight, &origin_inclusive] {
            world.add_voxel(100, 200, 300, "a");
            world.add_voxel(150, 201, 330, "b");
        }
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));
        let mut tight_writer = MockWriter::default();
        let mut origin_writer = MockWriter::default();

        // Act
        let tight_summary = exporter
            .export(tight.seal(), &mut tight_writer, &NoProgress)
            .unwrap();
        let origin_summary = exporter
            .export(origin_inclusive.seal(), &mut origin_writer, &NoProgress)
            .unwrap();

        // Assert
        assert_eq!(min_voxel(&tight_writer.voxels[0]), Voxel::ZERO);
        assert_eq!(tight_summary.bounds.size(), (50, 1, 30));
        assert_eq!(tight_summary.grid.chunks_x, 4);
        assert_eq!(tight_summary.grid.chunks_z, 2);
        assert_eq!(tight_summary.grid.region_count(), 1);
        assert_eq!(tight_writer.calls, [Region::new(0, 0)]);

        assert_eq!(
            min_voxel(&origin_writer.voxels[0]),
            Voxel::new(100, 200, 300),
            "Origin is part of the box, so voxels aren't moved"
        );
        assert_eq!(origin_summary.grid.chunks_x, 10);
        assert_eq!(origin_summary.grid.chunks_z, 21);
    }

    #[test]
    fn normalize_rejects_too_wide_bounds() {
        // Arrange
        let mut voxels: VoxelSet = [
            PlacedVoxel::new(Voxel::new(-2_000_000_000, 0, 0), "a"),
            PlacedVoxel::new(Voxel::new(2_000_000_000, 0, 0), "b"),
        ]
        .into_iter()
        .collect();
        let bounds = BoundingBox::from_corners(
            Voxel::new(-2_000_000_000, 0, 0),
            Voxel::new(2_000_000_000, 0, 0),
        );
        let progress = ProgressLog::default();

        // Act
        let res = normalize(&mut voxels, &bounds, &progress);

        // Assert
        assert!(matches!(res, Err(ExportError::WorldTooLarge { .. })));
        assert_eq!(min_voxel(&voxels), Voxel::new(-2_000_000_000, 0, 0), "Untouched");
        assert!(progress.events.borrow().is_empty());
    }

    #[test]
    fn normalize_rejects_voxel_outside_bounds() {
        let mut voxels: VoxelSet = [PlacedVoxel::new(Voxel::new(i32::MIN, 0, 0), "a")]
            .into_iter()
            .collect();
        let bounds = BoundingBox::from_corners(Voxel::new(1, 0, 0), Voxel::new(5, 0, 0));

        let res = normalize(&mut voxels, &bounds, &NoProgress);

        assert!(matches!(res, Err(ExportError::OutOfBounds { voxel, .. }) if voxel.x == i32::MIN));
    }

    #[test]
    fn export_too_wide_world_writes_nothing() {
        let wide = World::new();
        wide.add_voxel(-2_000_000_000, 0, 0, "a");
        wide.add_voxel(2_000_000_000, 0, 0, "b");
        let lowest = World::new();
        lowest.add_voxel(i32::MIN, 0, 0, "a");

        for world in [wide, lowest] {
            // Arrange
            let output = temp_dir();
            let exporter = WorldExporter::new(ExportConfig::new(&output));
            let mut writer = MockWriter::default();

            // Act
            let res = exporter.export(world.seal(), &mut writer, &NoProgress);

            // Assert
            assert!(matches!(res, Err(ExportError::WorldTooLarge { .. })), "{res:?}");
            assert!(writer.calls.is_empty());
            assert!(!output.exists());
        }
    }

    #[test]
    fn export_tight_world_at_lowest_coordinate() {
        let world = World::with_bounds_mode(BoundsMode::Tight);
        world.add_voxel(i32::MIN, i32::MIN, i32::MIN, "a");
        world.add_voxel(i32::MIN + 20, i32::MIN, i32::MIN, "b");
        let exporter = WorldExporter::new(ExportConfig::new(temp_dir()));
        let mut writer = MockWriter::default();

        let summary = exporter
            .export(world.seal(), &mut writer, &NoProgress)
            .unwrap();

        let normalized = writer.voxels[0].iter().map(|p| p.voxel).collect::<Vec<_>>();
        assert_eq!(normalized, [Voxel::ZERO, Voxel::new(20, 0, 0)]);
        assert_eq!(summary.grid.chunks_x, 2);
    }
}
