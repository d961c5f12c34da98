use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use voxmap_core::{
    BlockId, BlockResolver, BoundingBox, BoundsMode, PlacedVoxel, Rgb, VoxelSet, VoxelSlot,
    coords::Voxel,
};

/// Voxels and the box around them. Always changed together, under the same lock.
#[derive(Debug, Default)]
struct WorldData {
    voxels: VoxelSet,
    bounds: BoundingBox,
}

/// Thread-safe voxel accumulator.
///
/// Any number of producers may add voxels at the same time. Each add appends the voxel and widens
/// the [`BoundingBox`] in a single critical section, so the box is never observed without the
/// voxel which widened it, or the other way around.
///
/// The voxels themselves can't be read while accumulating. To export them, [`World::seal`] the
/// world first.
#[derive(Debug, Default)]
pub struct World {
    data: Mutex<WorldData>,
}

impl World {
    /// Creates an empty world, with an origin-inclusive bounding box.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds_mode(mode: BoundsMode) -> Self {
        Self {
            data: Mutex::new(WorldData {
                voxels: VoxelSet::new(),
                bounds: BoundingBox::new(mode),
            }),
        }
    }

    /// Adds a voxel with the given block at the given coordinates. This never fails.
    pub fn add_voxel(&self, x: i32, y: i32, z: i32, block: impl Into<BlockId>) {
        self.add_slot(Voxel::new(x, y, z), Some(block.into()));
    }

    /// Adds a voxel which may have no block.
    ///
    /// A voxel without block is stored as an empty slot. It doesn't widen the bounding box and
    /// is reported as an anomaly when the world is exported.
    pub fn add_slot(&self, voxel: Voxel, block: Option<BlockId>) {
        let slot: VoxelSlot = block.map(|block| PlacedVoxel { voxel, block });

        let mut data = self.data.lock();
        if let Some(placed) = &slot {
            data.bounds.include(placed.voxel);
        } else {
            trace!("Voxel {voxel} has no block. Storing an empty slot");
        }
        data.voxels.push(slot);
    }

    /// Resolves the block for the given color and material and adds the voxel.
    ///
    /// Resolution happens before the world is locked, so a slow resolver doesn't block other
    /// producers.
    pub fn add_resolved<R>(&self, voxel: Voxel, resolver: &R, color: Rgb, material: &str)
    where
        R: BlockResolver + ?Sized,
    {
        let block = resolver.resolve(color, material);
        self.add_slot(voxel, block);
    }

    /// Number of slots added so far, including empty ones.
    pub fn len(&self) -> usize {
        self.data.lock().voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().voxels.is_empty()
    }

    /// A snapshot of the current bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.data.lock().bounds
    }

    /// Stops accumulation. The returned [`SealedWorld`] can only be exported.
    pub fn seal(self) -> SealedWorld {
        let WorldData { voxels, bounds } = self.data.into_inner();
        trace!("World sealed with {} slots. Bounds: {bounds}", voxels.len());

        SealedWorld { voxels, bounds }
    }

    /// Seals a shared world. Fails, giving the handle back, if any other handle is still alive,
    /// since that handle could still add voxels.
    pub fn seal_shared(world: Arc<World>) -> Result<SealedWorld, Arc<World>> {
        Arc::try_unwrap(world).map(World::seal)
    }
}

/// A world which can't receive voxels anymore. Check [`World::seal`].
#[derive(Debug)]
pub struct SealedWorld {
    voxels: VoxelSet,
    bounds: BoundingBox,
}

impl SealedWorld {
    pub fn voxels(&self) -> &VoxelSet {
        &self.voxels
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn into_parts(self) -> (VoxelSet, BoundingBox) {
        (self.voxels, self.bounds)
    }
}
