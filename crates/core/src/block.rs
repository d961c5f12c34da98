use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coords::Voxel;

/// Opaque block identifier, like `minecraft:stone`.
///
/// The format is owned by whoever resolves it, so no validation is done here. Cloning is cheap,
/// since the same identifier is usually shared by many voxels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(Arc<str>);

impl BlockId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl AsRef<str> for BlockId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A voxel placed in the world along with the block it should become.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedVoxel {
    pub voxel: Voxel,
    pub block: BlockId,
}

impl PlacedVoxel {
    pub fn new(voxel: Voxel, block: impl Into<BlockId>) -> Self {
        Self {
            voxel,
            block: block.into(),
        }
    }
}

/// A single entry of a [`VoxelSet`]. An empty slot means a voxel was offered without a block,
/// which is a data anomaly reported at export time.
pub type VoxelSlot = Option<PlacedVoxel>;

/// Ordered collection of [`VoxelSlot`]s, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoxelSet {
    slots: Vec<VoxelSlot>,
}

impl VoxelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slot: VoxelSlot) {
        self.slots.push(slot);
    }

    /// Number of slots, including empty ones.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Counts how many slots have no voxel.
    pub fn empty_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    pub fn slots(&self) -> &[VoxelSlot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [VoxelSlot] {
        &mut self.slots
    }

    /// Iterates over all placed voxels, skipping empty slots.
    pub fn iter(&self) -> impl Iterator<Item = &PlacedVoxel> {
        self.slots.iter().flatten()
    }
}

impl FromIterator<VoxelSlot> for VoxelSet {
    fn from_iter<T: IntoIterator<Item = VoxelSlot>>(iter: T) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<PlacedVoxel> for VoxelSet {
    fn from_iter<T: IntoIterator<Item = PlacedVoxel>>(iter: T) -> Self {
        iter.into_iter().map(Some).collect()
    }
}
