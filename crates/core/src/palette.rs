//! Maps a color sample and a material tag into a [`BlockId`].
//!
//! The [`Palette`] is described in a ron file like this:
//!
//! ```ron
//! (
//!     blocks: [
//!         (id: "minecraft:white_wool", color: (233, 236, 236)),
//!         (id: "minecraft:glass", color: (175, 213, 219), materials: ["glass"]),
//!     ],
//! )
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::block::BlockId;

/// Errors which can happen while loading a [`Palette`].
#[derive(Debug, Error)]
pub enum PaletteError {
    /// A general IO error happened while reading the palette file.
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    /// The palette file isn't a valid ron document.
    #[error("Failed to parse palette: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Palette has no block at all, so nothing could ever be resolved.
    #[error("Palette has no blocks")]
    Empty,
}

/// Color sample in 8-bit RGB.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Squared euclidean distance between two colors.
    #[inline]
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let d = |a: u8, b: u8| (a as i32 - b as i32).pow(2) as u32;
        d(self.0, other.0) + d(self.1, other.1) + d(self.2, other.2)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from(value: (u8, u8, u8)) -> Self {
        Self(value.0, value.1, value.2)
    }
}

/// Resolves the block a voxel should become.
///
/// Producers call this concurrently while building a world, so implementations must be
/// thread-safe. `None` means there is no suitable block, which ends up as an empty slot.
pub trait BlockResolver: Send + Sync {
    fn resolve(&self, color: Rgb, material: &str) -> Option<BlockId>;
}

impl<F> BlockResolver for F
where
    F: Fn(Rgb, &str) -> Option<BlockId> + Send + Sync,
{
    fn resolve(&self, color: Rgb, material: &str) -> Option<BlockId> {
        self(color, material)
    }
}

/// A block available on the [`Palette`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub id: BlockId,
    pub color: Rgb,
    /// Material tags this block can be used for. Empty means any material.
    #[serde(default)]
    pub materials: Vec<String>,
}

impl PaletteEntry {
    fn accepts(&self, material: &str) -> bool {
        self.materials.is_empty() || self.materials.iter().any(|m| m == material)
    }
}

/// Nearest color block resolver. Check module docs for the file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub blocks: Vec<PaletteEntry>,
}

impl Palette {
    pub fn new(blocks: Vec<PaletteEntry>) -> Result<Self, PaletteError> {
        if blocks.is_empty() {
            return Err(PaletteError::Empty);
        }

        Ok(Self { blocks })
    }

    /// Parses a palette from a ron string.
    pub fn from_ron(text: &str) -> Result<Self, PaletteError> {
        let palette: Palette = ron::from_str(text)?;
        Self::new(palette.blocks)
    }

    /// Loads a palette from a ron file. The reading operation is thread-blocking.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PaletteError> {
        trace!("Loading palette on path {:?}", path.as_ref().as_os_str());

        let file = std::fs::File::open(&path)?;
        let palette: Palette = ron::de::from_reader(file)?;
        Self::new(palette.blocks)
    }
}

impl BlockResolver for Palette {
    fn resolve(&self, color: Rgb, material: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .filter(|entry| entry.accepts(material))
            .min_by_key(|entry| entry.color.distance_sq(color))
            .map(|entry| entry.id.clone())
    }
}
