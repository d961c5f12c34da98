//! Accumulates voxels from many producers and exports them as a grid of regions.
//!
//! The flow is:
//! 1. Producers call [`World::add_voxel`] (or [`World::add_resolved`]) concurrently;
//! 2. Once production is done, the world is sealed into a [`SealedWorld`], which can't receive
//!    voxels anymore;
//! 3. [`WorldExporter::export`] normalizes the voxels to a zero-based origin, computes how many
//!    regions are needed and hands each region cell to a [`RegionWriter`].
mod config;
mod error;
mod export;
mod progress;
mod world;
mod writer;

pub use config::ExportConfig;
pub use error::ExportError;
pub use export::{ExportSummary, NormalizeStats, VOXEL_PROGRESS_STEP, WorldExporter, normalize};
pub use progress::{Counter, NoProgress, ProgressCounters, ProgressObserver, ProgressSnapshot};
pub use world::{SealedWorld, World};
pub use writer::RegionWriter;
