mod chunk;
mod region;
mod voxel;

pub use chunk::*;
pub use region::*;
pub use voxel::*;
