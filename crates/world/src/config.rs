use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::trace;
use voxmap_core::BoundsMode;

use crate::{ExportError, World};

/// Settings of an export. Can be loaded from a ron file:
///
/// ```ron
/// (
///     output_dir: "out/region",
///     bounds_mode: Tight,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory where region artifacts are written. Created if it doesn't exists.
    pub output_dir: PathBuf,
    /// How the [`World`] created by [`ExportConfig::new_world`] initializes its bounding box.
    pub bounds_mode: BoundsMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("region"),
            bounds_mode: BoundsMode::default(),
        }
    }
}

impl ExportConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn from_ron(text: &str) -> Result<Self, ExportError> {
        Ok(ron::from_str(text)?)
    }

    /// Loads the config from a ron file. The reading operation is thread-blocking.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        trace!("Loading export config on path {:?}", path.as_ref().as_os_str());

        let file = std::fs::File::open(path)?;
        Ok(ron::de::from_reader(file)?)
    }

    /// Creates an empty world which follows this config.
    pub fn new_world(&self) -> World {
        World::with_bounds_mode(self.bounds_mode)
    }
}
