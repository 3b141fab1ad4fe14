//! Interfaces of the external pack-builder and map-loader.
//!
//! Pack construction (fetching source geodata, computing derived structures,
//! writing pack contents) and pack loading live outside this crate. The batch
//! pipeline only sees these two fallible calls.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reported by the external collaborators.
///
/// These never escape a build task; they are downgraded to a failed
/// [`BuildOutcome`](super::BuildOutcome).
#[derive(Debug, Error)]
pub enum BuildError {
    /// The pack-builder reported a failure.
    #[error("{0}")]
    PackBuild(String),

    /// The map-loader could not load the built pack.
    #[error("{0}")]
    MapLoad(String),

    /// An external program could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Short error type name used in outcome details.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::PackBuild(_) => "PackBuildError",
            BuildError::MapLoad(_) => "MapLoadError",
            BuildError::Spawn { .. } => "SpawnError",
        }
    }

    /// One-line `<ErrorType>: <message>` summary.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

/// Opaque handle to a loaded map.
///
/// Build tasks only use it to prove the pack loads; it is dropped right away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapHandle {
    pack_path: PathBuf,
}

impl MapHandle {
    /// Create a handle for a loaded pack.
    pub fn new(pack_path: impl Into<PathBuf>) -> Self {
        Self {
            pack_path: pack_path.into(),
        }
    }

    /// Pack the map was loaded from.
    pub fn pack_path(&self) -> &Path {
        &self.pack_path
    }
}

/// Builds the pack for one region.
///
/// Implementations may block on network and disk I/O; the orchestrator runs
/// them on the blocking thread pool.
pub trait PackBuilder: Send + Sync + 'static {
    /// Build the pack for `region_code` under `output_dir`.
    ///
    /// Returns the path of the built pack.
    fn build_pack(
        &self,
        region_code: &str,
        output_dir: &Path,
        verbosity: u8,
    ) -> Result<PathBuf, BuildError>;
}

/// Loads a built pack into an in-memory map.
pub trait MapLoader: Send + Sync + 'static {
    /// Load the pack at `pack_path`.
    fn load_map(&self, pack_path: &Path) -> Result<MapHandle, BuildError>;
}
