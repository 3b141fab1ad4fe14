//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and a `run`
//! handler.
//!
//! # Command Modules
//!
//! - [`publish`] - Archive one pack directory and update the manifest
//! - [`build`] - Batch pack builds
//! - [`verify`] - Check published archives against the manifest
//! - [`list`] - Show manifest contents

pub mod build;
pub mod list;
pub mod publish;
pub mod verify;

use std::path::{Path, PathBuf};

use packsmith::publisher::default_manifest_path;

/// Manifest location, defaulting to `<packs_dir>/manifest.json`.
pub fn manifest_path(packs_dir: &Path, manifest: Option<&Path>) -> PathBuf {
    manifest
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_manifest_path(packs_dir))
}
