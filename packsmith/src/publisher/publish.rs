//! Publishing a pack directory as a manifest-tracked archive.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use super::archive::build_archive;
use super::checksum::calculate_sha256;
use super::manifest::{default_manifest_path, Manifest, ManifestEntry};
use super::{PublishError, PublishResult};
use crate::package::{PackIdentifier, PackNameError};

/// Default output directory for published archives.
pub const DEFAULT_PACKS_DIR: &str = "packs";

/// Outcome of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Parsed pack identity.
    pub identifier: PackIdentifier,

    /// Path of the written archive.
    pub archive_path: PathBuf,

    /// Manifest file that was updated.
    pub manifest_path: PathBuf,

    /// Entry recorded in the manifest.
    pub entry: ManifestEntry,

    /// Entry that was overwritten, if this pack had been published before.
    pub replaced: Option<ManifestEntry>,
}

impl PublishReport {
    /// Archive size in bytes.
    pub fn size(&self) -> u64 {
        self.entry.size
    }

    /// Archive SHA-256, lowercase hex.
    pub fn sha256(&self) -> &str {
        &self.entry.sha256
    }

    /// Whether the archive content differs from the entry it replaced.
    ///
    /// `false` for a first publish.
    pub fn content_changed(&self) -> bool {
        self.replaced
            .as_ref()
            .is_some_and(|prev| prev.sha256 != self.entry.sha256)
    }
}

/// Publishes pack directories into a packs directory and its manifest.
///
/// Layout produced under `packs_dir`:
///
/// ```text
/// packs/
/// ├── manifest.json
/// └── IL/
///     └── IL_2020_pack.zip
/// ```
#[derive(Debug, Clone)]
pub struct PackPublisher {
    packs_dir: PathBuf,
    manifest_path: PathBuf,
}

impl PackPublisher {
    /// Create a publisher writing into `packs_dir` with the default manifest
    /// location (`<packs_dir>/manifest.json`).
    pub fn new(packs_dir: impl Into<PathBuf>) -> Self {
        let packs_dir = packs_dir.into();
        let manifest_path = default_manifest_path(&packs_dir);
        Self {
            packs_dir,
            manifest_path,
        }
    }

    /// Override the manifest location.
    pub fn with_manifest_path(mut self, manifest_path: impl Into<PathBuf>) -> Self {
        self.manifest_path = manifest_path.into();
        self
    }

    /// Output directory for archives.
    pub fn packs_dir(&self) -> &Path {
        &self.packs_dir
    }

    /// Manifest file updated by [`publish`](Self::publish).
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Archive destination for a pack.
    pub fn archive_path(&self, identifier: &PackIdentifier) -> PathBuf {
        self.packs_dir
            .join(identifier.region())
            .join(identifier.archive_filename())
    }

    /// Archive a pack directory and record it in the manifest.
    ///
    /// The directory name is validated before anything touches the disk.
    /// Saving the manifest is the last fallible step, so on any error the
    /// manifest is left exactly as it was.
    #[instrument(skip(self, pack_dir), fields(pack = %pack_dir.display()))]
    pub fn publish(&self, pack_dir: &Path) -> PublishResult<PublishReport> {
        let identifier = identify(pack_dir)?;

        if !pack_dir.is_dir() {
            return Err(PublishError::NotADirectory(pack_dir.to_path_buf()));
        }

        let archive_path = self.archive_path(&identifier);
        let archive = build_archive(pack_dir, &archive_path)?;
        let sha256 = calculate_sha256(&archive.path)?;

        info!(
            archive = %archive.path.display(),
            files = archive.file_count,
            size = archive.size,
            sha256 = %sha256,
            "Pack archived"
        );

        let entry = ManifestEntry::new(identifier.manifest_path(), sha256, archive.size);

        let mut manifest = Manifest::load(&self.manifest_path)?;
        let replaced = manifest.merge(
            identifier.region(),
            &identifier.version_key(),
            entry.clone(),
        );
        manifest.save(&self.manifest_path)?;

        info!(
            manifest = %self.manifest_path.display(),
            region = identifier.region(),
            version_key = %identifier.version_key(),
            replaced = replaced.is_some(),
            "Manifest updated"
        );

        Ok(PublishReport {
            identifier,
            archive_path: archive.path,
            manifest_path: self.manifest_path.clone(),
            entry,
            replaced,
        })
    }
}

impl Default for PackPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_PACKS_DIR)
    }
}

/// Parse the identity of a pack from the last component of its path.
fn identify(pack_dir: &Path) -> PublishResult<PackIdentifier> {
    let name = pack_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PackNameError {
            name: pack_dir.display().to_string(),
        })?;

    Ok(PackIdentifier::parse(name)?)
}
