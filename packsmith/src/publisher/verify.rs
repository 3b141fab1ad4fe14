//! Integrity verification of published archives against the manifest.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::checksum::calculate_sha256;
use super::manifest::{Manifest, ManifestEntry};
use super::{PublishError, PublishResult};

/// Result of checking every entry in a manifest.
#[derive(Debug, Default)]
pub struct VerificationReport {
    /// Entries whose archive matched size and digest, as `(region, version_key)`.
    pub verified: Vec<(String, String)>,

    /// Entries that failed, with the reason.
    pub problems: Vec<(String, String, PublishError)>,
}

impl VerificationReport {
    /// Whether every entry verified.
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    /// Number of entries checked.
    pub fn total(&self) -> usize {
        self.verified.len() + self.problems.len()
    }
}

/// Resolve a manifest-relative, `/`-separated path under `packs_dir`.
///
/// Returns `None` when a component could leave `packs_dir` (`..` or an
/// embedded `\`).
pub fn resolve_entry_path(packs_dir: &Path, entry: &ManifestEntry) -> Option<PathBuf> {
    let mut path = packs_dir.to_path_buf();
    for part in entry.path.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            _ if part.contains('\\') => return None,
            _ => path.push(part),
        }
    }
    Some(path)
}

/// Check one entry's archive: it must exist with the recorded size and digest.
pub fn verify_entry(
    packs_dir: &Path,
    region: &str,
    version_key: &str,
    entry: &ManifestEntry,
) -> PublishResult<()> {
    let path = resolve_entry_path(packs_dir, entry).ok_or_else(|| {
        PublishError::UnsafeEntryPath {
            region: region.to_string(),
            version_key: version_key.to_string(),
            path: entry.path.clone(),
        }
    })?;

    let metadata = match fs::metadata(&path) {
        Ok(m) if m.is_file() => m,
        _ => {
            return Err(PublishError::ArchiveMissing {
                region: region.to_string(),
                version_key: version_key.to_string(),
                path,
            })
        }
    };

    // Size is cheap to check before hashing the whole file
    if metadata.len() != entry.size {
        return Err(PublishError::SizeMismatch {
            file: path,
            expected: entry.size,
            actual: metadata.len(),
        });
    }

    let actual = calculate_sha256(&path)?;
    if !actual.eq_ignore_ascii_case(&entry.sha256) {
        return Err(PublishError::ChecksumMismatch {
            file: path,
            expected: entry.sha256.clone(),
            actual,
        });
    }

    Ok(())
}

/// Verify every entry of `manifest` against archives under `packs_dir`.
///
/// Individual failures are collected rather than aborting the run.
pub fn verify_manifest(packs_dir: &Path, manifest: &Manifest) -> VerificationReport {
    let mut report = VerificationReport::default();

    for (region, version_key, entry) in manifest.entries() {
        match verify_entry(packs_dir, region, version_key, entry) {
            Ok(()) => {
                debug!(region, version_key, "Archive verified");
                report
                    .verified
                    .push((region.to_string(), version_key.to_string()));
            }
            Err(e) => {
                warn!(region, version_key, error = %e, "Archive failed verification");
                report
                    .problems
                    .push((region.to_string(), version_key.to_string(), e));
            }
        }
    }

    report
}
