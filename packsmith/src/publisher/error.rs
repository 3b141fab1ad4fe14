//! Error types for the publisher module.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::package::PackNameError;

/// Result type for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur during publishing operations.
#[derive(Debug)]
pub enum PublishError {
    /// Pack directory name does not follow `<REGION>_<YEAR>_pack`.
    InvalidPackName(PackNameError),

    /// Pack path is missing or not a directory.
    NotADirectory(PathBuf),

    /// Failed to create directory.
    CreateDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read file.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Archive building failed.
    ArchiveFailed {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    /// Manifest document exists but is not a well-formed manifest.
    ManifestCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Manifest could not be serialized.
    ManifestSerialize(serde_json::Error),

    /// Manifest entry has no archive on disk.
    ArchiveMissing {
        region: String,
        version_key: String,
        path: PathBuf,
    },

    /// Manifest entry path points outside the packs directory.
    UnsafeEntryPath {
        region: String,
        version_key: String,
        path: String,
    },

    /// Checksum verification failed.
    ChecksumMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    /// Recorded size does not match the archive on disk.
    SizeMismatch {
        file: PathBuf,
        expected: u64,
        actual: u64,
    },
}

impl PublishError {
    /// Whether this error stems from bad input shape rather than I/O.
    ///
    /// Configuration errors are reported before any file is touched.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PublishError::InvalidPackName(_) | PublishError::NotADirectory(_)
        )
    }
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::InvalidPackName(e) => write!(f, "{}", e),
            PublishError::NotADirectory(path) => {
                write!(f, "{} is not a directory", path.display())
            }
            PublishError::CreateDirectoryFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            PublishError::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            PublishError::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            PublishError::ArchiveFailed { path, source } => {
                write!(f, "failed to build archive {}: {}", path.display(), source)
            }
            PublishError::ManifestCorrupt { path, source } => {
                write!(f, "manifest {} is corrupt: {}", path.display(), source)
            }
            PublishError::ManifestSerialize(e) => {
                write!(f, "failed to serialize manifest: {}", e)
            }
            PublishError::ArchiveMissing {
                region,
                version_key,
                path,
            } => {
                write!(
                    f,
                    "archive for {}/{} is missing: {}",
                    region,
                    version_key,
                    path.display()
                )
            }
            PublishError::UnsafeEntryPath {
                region,
                version_key,
                path,
            } => {
                write!(
                    f,
                    "path for {}/{} escapes the packs directory: {}",
                    region, version_key, path
                )
            }
            PublishError::ChecksumMismatch {
                file,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "checksum mismatch for {}: expected {}, got {}",
                    file.display(),
                    expected,
                    actual
                )
            }
            PublishError::SizeMismatch {
                file,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "size mismatch for {}: expected {} bytes, got {} bytes",
                    file.display(),
                    expected,
                    actual
                )
            }
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::InvalidPackName(e) => Some(e),
            PublishError::CreateDirectoryFailed { source, .. } => Some(source),
            PublishError::ReadFailed { source, .. } => Some(source),
            PublishError::WriteFailed { source, .. } => Some(source),
            PublishError::ArchiveFailed { source, .. } => Some(source),
            PublishError::ManifestCorrupt { source, .. } => Some(source),
            PublishError::ManifestSerialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PackNameError> for PublishError {
    fn from(e: PackNameError) -> Self {
        PublishError::InvalidPackName(e)
    }
}
