//! Centralized pack naming conventions.
//!
//! This module is the single source of truth for pack naming:
//! - Pack directory names (e.g., `IL_2020_pack`)
//! - Manifest version keys (e.g., `IL_2020`)
//! - Archive filenames (e.g., `IL_2020_pack.zip`)
//! - Manifest-relative archive paths (e.g., `IL/IL_2020_pack.zip`)
//!
//! All other modules should use these functions rather than constructing names directly.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Human-readable form of the expected pack directory pattern.
pub const PACK_NAME_PATTERN: &str = "XX_YYYY_pack";

/// Example of a valid pack directory name.
pub const PACK_NAME_EXAMPLE: &str = "IL_2020_pack";

/// File extension of published pack archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// A pack directory name that does not follow `<REGION>_<YEAR>_pack`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackNameError {
    /// The rejected name.
    pub name: String,
}

impl fmt::Display for PackNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' does not match expected pattern '{}' (e.g., {})",
            self.name, PACK_NAME_PATTERN, PACK_NAME_EXAMPLE
        )
    }
}

impl std::error::Error for PackNameError {}

/// Get the pack directory name regex.
///
/// We capture:
/// - Group 1: region code (one or more uppercase ASCII letters)
/// - Group 2: year (one or more ASCII digits)
fn pack_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Z]+)_([0-9]+)_pack$").unwrap())
}

/// Identity of a pack, parsed from its directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackIdentifier {
    region: String,
    year: String,
    dir_name: String,
}

impl PackIdentifier {
    /// Parse a pack directory name.
    ///
    /// The whole name must match `^[A-Z]+_[0-9]+_pack$`. No normalization is
    /// applied, so lowercase region codes are rejected rather than upcased.
    ///
    /// # Examples
    ///
    /// ```
    /// use packsmith::package::PackIdentifier;
    ///
    /// let id = PackIdentifier::parse("IL_2020_pack").unwrap();
    /// assert_eq!(id.region(), "IL");
    /// assert_eq!(id.version_key(), "IL_2020");
    ///
    /// assert!(PackIdentifier::parse("il_2020_pack").is_err());
    /// assert!(PackIdentifier::parse("IL_2020_pack.old").is_err());
    /// ```
    pub fn parse(dir_name: &str) -> Result<Self, PackNameError> {
        let captures = pack_pattern()
            .captures(dir_name)
            .ok_or_else(|| PackNameError {
                name: dir_name.to_string(),
            })?;

        Ok(Self {
            region: captures[1].to_string(),
            year: captures[2].to_string(),
            dir_name: dir_name.to_string(),
        })
    }

    /// Region code (e.g., `IL`).
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Release year as written in the directory name (e.g., `2020`).
    pub fn year(&self) -> &str {
        &self.year
    }

    /// The original directory name (e.g., `IL_2020_pack`).
    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }

    /// Manifest version key: `<REGION>_<YEAR>`.
    pub fn version_key(&self) -> String {
        format!("{}_{}", self.region, self.year)
    }

    /// Archive filename: `<REGION>_<YEAR>_pack.zip`.
    pub fn archive_filename(&self) -> String {
        format!("{}.{}", self.dir_name, ARCHIVE_EXTENSION)
    }

    /// Archive path relative to the packs directory, always `/`-separated.
    ///
    /// This is the value recorded in the manifest so it stays portable
    /// across platforms.
    pub fn manifest_path(&self) -> String {
        format!("{}/{}", self.region, self.archive_filename())
    }
}

impl fmt::Display for PackIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name)
    }
}
