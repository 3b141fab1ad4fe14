//! Manifest of published packs.
//!
//! The manifest is a two-level JSON document indexed by region code and then
//! version key:
//!
//! ```json
//! {
//!   "IL": {
//!     "IL_2020": {
//!       "path": "IL/IL_2020_pack.zip",
//!       "sha256": "...",
//!       "size": 123456789
//!     }
//!   }
//! }
//! ```
//!
//! Keys are always written sorted with two-space indentation and a trailing
//! newline so that version-control diffs stay minimal.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PublishError, PublishResult};

/// Manifest filename inside the packs directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Default manifest location for a packs directory.
pub fn default_manifest_path(packs_dir: &Path) -> PathBuf {
    packs_dir.join(MANIFEST_FILENAME)
}

/// A single published archive.
///
/// Fields this crate does not model (mirror URLs, notes) are kept in
/// `extra` so a load-merge-save cycle leaves other entries untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Archive path relative to the packs directory, `/`-separated.
    pub path: String,

    /// SHA-256 of the archive, lowercase hex.
    pub sha256: String,

    /// Archive size in bytes.
    pub size: u64,

    /// Unrecognized fields, written back as found.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ManifestEntry {
    /// Create a new entry.
    pub fn new(path: impl Into<String>, sha256: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            sha256: sha256.into(),
            size,
            extra: BTreeMap::new(),
        }
    }
}

/// The full manifest: `region -> version_key -> entry`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    regions: BTreeMap<String, BTreeMap<String, ManifestEntry>>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest from disk.
    ///
    /// A missing file yields an empty manifest (first publish). A file that is
    /// not a well-formed manifest is reported as [`PublishError::ManifestCorrupt`].
    pub fn load(path: &Path) -> PublishResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|e| PublishError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| PublishError::ManifestCorrupt {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Insert or replace the entry for `(region, version_key)`.
    ///
    /// The region level is created if absent. Returns the replaced entry, if
    /// any; no history is kept.
    pub fn merge(
        &mut self,
        region: &str,
        version_key: &str,
        entry: ManifestEntry,
    ) -> Option<ManifestEntry> {
        self.regions
            .entry(region.to_string())
            .or_default()
            .insert(version_key.to_string(), entry)
    }

    /// Look up an entry.
    pub fn get(&self, region: &str, version_key: &str) -> Option<&ManifestEntry> {
        self.regions.get(region)?.get(version_key)
    }

    /// Iterate all entries as `(region, version_key, entry)` in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &ManifestEntry)> {
        self.regions.iter().flat_map(|(region, versions)| {
            versions
                .iter()
                .map(move |(key, entry)| (region.as_str(), key.as_str(), entry))
        })
    }

    /// Region codes present in the manifest, sorted.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Total number of entries across all regions.
    pub fn len(&self) -> usize {
        self.regions.values().map(BTreeMap::len).sum()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize in canonical form: sorted keys, two-space indent, trailing newline.
    pub fn to_json_string(&self) -> PublishResult<String> {
        // Going through `Value` sorts the flattened extra fields together
        // with the modelled ones.
        let value = serde_json::to_value(self).map_err(PublishError::ManifestSerialize)?;
        let mut content =
            serde_json::to_string_pretty(&value).map_err(PublishError::ManifestSerialize)?;
        content.push('\n');
        Ok(content)
    }

    /// Save the manifest, creating parent directories as needed.
    ///
    /// The document is written to a temporary sibling and renamed over the
    /// target, so readers never observe a half-written manifest. Concurrent
    /// writers are not coordinated.
    pub fn save(&self, path: &Path) -> PublishResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PublishError::CreateDirectoryFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let content = self.to_json_string()?;
        let tmp_path = tmp_path(path);
        fs::write(&tmp_path, content).map_err(|e| PublishError::WriteFailed {
            path: tmp_path.clone(),
            source: e,
        })?;

        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            PublishError::WriteFailed {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const DIGEST_A: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const DIGEST_B: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_load_missing_returns_empty() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest::load(&temp.path().join("manifest.json")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_load_malformed_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        fs::write(&path, "{ \"IL\": ").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, PublishError::ManifestCorrupt { .. }));
        assert!(err.to_string().contains("manifest.json"));
    }

    #[test]
    fn test_load_wrong_shape_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        fs::write(&path, r#"{"IL": {"IL_2020": {"path": "x", "size": -1}}}"#).unwrap();

        assert!(matches!(
            Manifest::load(&path),
            Err(PublishError::ManifestCorrupt { .. })
        ));
    }

    #[test]
    fn test_merge_creates_region() {
        let mut manifest = Manifest::new();
        let previous = manifest.merge(
            "IL",
            "IL_2020",
            ManifestEntry::new("IL/IL_2020_pack.zip", DIGEST_A, 10),
        );

        assert!(previous.is_none());
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("IL", "IL_2020").unwrap().size, 10);
    }

    #[test]
    fn test_merge_overwrites_in_place() {
        let mut manifest = Manifest::new();
        manifest.merge(
            "IL",
            "IL_2020",
            ManifestEntry::new("IL/IL_2020_pack.zip", DIGEST_A, 10),
        );
        manifest.merge(
            "IL",
            "IL_2010",
            ManifestEntry::new("IL/IL_2010_pack.zip", DIGEST_A, 5),
        );

        let previous = manifest.merge(
            "IL",
            "IL_2020",
            ManifestEntry::new("IL/IL_2020_pack.zip", DIGEST_B, 20),
        );

        assert_eq!(previous.unwrap().sha256, DIGEST_A);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("IL", "IL_2020").unwrap().sha256, DIGEST_B);
        assert_eq!(manifest.get("IL", "IL_2010").unwrap().size, 5);
    }

    #[test]
    fn test_canonical_format() {
        let mut manifest = Manifest::new();
        manifest.merge(
            "TX",
            "TX_2020",
            ManifestEntry::new("TX/TX_2020_pack.zip", DIGEST_B, 7),
        );
        manifest.merge(
            "IL",
            "IL_2020",
            ManifestEntry::new("IL/IL_2020_pack.zip", DIGEST_A, 123),
        );

        let expected = format!(
            r#"{{
  "IL": {{
    "IL_2020": {{
      "path": "IL/IL_2020_pack.zip",
      "sha256": "{}",
      "size": 123
    }}
  }},
  "TX": {{
    "TX_2020": {{
      "path": "TX/TX_2020_pack.zip",
      "sha256": "{}",
      "size": 7
    }}
  }}
}}
"#,
            DIGEST_A, DIGEST_B
        );
        assert_eq!(manifest.to_json_string().unwrap(), expected);
    }

    #[test]
    fn test_empty_manifest_format() {
        assert_eq!(Manifest::new().to_json_string().unwrap(), "{}\n");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        let original = format!(
            r#"{{
  "TX": {{
    "TX_2020": {{
      "mirror": {{
        "region": "us-east",
        "weight": 2
      }},
      "path": "TX/TX_2020_pack.zip",
      "sha256": "{}",
      "size": 7,
      "url": "https://packs.example.org/TX/TX_2020_pack.zip"
    }}
  }}
}}
"#,
            DIGEST_B
        );
        fs::write(&path, &original).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        let entry = manifest.get("TX", "TX_2020").unwrap();
        assert_eq!(
            entry.extra.get("url").and_then(Value::as_str),
            Some("https://packs.example.org/TX/TX_2020_pack.zip")
        );

        manifest.save(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_merge_leaves_other_entries_untouched() {
        let mut manifest: Manifest = serde_json::from_str(&format!(
            r#"{{"TX": {{"TX_2020": {{"path": "TX/TX_2020_pack.zip", "sha256": "{}", "size": 7, "note": "hand-built"}}}}}}"#,
            DIGEST_B
        ))
        .unwrap();
        let before = manifest.get("TX", "TX_2020").cloned();

        manifest.merge(
            "IL",
            "IL_2020",
            ManifestEntry::new("IL/IL_2020_pack.zip", DIGEST_A, 1),
        );

        assert_eq!(manifest.get("TX", "TX_2020").cloned(), before);
        assert!(manifest.to_json_string().unwrap().contains(r#""note": "hand-built""#));
    }

    #[test]
    fn test_save_creates_parents_and_no_tmp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("packs").join("manifest.json");

        let mut manifest = Manifest::new();
        manifest.merge(
            "IL",
            "IL_2020",
            ManifestEntry::new("IL/IL_2020_pack.zip", DIGEST_A, 1),
        );
        manifest.save(&path).unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_entries_sorted() {
        let mut manifest = Manifest::new();
        manifest.merge("TX", "TX_2020", ManifestEntry::new("t", DIGEST_A, 1));
        manifest.merge("IL", "IL_2020", ManifestEntry::new("b", DIGEST_A, 1));
        manifest.merge("IL", "IL_2010", ManifestEntry::new("a", DIGEST_A, 1));

        let keys: Vec<(&str, &str)> = manifest.entries().map(|(r, k, _)| (r, k)).collect();
        assert_eq!(
            keys,
            vec![("IL", "IL_2010"), ("IL", "IL_2020"), ("TX", "TX_2020")]
        );
        assert_eq!(manifest.regions().collect::<Vec<_>>(), vec!["IL", "TX"]);
    }

    #[test]
    fn test_default_manifest_path() {
        assert_eq!(
            default_manifest_path(Path::new("packs")),
            PathBuf::from("packs/manifest.json")
        );
    }

    fn arb_manifest() -> impl Strategy<Value = Manifest> {
        prop::collection::vec(
            ("[A-Z]{1,3}", "[0-9]{4}", "[0-9a-f]{64}", any::<u64>()),
            0..8,
        )
        .prop_map(|rows| {
            let mut manifest = Manifest::new();
            for (region, year, digest, size) in rows {
                let key = format!("{}_{}", region, year);
                let path = format!("{}/{}_pack.zip", region, key);
                manifest.merge(&region, &key, ManifestEntry::new(path, digest, size));
            }
            manifest
        })
    }

    proptest! {
        #[test]
        fn prop_save_load_roundtrip(manifest in arb_manifest()) {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("manifest.json");
            manifest.save(&path).unwrap();
            prop_assert_eq!(Manifest::load(&path).unwrap(), manifest);
        }
    }
}
