//! Archive building for pack distribution.
//!
//! Packages a pack directory into a single deflate-compressed ZIP archive.
//! Every file is stored under the pack directory's own name so the archive
//! extracts straight into a workspace:
//!
//! ```text
//! IL_2020_pack/              IL_2020_pack.zip
//! ├── a.txt          ──►     ├── IL_2020_pack/a.txt
//! └── blocks/b.csv           └── IL_2020_pack/blocks/b.csv
//! ```
//!
//! Directories are not stored as entries. Archive bytes are not guaranteed to
//! be identical across runs; only the extracted content is.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{PublishError, PublishResult};

/// Deflate level used for pack archives (maximum).
pub const COMPRESSION_LEVEL: i64 = 9;

/// Result of building an archive.
#[derive(Debug, Clone)]
pub struct ArchiveBuildResult {
    /// Full path to the archive.
    pub path: PathBuf,

    /// Number of files stored.
    pub file_count: usize,

    /// Size of the finished archive in bytes.
    pub size: u64,
}

/// Build a ZIP archive of `source_dir` at `archive_path`.
///
/// Parent directories of `archive_path` are created as needed. The archive is
/// written to a `.partial` sibling first and renamed into place once complete,
/// so a failure never leaves a truncated archive at `archive_path`.
///
/// # Arguments
///
/// * `source_dir` - Pack directory to archive
/// * `archive_path` - Destination archive file
pub fn build_archive(source_dir: &Path, archive_path: &Path) -> PublishResult<ArchiveBuildResult> {
    if !source_dir.is_dir() {
        return Err(PublishError::NotADirectory(source_dir.to_path_buf()));
    }

    let prefix = source_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PublishError::NotADirectory(source_dir.to_path_buf()))?;

    if let Some(parent) = archive_path.parent() {
        fs::create_dir_all(parent).map_err(|e| PublishError::CreateDirectoryFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let partial_path = partial_path(archive_path);
    let file_count = match write_zip(source_dir, &prefix, &partial_path, archive_path) {
        Ok(count) => count,
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(
                        path = %partial_path.display(),
                        error = %cleanup,
                        "Failed to remove partial archive"
                    );
                }
            }
            return Err(e);
        }
    };

    fs::rename(&partial_path, archive_path).map_err(|e| PublishError::WriteFailed {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    let size = fs::metadata(archive_path)
        .map_err(|e| PublishError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?
        .len();

    debug!(
        archive = %archive_path.display(),
        files = file_count,
        size,
        "Archive built"
    );

    Ok(ArchiveBuildResult {
        path: archive_path.to_path_buf(),
        file_count,
        size,
    })
}

/// Path of the in-progress archive for `archive_path`.
fn partial_path(archive_path: &Path) -> PathBuf {
    let mut name = OsString::from(archive_path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

/// Stream every regular file under `source_dir` into a new ZIP at `zip_path`.
///
/// Returns the number of files written.
fn write_zip(
    source_dir: &Path,
    prefix: &str,
    zip_path: &Path,
    final_path: &Path,
) -> PublishResult<usize> {
    let file = File::create(zip_path).map_err(|e| PublishError::WriteFailed {
        path: zip_path.to_path_buf(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let mut file_count = 0;

    for entry in WalkDir::new(source_dir)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_dangling_link(&e) => {
                warn!(path = ?e.path(), "Skipping dangling symlink");
                continue;
            }
            Err(e) => {
                return Err(PublishError::ReadFailed {
                    path: e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| source_dir.to_path_buf()),
                    source: io::Error::from(e),
                })
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        // The packs directory may live inside the pack being archived
        if path == zip_path || path == final_path {
            continue;
        }

        let size = entry
            .metadata()
            .map_err(|e| PublishError::ReadFailed {
                path: path.to_path_buf(),
                source: io::Error::from(e),
            })?
            .len();

        let name = entry_name(prefix, source_dir, path);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
            .large_file(size >= u32::MAX as u64);

        zip.start_file(name, options)
            .map_err(|e| PublishError::ArchiveFailed {
                path: zip_path.to_path_buf(),
                source: e,
            })?;

        let mut reader = BufReader::new(File::open(path).map_err(|e| PublishError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?);
        io::copy(&mut reader, &mut zip).map_err(|e| PublishError::WriteFailed {
            path: zip_path.to_path_buf(),
            source: e,
        })?;

        file_count += 1;
    }

    let mut writer = zip.finish().map_err(|e| PublishError::ArchiveFailed {
        path: zip_path.to_path_buf(),
        source: e,
    })?;
    io::Write::flush(&mut writer).map_err(|e| PublishError::WriteFailed {
        path: zip_path.to_path_buf(),
        source: e,
    })?;

    Ok(file_count)
}

/// A symlink whose target does not exist.
fn is_dangling_link(err: &walkdir::Error) -> bool {
    let target_missing = err
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
    target_missing
        && err
            .path()
            .and_then(|path| fs::symlink_metadata(path).ok())
            .is_some_and(|meta| meta.file_type().is_symlink())
}

/// Archive entry name: `<prefix>/<relative path>` with `/` separators.
fn entry_name(prefix: &str, source_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(source_dir).unwrap_or(path);
    let mut name = prefix.to_string();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Read;
    use tempfile::TempDir;

    fn create_pack(root: &Path, name: &str) -> PathBuf {
        let pack = root.join(name);
        fs::create_dir_all(pack.join("blocks").join("2020")).unwrap();
        fs::create_dir_all(pack.join("empty")).unwrap();
        fs::write(pack.join("a.txt"), b"alpha").unwrap();
        fs::write(pack.join("blocks").join("b.csv"), b"id,geoid\n1,17001\n").unwrap();
        fs::write(
            pack.join("blocks").join("2020").join("c.bin"),
            vec![42u8; 64 * 1024],
        )
        .unwrap();
        pack
    }

    fn read_entries(archive_path: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut archive = zip::ZipArchive::new(File::open(archive_path).unwrap()).unwrap();
        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            entries.insert(file.name().to_string(), data);
        }
        entries
    }

    #[test]
    fn test_entries_prefixed_with_dir_name() {
        let temp = TempDir::new().unwrap();
        let pack = create_pack(temp.path(), "IL_2020_pack");
        let archive_path = temp.path().join("out").join("IL_2020_pack.zip");

        let result = build_archive(&pack, &archive_path).unwrap();

        assert_eq!(result.file_count, 3);
        let names: Vec<String> = read_entries(&archive_path).into_keys().collect();
        assert_eq!(
            names,
            vec![
                "IL_2020_pack/a.txt",
                "IL_2020_pack/blocks/2020/c.bin",
                "IL_2020_pack/blocks/b.csv",
            ]
        );
    }

    #[test]
    fn test_entries_are_deflated() {
        let temp = TempDir::new().unwrap();
        let pack = create_pack(temp.path(), "IL_2020_pack");
        let archive_path = temp.path().join("IL_2020_pack.zip");

        build_archive(&pack, &archive_path).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let file = archive.by_name("IL_2020_pack/blocks/2020/c.bin").unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        assert!(file.compressed_size() < file.size());
    }

    #[test]
    fn test_extracted_content_matches_source() {
        let temp = TempDir::new().unwrap();
        let pack = create_pack(temp.path(), "IL_2020_pack");
        let archive_path = temp.path().join("IL_2020_pack.zip");

        build_archive(&pack, &archive_path).unwrap();

        let extract_dir = temp.path().join("extract");
        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        archive.extract(&extract_dir).unwrap();

        let extracted = extract_dir.join("IL_2020_pack");
        for entry in WalkDir::new(&pack) {
            let entry = entry.unwrap();
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(&pack).unwrap();
                assert_eq!(
                    fs::read(entry.path()).unwrap(),
                    fs::read(extracted.join(relative)).unwrap(),
                    "content differs for {}",
                    relative.display()
                );
            }
        }
    }

    #[test]
    fn test_creates_parent_dirs_and_reports_size() {
        let temp = TempDir::new().unwrap();
        let pack = create_pack(temp.path(), "TX_2010_pack");
        let archive_path = temp.path().join("packs").join("TX").join("TX_2010_pack.zip");

        let result = build_archive(&pack, &archive_path).unwrap();

        assert!(archive_path.exists());
        assert_eq!(result.size, fs::metadata(&archive_path).unwrap().len());
        assert!(!partial_path(&archive_path).exists());
    }

    #[test]
    fn test_overwrites_existing_archive() {
        let temp = TempDir::new().unwrap();
        let pack = create_pack(temp.path(), "IL_2020_pack");
        let archive_path = temp.path().join("IL_2020_pack.zip");
        fs::write(&archive_path, b"stale").unwrap();

        build_archive(&pack, &archive_path).unwrap();

        assert_eq!(read_entries(&archive_path).len(), 3);
    }

    #[test]
    fn test_skips_archive_inside_source() {
        let temp = TempDir::new().unwrap();
        let pack = create_pack(temp.path(), "IL_2020_pack");
        let archive_path = pack.join("packs").join("IL_2020_pack.zip");

        let result = build_archive(&pack, &archive_path).unwrap();

        assert_eq!(result.file_count, 3);
        assert!(read_entries(&archive_path)
            .keys()
            .all(|name| !name.ends_with(".zip") && !name.ends_with(".partial")));
    }

    #[test]
    fn test_empty_directory_produces_empty_archive() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("IL_2020_pack");
        fs::create_dir_all(&pack).unwrap();
        let archive_path = temp.path().join("IL_2020_pack.zip");

        let result = build_archive(&pack, &archive_path).unwrap();

        assert_eq!(result.file_count, 0);
        assert!(read_entries(&archive_path).is_empty());
    }

    #[test]
    fn test_invalid_source_dir() {
        let temp = TempDir::new().unwrap();
        let result = build_archive(
            Path::new("/nonexistent/IL_2020_pack"),
            &temp.path().join("out.zip"),
        );

        assert!(matches!(result, Err(PublishError::NotADirectory(_))));
        assert!(!temp.path().join("out.zip").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_archived_under_link_name() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("IL_2020_pack");
        fs::create_dir_all(&pack).unwrap();
        fs::write(pack.join("a.txt"), b"alpha").unwrap();
        fs::write(temp.path().join("shared.csv"), b"geoid\n17001\n").unwrap();
        std::os::unix::fs::symlink("../shared.csv", pack.join("blocks.csv")).unwrap();
        let archive_path = temp.path().join("IL_2020_pack.zip");

        let result = build_archive(&pack, &archive_path).unwrap();

        assert_eq!(result.file_count, 2);
        let entries = read_entries(&archive_path);
        assert_eq!(
            entries.get("IL_2020_pack/blocks.csv").map(Vec::as_slice),
            Some(&b"geoid\n17001\n"[..])
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_followed() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("IL_2020_pack");
        fs::create_dir_all(&pack).unwrap();
        fs::create_dir_all(temp.path().join("common")).unwrap();
        fs::write(temp.path().join("common").join("states.csv"), b"IL").unwrap();
        std::os::unix::fs::symlink("../common", pack.join("common")).unwrap();
        let archive_path = temp.path().join("IL_2020_pack.zip");

        build_archive(&pack, &archive_path).unwrap();

        assert!(read_entries(&archive_path).contains_key("IL_2020_pack/common/states.csv"));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_skipped() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("IL_2020_pack");
        fs::create_dir_all(&pack).unwrap();
        fs::write(pack.join("a.txt"), b"alpha").unwrap();
        std::os::unix::fs::symlink("../missing.csv", pack.join("gone.csv")).unwrap();
        let archive_path = temp.path().join("IL_2020_pack.zip");

        let result = build_archive(&pack, &archive_path).unwrap();

        assert_eq!(result.file_count, 1);
        assert!(read_entries(&archive_path).contains_key("IL_2020_pack/a.txt"));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("packs/IL/IL_2020_pack.zip")),
            PathBuf::from("packs/IL/IL_2020_pack.zip.partial")
        );
    }
}
