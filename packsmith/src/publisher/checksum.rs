//! Content hashing for published archives.
//!
//! Downstream consumers identify an archive by its SHA-256 digest, so the
//! digest must be a pure function of the file bytes.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::{PublishError, PublishResult};

/// Read size used while hashing (1 MiB).
pub const HASH_CHUNK_SIZE: usize = 1 << 20;

/// Calculate the SHA-256 checksum of a file as lowercase hex.
///
/// The file is streamed in [`HASH_CHUNK_SIZE`] chunks so memory use is
/// bounded regardless of file size.
pub fn calculate_sha256(path: &Path) -> PublishResult<String> {
    let file = File::open(path).map_err(|e| PublishError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = BufReader::with_capacity(HASH_CHUNK_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| PublishError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
