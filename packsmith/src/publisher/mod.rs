//! Pack publisher: archive, hash, and register packs in the manifest.
//!
//! # Overview
//!
//! The publish workflow for one pack directory:
//! 1. Parse the directory name (`IL_2020_pack` → region `IL`, key `IL_2020`)
//! 2. Build `<packs-dir>/<REGION>/<dir>.zip` ([`build_archive`])
//! 3. Hash the archive ([`calculate_sha256`])
//! 4. Load, merge, and save the manifest ([`Manifest`])
//!
//! The manifest is the index downstream tools use to discover packs and to
//! verify them after transfer ([`verify_manifest`]).
//!
//! # Example
//!
//! ```ignore
//! use packsmith::publisher::PackPublisher;
//!
//! let publisher = PackPublisher::new("packs");
//! let report = publisher.publish("/data/IL_2020_pack".as_ref())?;
//! println!("{} {} bytes {}", report.archive_path.display(), report.size(), report.sha256());
//! ```

mod archive;
mod checksum;
mod error;
mod manifest;
mod publish;
mod verify;

pub use archive::{build_archive, ArchiveBuildResult, COMPRESSION_LEVEL};
pub use checksum::{calculate_sha256, HASH_CHUNK_SIZE};
pub use error::{PublishError, PublishResult};
pub use manifest::{default_manifest_path, Manifest, ManifestEntry, MANIFEST_FILENAME};
pub use publish::{PackPublisher, PublishReport, DEFAULT_PACKS_DIR};
pub use verify::{resolve_entry_path, verify_entry, verify_manifest, VerificationReport};
