//! Pack identity and naming.
//!
//! A pack is a self-contained directory of data artifacts for one region and
//! release year. Its directory name carries its identity:
//!
//! ```text
//! IL_2020_pack
//! ├── region:      IL
//! ├── version key: IL_2020
//! └── archive:     IL/IL_2020_pack.zip
//! ```

mod naming;

pub use naming::{
    PackIdentifier, PackNameError, ARCHIVE_EXTENSION, PACK_NAME_EXAMPLE, PACK_NAME_PATTERN,
};
