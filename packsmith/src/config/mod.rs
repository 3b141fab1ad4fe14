//! Configuration for batch builds.
//!
//! Publishing takes all of its settings from the command line; only batch
//! builds read a configuration file.

mod file;

pub use file::{parse_region_list, BatchConfigFile, BuildSettings, ConfigFileError, ToolSettings};
