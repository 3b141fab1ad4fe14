//! Packsmith - region data pack packaging and batch builds
//!
//! This library packages versioned region data packs into content-addressed
//! ZIP archives tracked by a JSON manifest, and orchestrates building many
//! packs concurrently with per-region failure isolation.
//!
//! # Modules
//!
//! - [`package`] - Pack naming conventions (`<REGION>_<YEAR>_pack`)
//! - [`publisher`] - Archive, hash, and register packs in the manifest
//! - [`build`] - Bounded-concurrency batch builds over external collaborators
//! - [`config`] - Batch configuration file handling
//! - [`logging`] - Tracing subscriber setup

pub mod build;
pub mod config;
pub mod logging;
pub mod package;
pub mod publisher;
