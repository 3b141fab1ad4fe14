//! Batch pack builds.
//!
//! Builds many region packs concurrently with per-region failure isolation.
//! Each region becomes a [`BuildTask`] that calls the external
//! [`PackBuilder`] and then validates the result with the external
//! [`MapLoader`]. The [`BuildOrchestrator`] bounds how many tasks run at
//! once and aggregates their outcomes into a [`BatchSummary`].
//!
//! Built packs are not published automatically; publishing is a separate,
//! manual step (see [`crate::publisher`]).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use packsmith::build::{BatchConfig, BuildOrchestrator, CommandPackBuilder, PathMapLoader};
//!
//! let config = BatchConfig::new(["AL", "AZ", "IL"], "packs").with_workers(4);
//! let orchestrator = BuildOrchestrator::new(
//!     config,
//!     Arc::new(CommandPackBuilder::new("openmander-build")),
//!     Arc::new(PathMapLoader),
//! )?;
//! let summary = orchestrator.run().await;
//! print!("{}", summary);
//! ```

mod collaborator;
mod command;
mod orchestrator;
mod summary;
mod task;

pub use collaborator::{BuildError, MapHandle, MapLoader, PackBuilder};
pub use command::{CommandMapLoader, CommandPackBuilder, PathMapLoader};
pub use orchestrator::{
    BatchConfig, BatchConfigError, BuildOrchestrator, DEFAULT_VERBOSITY, DEFAULT_WORKERS,
};
pub use summary::{BatchSummary, UNHANDLED_PREFIX};
pub use task::{BuildOutcome, BuildStatus, BuildTask};
