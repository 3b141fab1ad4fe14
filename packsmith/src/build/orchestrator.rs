//! Bounded-concurrency batch builds.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      BuildOrchestrator                       │
//! │                                                              │
//! │  regions ──► Dispatching ──► JoinSet (one task per code)     │
//! │                                 │                            │
//! │                      Semaphore(workers) gates each task      │
//! │                                 │                            │
//! │                      spawn_blocking(BuildTask::run)          │
//! │                                 │                            │
//! │              Collecting ◄── join_next (completion order)     │
//! │                   │                                          │
//! │              Summarizing ──► BatchSummary                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tasks share no mutable state. Only the orchestrator touches the work list
//! and the collected outcomes. There are no retries, no per-task timeout, and
//! no cancellation: every dispatched task runs to completion.

use std::any::Any;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

use super::collaborator::{MapLoader, PackBuilder};
use super::summary::BatchSummary;
use super::task::{BuildOutcome, BuildTask};

/// Default number of builds running at once.
///
/// Builds are dominated by downloads, so a small pool is enough.
pub const DEFAULT_WORKERS: usize = 4;

/// Default verbosity passed to the pack-builder.
pub const DEFAULT_VERBOSITY: u8 = 1;

/// Invalid batch configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchConfigError {
    /// Worker count must be at least one.
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    /// Region codes must be non-empty.
    #[error("region code must not be empty")]
    EmptyRegion,

    /// Each region may appear only once in the work list.
    #[error("region '{0}' appears more than once in the work list")]
    DuplicateRegion(String),
}

/// Explicit configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Region codes to build.
    pub regions: Vec<String>,

    /// Directory handed to the pack-builder.
    pub output_dir: PathBuf,

    /// Maximum simultaneous builds.
    pub workers: usize,

    /// Verbosity handed to the pack-builder.
    pub verbosity: u8,
}

impl BatchConfig {
    /// Create a configuration with default workers and verbosity.
    pub fn new<I, S>(regions: I, output_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            output_dir: output_dir.into(),
            workers: DEFAULT_WORKERS,
            verbosity: DEFAULT_VERBOSITY,
        }
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the builder verbosity.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Check the configuration is runnable.
    pub fn validate(&self) -> Result<(), BatchConfigError> {
        if self.workers == 0 {
            return Err(BatchConfigError::ZeroWorkers);
        }

        let mut seen = HashSet::new();
        for code in &self.regions {
            if code.trim().is_empty() {
                return Err(BatchConfigError::EmptyRegion);
            }
            if !seen.insert(code.as_str()) {
                return Err(BatchConfigError::DuplicateRegion(code.clone()));
            }
        }

        Ok(())
    }
}

/// Runs one build task per region with bounded parallelism.
pub struct BuildOrchestrator {
    config: BatchConfig,
    builder: Arc<dyn PackBuilder>,
    loader: Arc<dyn MapLoader>,
}

impl BuildOrchestrator {
    /// Create an orchestrator after validating `config`.
    pub fn new(
        config: BatchConfig,
        builder: Arc<dyn PackBuilder>,
        loader: Arc<dyn MapLoader>,
    ) -> Result<Self, BatchConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            builder,
            loader,
        })
    }

    /// The configuration this orchestrator runs.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Build every region and return the summary.
    ///
    /// Outcomes are collected in completion order. A failing or panicking
    /// task is recorded and never stops its siblings.
    pub async fn run(&self) -> BatchSummary {
        let total = self.config.regions.len();
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut tasks = JoinSet::new();
        let mut pending: HashSet<String> = HashSet::with_capacity(total);

        info!(
            regions = total,
            workers = self.config.workers,
            output_dir = %self.config.output_dir.display(),
            "Dispatching builds"
        );

        for code in &self.config.regions {
            let task = BuildTask::new(
                code.clone(),
                self.config.output_dir.clone(),
                self.config.verbosity,
                Arc::clone(&self.builder),
                Arc::clone(&self.loader),
            );
            let semaphore = Arc::clone(&semaphore);
            pending.insert(code.clone());

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = semaphore.acquire_owned().await.ok();
                let code = task.code().to_string();
                debug!(region = %code, "Build running");
                let result = tokio::task::spawn_blocking(move || task.run()).await;
                (code, result)
            });
        }

        info!("Collecting build outcomes");
        let mut summary = BatchSummary::new(total);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((code, Ok(outcome))) => {
                    pending.remove(&code);
                    log_outcome(&outcome, &summary);
                    summary.record(outcome);
                }
                Ok((code, Err(join_err))) => {
                    pending.remove(&code);
                    let detail = describe_join_error(join_err);
                    error!(region = %code, error = %detail, "Unhandled error in build task");
                    summary.record_unhandled(&code, &detail);
                }
                Err(join_err) => {
                    // The wrapper itself died; its code is reconciled below
                    error!(error = %join_err, "Build task wrapper failed");
                }
            }
        }

        for code in pending {
            error!(region = %code, "Build task ended without an outcome");
            summary.record_unhandled(&code, "task ended without reporting an outcome");
        }

        info!(
            total = summary.total(),
            successes = summary.successes().len(),
            failures = summary.failures().len(),
            "Summarizing builds"
        );

        summary
    }
}

fn log_outcome(outcome: &BuildOutcome, summary: &BatchSummary) {
    debug!(
        region = outcome.code(),
        status = %outcome.status(),
        completed = summary.accounted() + 1,
        total = summary.total(),
        "Build completed"
    );
}

/// `<Kind>: <message>` for a task that panicked or was cancelled.
fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        format!("Panic: {}", panic_message(err.into_panic()))
    } else {
        format!("Cancelled: {}", err)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
