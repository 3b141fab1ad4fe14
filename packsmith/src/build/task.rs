//! One unit of the batch pipeline: build a region's pack, then prove it loads.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::collaborator::{BuildError, MapLoader, PackBuilder};

/// Final status of a build task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// Pack built and loaded.
    Success,
    /// Builder or loader reported an error.
    Failure,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Success => f.write_str("success"),
            BuildStatus::Failure => f.write_str("failure"),
        }
    }
}

/// Immutable result of one build task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    code: String,
    status: BuildStatus,
    detail: Option<String>,
    pack_path: Option<PathBuf>,
    elapsed: Duration,
}

impl BuildOutcome {
    /// Successful outcome for `code`.
    pub fn success(code: impl Into<String>, pack_path: PathBuf, elapsed: Duration) -> Self {
        Self {
            code: code.into(),
            status: BuildStatus::Success,
            detail: None,
            pack_path: Some(pack_path),
            elapsed,
        }
    }

    /// Failed outcome for `code` with a short error description.
    pub fn failure(code: impl Into<String>, detail: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            code: code.into(),
            status: BuildStatus::Failure,
            detail: Some(detail.into()),
            pack_path: None,
            elapsed,
        }
    }

    /// Region code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Final status.
    pub fn status(&self) -> BuildStatus {
        self.status
    }

    /// Whether the build succeeded.
    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }

    /// Error description for failures.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Built pack path for successes.
    pub fn pack_path(&self) -> Option<&Path> {
        self.pack_path.as_deref()
    }

    /// Wall time the task spent running.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Builds and validates the pack for one region code.
pub struct BuildTask {
    code: String,
    output_dir: PathBuf,
    verbosity: u8,
    builder: Arc<dyn PackBuilder>,
    loader: Arc<dyn MapLoader>,
}

impl BuildTask {
    /// Create a task for `code`.
    pub fn new(
        code: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        verbosity: u8,
        builder: Arc<dyn PackBuilder>,
        loader: Arc<dyn MapLoader>,
    ) -> Self {
        Self {
            code: code.into(),
            output_dir: output_dir.into(),
            verbosity,
            builder,
            loader,
        }
    }

    /// Region code this task builds.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Run the build and load steps.
    ///
    /// Never returns an error: collaborator failures become a
    /// [`BuildStatus::Failure`] outcome. Blocks for the duration of the
    /// external calls.
    pub fn run(&self) -> BuildOutcome {
        let start = Instant::now();
        let code = self.code.as_str();

        match self.build_and_load() {
            Ok(pack_path) => {
                let elapsed = start.elapsed();
                info!(
                    region = code,
                    pack = %pack_path.display(),
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Map loaded successfully"
                );
                BuildOutcome::success(code, pack_path, elapsed)
            }
            Err(e) => {
                let elapsed = start.elapsed();
                let detail = e.summary();
                warn!(
                    region = code,
                    error = %detail,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Build failed"
                );
                BuildOutcome::failure(code, detail, elapsed)
            }
        }
    }

    fn build_and_load(&self) -> Result<PathBuf, BuildError> {
        info!(region = %self.code, "Starting build_pack");
        let pack_path = self
            .builder
            .build_pack(&self.code, &self.output_dir, self.verbosity)?;

        info!(
            region = %self.code,
            pack = %pack_path.display(),
            "Finished build_pack, loading map"
        );
        // The handle only proves the pack loads
        let _map = self.loader.load_map(&pack_path)?;

        Ok(pack_path)
    }
}

impl fmt::Debug for BuildTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildTask")
            .field("code", &self.code)
            .field("output_dir", &self.output_dir)
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}
