//! Collaborators backed by external programs.
//!
//! The pack-builder and map-loader are separate tools. These adapters run
//! them as child processes:
//!
//! ```text
//! <builder> [args..] <CODE> <OUTPUT_DIR> <VERBOSITY>   → prints pack path on stdout
//! <loader>  [args..] <PACK_PATH>                       → exit 0 when the pack loads
//! ```
//!
//! The child's stderr is inherited so build progress stays visible.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use super::collaborator::{BuildError, MapHandle, MapLoader, PackBuilder};

/// Run a command with captured stdout and inherited stderr.
fn run(program: &str, command: &mut Command) -> Result<Output, BuildError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| BuildError::Spawn {
            program: program.to_string(),
            source: e,
        })
}

/// Pack-builder that shells out to an external program.
#[derive(Debug, Clone)]
pub struct CommandPackBuilder {
    program: String,
    args: Vec<String>,
}

impl CommandPackBuilder {
    /// Create a builder running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before the region code.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl PackBuilder for CommandPackBuilder {
    fn build_pack(
        &self,
        region_code: &str,
        output_dir: &Path,
        verbosity: u8,
    ) -> Result<PathBuf, BuildError> {
        debug!(program = %self.program, region = region_code, "Running pack builder");

        let output = run(
            &self.program,
            Command::new(&self.program)
                .args(&self.args)
                .arg(region_code)
                .arg(output_dir)
                .arg(verbosity.to_string()),
        )?;

        if !output.status.success() {
            return Err(BuildError::PackBuild(format!(
                "'{}' failed for {} ({})",
                self.program, region_code, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                BuildError::PackBuild(format!(
                    "'{}' did not report a pack path for {}",
                    self.program, region_code
                ))
            })
    }
}

/// Map-loader that shells out to an external program.
#[derive(Debug, Clone)]
pub struct CommandMapLoader {
    program: String,
    args: Vec<String>,
}

impl CommandMapLoader {
    /// Create a loader running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before the pack path.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl MapLoader for CommandMapLoader {
    fn load_map(&self, pack_path: &Path) -> Result<MapHandle, BuildError> {
        let output = run(
            &self.program,
            Command::new(&self.program).args(&self.args).arg(pack_path),
        )?;

        if output.status.success() {
            Ok(MapHandle::new(pack_path))
        } else {
            Err(BuildError::MapLoad(format!(
                "'{}' could not load {} ({})",
                self.program,
                pack_path.display(),
                output.status
            )))
        }
    }
}

/// Minimal loader that only checks the pack exists on disk.
///
/// Used when no loader program is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMapLoader;

impl MapLoader for PathMapLoader {
    fn load_map(&self, pack_path: &Path) -> Result<MapHandle, BuildError> {
        if pack_path.exists() {
            Ok(MapHandle::new(pack_path))
        } else {
            Err(BuildError::MapLoad(format!(
                "pack not found at {}",
                pack_path.display()
            )))
        }
    }
}
