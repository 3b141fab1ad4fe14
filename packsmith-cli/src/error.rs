//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::io;
use std::process;

use packsmith::build::BatchConfigError;
use packsmith::config::ConfigFileError;
use packsmith::publisher::PublishError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Invalid or incomplete command configuration
    Config(String),
    /// Failed to read the batch configuration file
    ConfigFile(ConfigFileError),
    /// Batch configuration rejected before any build started
    Batch(BatchConfigError),
    /// Failed to start the async runtime
    Runtime(io::Error),
    /// Publishing or manifest access failed
    Publish(PublishError),
    /// Manifest entries did not match the archives on disk
    Verification { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Publish(PublishError::InvalidPackName(_)) => {
                eprintln!();
                eprintln!("Pack directories must be named <REGION>_<YEAR>_pack, for example:");
                eprintln!("  packsmith publish path/to/IL_2020_pack");
            }
            CliError::Publish(PublishError::ManifestCorrupt { .. }) => {
                eprintln!();
                eprintln!("The manifest was left untouched. Repair or remove it and publish again.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Batch(e) => write!(f, "Invalid batch configuration: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Publish(e) => write!(f, "{}", e),
            CliError::Verification { failed, total } => {
                write!(f, "{} of {} manifest entries failed verification", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::ConfigFile(e) => Some(e),
            CliError::Batch(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Publish(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PublishError> for CliError {
    fn from(e: PublishError) -> Self {
        CliError::Publish(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<BatchConfigError> for CliError {
    fn from(e: BatchConfigError) -> Self {
        CliError::Batch(e)
    }
}
