//! Packsmith CLI - Command-line interface
//!
//! Publishes region data packs into a content-addressed archive store and
//! builds packs for many regions in one batch.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use packsmith::logging::init_logging;

use commands::{build, list, publish, verify};
use error::CliError;

#[derive(Parser)]
#[command(name = "packsmith")]
#[command(version, about = "Package and build region data packs", long_about = None)]
struct Cli {
    /// Also write logs to this file (cleared at startup)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive a pack directory and register it in the manifest
    Publish(publish::PublishArgs),

    /// Build and validate packs for many regions concurrently
    Build(build::BuildArgs),

    /// Re-hash every manifest entry and compare against the archives
    Verify(verify::VerifyArgs),

    /// List the packs recorded in the manifest
    List(list::ListArgs),
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = match init_logging(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };

    let result = match cli.command {
        Commands::Publish(args) => publish::run(args),
        Commands::Build(args) => build::run(args),
        Commands::Verify(args) => verify::run(args),
        Commands::List(args) => list::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
