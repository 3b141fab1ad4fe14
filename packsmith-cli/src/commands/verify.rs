//! `verify` command: check published archives against the manifest.

use std::path::PathBuf;

use clap::Args;
use packsmith::publisher::{verify_manifest, Manifest, DEFAULT_PACKS_DIR};

use super::manifest_path;
use crate::error::CliError;

/// Arguments for `packsmith verify`.
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Root directory of the archive store
    #[arg(long, default_value = DEFAULT_PACKS_DIR)]
    pub packs_dir: PathBuf,

    /// Manifest file (default: <packs-dir>/manifest.json)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// Run the verify command.
pub fn run(args: VerifyArgs) -> Result<(), CliError> {
    let manifest_path = manifest_path(&args.packs_dir, args.manifest.as_deref());
    let manifest = Manifest::load(&manifest_path)?;
    let report = verify_manifest(&args.packs_dir, &manifest);

    for (region, key) in &report.verified {
        println!("OK      {}/{}", region, key);
    }
    for (region, key, problem) in &report.problems {
        println!("FAILED  {}/{}: {}", region, key, problem);
    }
    println!();
    println!(
        "Verified {} of {} entries in {}",
        report.verified.len(),
        report.total(),
        manifest_path.display()
    );

    if report.is_ok() {
        Ok(())
    } else {
        Err(CliError::Verification {
            failed: report.problems.len(),
            total: report.total(),
        })
    }
}
