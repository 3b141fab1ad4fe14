//! `publish` command: archive a pack directory and register it.

use std::path::PathBuf;

use clap::Args;
use packsmith::publisher::{PackPublisher, PublishReport, DEFAULT_PACKS_DIR};

use super::manifest_path;
use crate::error::CliError;

/// Arguments for `packsmith publish`.
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Pack directory named <REGION>_<YEAR>_pack
    pub pack_path: PathBuf,

    /// Root directory of the archive store
    #[arg(long, default_value = DEFAULT_PACKS_DIR)]
    pub packs_dir: PathBuf,

    /// Manifest file (default: <packs-dir>/manifest.json)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// Run the publish command.
pub fn run(args: PublishArgs) -> Result<(), CliError> {
    let report = publish(&args)?;
    print_report(&report);
    Ok(())
}

fn publish(args: &PublishArgs) -> Result<PublishReport, CliError> {
    // Resolve `.` and trailing components so the directory name is the pack's
    let pack_path = args
        .pack_path
        .canonicalize()
        .unwrap_or_else(|_| args.pack_path.clone());

    let publisher = PackPublisher::new(&args.packs_dir)
        .with_manifest_path(manifest_path(&args.packs_dir, args.manifest.as_deref()));

    Ok(publisher.publish(&pack_path)?)
}

fn print_report(report: &PublishReport) {
    println!("Created: {}", report.archive_path.display());
    println!("Size:    {} bytes", report.size());
    println!("SHA256:  {}", report.sha256());
    println!("Manifest updated: {}", report.manifest_path.display());

    match &report.replaced {
        Some(_) if !report.content_changed() => {
            println!("Content unchanged from the previous {}", report.identifier.version_key());
        }
        Some(previous) => {
            println!("Replaced previous digest {}", previous.sha256);
        }
        None => {}
    }
}
