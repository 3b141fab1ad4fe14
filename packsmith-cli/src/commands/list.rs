//! `list` command: show manifest contents.

use std::path::PathBuf;

use clap::Args;
use packsmith::publisher::{Manifest, DEFAULT_PACKS_DIR};

use super::manifest_path;
use crate::error::CliError;

/// Arguments for `packsmith list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Root directory of the archive store
    #[arg(long, default_value = DEFAULT_PACKS_DIR)]
    pub packs_dir: PathBuf,

    /// Manifest file (default: <packs-dir>/manifest.json)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// Run the list command.
pub fn run(args: ListArgs) -> Result<(), CliError> {
    let manifest_path = manifest_path(&args.packs_dir, args.manifest.as_deref());
    let manifest = Manifest::load(&manifest_path)?;

    if manifest.is_empty() {
        println!("No packs published in {}", manifest_path.display());
        return Ok(());
    }

    println!("Packs in {}:", manifest_path.display());
    for line in format_entries(&manifest) {
        println!("{}", line);
    }
    Ok(())
}

fn format_entries(manifest: &Manifest) -> Vec<String> {
    manifest
        .entries()
        .map(|(region, key, entry)| {
            format!(
                "  {:<4} {:<12} {:>12} bytes  {}  {}",
                region, key, entry.size, entry.sha256, entry.path
            )
        })
        .collect()
}
