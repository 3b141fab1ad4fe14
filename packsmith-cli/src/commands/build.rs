//! `build` command: batch pack builds.
//!
//! Settings come from an optional INI file (`[build]` and `[tools]`) with
//! command-line flags taking precedence.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use packsmith::build::{
    BatchConfig, BuildOrchestrator, CommandMapLoader, CommandPackBuilder, MapLoader,
    PathMapLoader,
};
use packsmith::config::{parse_region_list, BatchConfigFile};
use tracing::{info, warn};

use crate::error::CliError;

/// Arguments for `packsmith build`.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Batch configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Region code to build (repeatable, comma-separated lists accepted)
    #[arg(long)]
    pub region: Vec<String>,

    /// Directory handed to the pack-builder
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum simultaneous builds
    #[arg(long)]
    pub workers: Option<usize>,

    /// Verbosity handed to the pack-builder
    #[arg(long)]
    pub verbosity: Option<u8>,

    /// Pack-builder program
    #[arg(long)]
    pub builder: Option<String>,

    /// Map-loader program (default: only check the built pack exists)
    #[arg(long)]
    pub loader: Option<String>,
}

/// Fully merged settings for one batch run.
struct BuildPlan {
    config: BatchConfig,
    builder: CommandPackBuilder,
    loader: Arc<dyn MapLoader>,
}

/// Run the build command.
///
/// Per-region failures are part of the printed summary and do not make the
/// command fail.
pub fn run(args: BuildArgs) -> Result<(), CliError> {
    let file = match &args.config {
        Some(path) => BatchConfigFile::load_from(path)?,
        None => BatchConfigFile::default(),
    };
    let plan = plan(args, file)?;

    if plan.config.regions.is_empty() {
        warn!("No regions to build; use --region or set [build] regions");
    }

    let orchestrator = BuildOrchestrator::new(plan.config, Arc::new(plan.builder), plan.loader)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let summary = runtime.block_on(orchestrator.run());

    info!(
        total = summary.total(),
        failed = summary.failures().len(),
        "Batch finished"
    );
    print!("{}", summary);
    Ok(())
}

fn plan(args: BuildArgs, file: BatchConfigFile) -> Result<BuildPlan, CliError> {
    let BatchConfigFile { build, tools } = file;

    let regions = if args.region.is_empty() {
        build.regions
    } else {
        args.region
            .iter()
            .flat_map(|value| parse_region_list(value))
            .collect()
    };

    let config = BatchConfig::new(regions, args.output_dir.unwrap_or(build.output_dir))
        .with_workers(args.workers.unwrap_or(build.workers))
        .with_verbosity(args.verbosity.unwrap_or(build.verbosity));

    let builder = match args.builder {
        Some(program) => CommandPackBuilder::new(program),
        None => match tools.builder {
            Some(program) => CommandPackBuilder::new(program).with_args(tools.builder_args),
            None => {
                return Err(CliError::Config(
                    "No pack-builder configured. Use --builder or set [tools] builder".to_string(),
                ))
            }
        },
    };

    let loader: Arc<dyn MapLoader> = match args.loader {
        Some(program) => Arc::new(CommandMapLoader::new(program)),
        None => match tools.loader {
            Some(program) => Arc::new(CommandMapLoader::new(program).with_args(tools.loader_args)),
            None => Arc::new(PathMapLoader),
        },
    };

    Ok(BuildPlan {
        config,
        builder,
        loader,
    })
}
