use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use detfusion::FusionConfig;

#[derive(Parser)]
#[command(name = "detfusion")]
#[command(about = "Fuse detections from several models into one labeled result")]
struct Cli {
    /// Input image files
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Fusion config (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Write outputs here instead of the configured directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Run model passes on separate threads
    #[arg(long)]
    parallel: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let mut config = FusionConfig::from_file(&args.config)?;
    if args.parallel {
        config.parallel = true;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = Some(std::env::current_dir()?.join(dir));
    }

    let base_dir = args
        .config
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let pipeline = config
        .into_pipeline(&base_dir)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    info!(
        models = pipeline.models().len(),
        images = args.images.len(),
        "starting fusion"
    );
    let report = pipeline.process_batch(&args.images)?;

    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        "done"
    );

    if report.processed.is_empty() {
        anyhow::bail!("no image could be processed");
    }
    Ok(())
}
