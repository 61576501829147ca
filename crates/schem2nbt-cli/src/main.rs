//! schem2nbt: convert Sponge schematics into structure block files.

mod config;
mod error;
mod jobs;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use config::Config;
use schem2nbt_convert::ConvertOptions;
use schem2nbt_nbt::Compression;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "schem2nbt")]
#[command(
    version,
    about = "Convert Sponge schematics (.schem) to structure files (.nbt)",
    long_about = None
)]
struct Cli {
    /// Schematic file, or a directory with --folder
    #[arg(short, long)]
    input: PathBuf,

    /// Output file, or output directory with --folder
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Convert every file in the input directory
    #[arg(short, long)]
    folder: bool,

    /// Log progress at info level
    #[arg(short, long)]
    verbose: bool,

    /// Config file (default: schem2nbt.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of files converted at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Author written into each structure
    #[arg(long)]
    author: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::resolve(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let options = ConvertOptions {
        author: cli.author.or(config.conversion.author),
        data_version: config.conversion.data_version,
        compression: Compression::Gzip,
    };

    let jobs = match jobs::plan(&cli.input, cli.output.as_deref(), cli.folder).await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if jobs.is_empty() {
        warn!("nothing to convert in {}", cli.input.display());
    }

    let workers = cli.jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1)
    });
    info!("converting {} file(s) with {workers} worker(s)", jobs.len());

    let summary = jobs::run_all(jobs, options, workers).await;
    info!(
        "done: {} converted, {} failed",
        summary.converted, summary.failed
    );
    if summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
