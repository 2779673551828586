//! Climate hazard batch runner.
//!
//! Computes window-averaged hazard indicators for every configured
//! (gcm, scenario, central year) item, writes one chunked grid per item,
//! and samples stored grids at arbitrary coordinates.

mod config;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hazard_common::BatchItem;
use hazard_models::{item_path, run_all, run_single, RunReport, WorkerPool};
use hazard_sources::ZarrYearSource;
use hazard_store::{ReadGrid, ZarrGridStore};

use config::RunnerConfig;

#[derive(Parser, Debug)]
#[command(name = "hazard-runner")]
#[command(about = "Batch computation of climate hazard indicators")]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, env = "HAZARD_CONFIG", default_value = "config/hazard.yaml")]
    config: String,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute and store indicator grids
    Run {
        /// Only run the model with this indicator id
        #[arg(short, long)]
        model: Option<String>,

        /// Only run this item, as GCM/SCENARIO/YEAR
        #[arg(long)]
        item: Option<BatchItem>,
    },

    /// List the items and storage paths a run would produce
    Items {
        /// Only list the model with this indicator id
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Sample a stored grid at (lon, lat) pairs
    Sample {
        /// Storage path of the grid
        #[arg(long)]
        path: String,

        /// Longitudes, paired with --lat by position
        #[arg(long, num_args = 1.., required = true, allow_negative_numbers = true)]
        lon: Vec<f64>,

        /// Latitudes, paired with --lon by position
        #[arg(long, num_args = 1.., required = true, allow_negative_numbers = true)]
        lat: Vec<f64>,
    },
}

#[derive(Serialize)]
struct SampledPoint {
    lon: f64,
    lat: f64,
    value: f32,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so listings and samples can be piped.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = RunnerConfig::load(&args.config)?;
    info!(
        config = %args.config,
        source = %config.source.root.display(),
        target = %config.target.root.display(),
        models = config.models.len(),
        workers = config.workers,
        "Loaded configuration"
    );

    match args.command {
        Command::Run { model, item } => run(&config, model.as_deref(), item.as_ref()),
        Command::Items { model } => list_items(&config, model.as_deref()),
        Command::Sample { path, lon, lat } => sample(&config, &path, &lon, &lat),
    }
}

fn run(config: &RunnerConfig, model: Option<&str>, item: Option<&BatchItem>) -> Result<()> {
    let source = ZarrYearSource::new(&config.source.root)?;
    let target = ZarrGridStore::with_config(&config.target.root, config.target.store.clone())?;
    let pool = match config.workers {
        1 => None,
        n => Some(WorkerPool::new(n)?),
    };

    let mut report = RunReport::default();
    for model_config in config.select_models(model)? {
        let transform = model_config.build(&config.target.prefix, &source)?;

        match item {
            Some(item) => {
                let success = run_single(transform.as_ref(), item, &source, &target, pool.as_ref())?;
                report.completed.push(success);
            }
            None => {
                info!(indicator = %transform.id(), "Running model");
                report.merge(run_all(transform.as_ref(), &source, &target, pool.as_ref()));
            }
        }
    }

    let stats = target.cache_stats();
    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        cache_hit_rate = stats.hit_rate(),
        "Run finished"
    );

    for failure in &report.failed {
        warn!(item = %failure.item, path = %failure.path, error = %failure.error, "Item failed");
    }
    if !report.is_success() {
        bail!("{} of {} items failed", report.failed.len(), report.total());
    }
    Ok(())
}

fn list_items(config: &RunnerConfig, model: Option<&str>) -> Result<()> {
    let source = ZarrYearSource::new(&config.source.root)?;
    for model_config in config.select_models(model)? {
        let transform = model_config.build(&config.target.prefix, &source)?;
        for item in transform.batch_items() {
            println!("{}\t{}", item, item_path(transform.as_ref(), &item));
        }
    }
    Ok(())
}

fn sample(config: &RunnerConfig, path: &str, lon: &[f64], lat: &[f64]) -> Result<()> {
    let target = ZarrGridStore::with_config(&config.target.root, config.target.store.clone())?;
    let values = target.read_floored(path, lon, lat)?;

    let points: Vec<SampledPoint> = lon
        .iter()
        .zip(lat)
        .zip(values)
        .map(|((&lon, &lat), value)| SampledPoint { lon, lat, value })
        .collect();
    println!("{}", serde_json::to_string_pretty(&points)?);
    Ok(())
}
