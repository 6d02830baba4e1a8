use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use hrt_pk::config::Config;
use hrt_pk::dosing::DosingRegimen;
use hrt_pk::input::{load_doses, load_labs};
use hrt_pk::models::datetime_to_hours;
use hrt_pk::output::{save_results, RunSummary};
use hrt_pk::simulation::{simulate_analyte, SampleWindow, ViewPreset};
use hrt_pk::Analyte;

#[derive(Parser)]
#[command(name = "hrt_pk")]
#[command(about = "Simulate and calibrate estradiol / cyproterone concentration curves")]
struct Cli {
    /// Dose history (JSON array or CSV)
    #[arg(short, long)]
    doses: PathBuf,

    /// Lab results (JSON array or CSV)
    #[arg(short, long)]
    labs: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference instant (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Viewport around now
    #[arg(long, value_enum)]
    preset: Option<ViewPreset>,

    /// Explicit window start, hours since the epoch
    #[arg(long, requires = "end_h")]
    start_h: Option<f64>,

    /// Explicit window end, hours since the epoch
    #[arg(long, requires = "start_h")]
    end_h: Option<f64>,

    /// Hours between samples
    #[arg(short, long)]
    resolution_h: Option<f64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("loading config {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };
    if let Some(preset) = cli.preset {
        config.window.preset = preset;
        config.window.before_h = None;
        config.window.after_h = None;
    }
    if let Some(resolution) = cli.resolution_h {
        config.sampling.resolution_h = resolution;
    }
    config.validate()?;

    let now_h = datetime_to_hours(cli.now.unwrap_or_else(Utc::now));
    let window = match (cli.start_h, cli.end_h) {
        (Some(start), Some(end)) => SampleWindow::new(start, end, config.sampling.resolution_h)?,
        _ => config.window_around(now_h)?,
    };

    let records = load_doses(&cli.doses).with_context(|| format!("loading doses {:?}", cli.doses))?;
    let regimen = DosingRegimen::from_records(&records);
    if !regimen.rejected.is_empty() {
        warn!("{} dose records were skipped", regimen.rejected.len());
    }

    let labs = match &cli.labs {
        Some(path) => load_labs(path).with_context(|| format!("loading labs {:?}", path))?,
        None => Vec::new(),
    };

    let results: Vec<_> = Analyte::ALL
        .iter()
        .map(|&analyte| {
            simulate_analyte(analyte, &regimen, &labs, &window, config.calibration.enabled)
        })
        .collect();

    let summary = RunSummary {
        now_h,
        window_start_h: window.start_h(),
        window_end_h: window.end_h(),
        resolution_h: window.resolution_h(),
        rejected_doses: regimen.rejected.len(),
        analytes: results.iter().map(|r| r.summary()).collect(),
    };

    // Create output directory if it doesn't exist
    std::fs::create_dir_all(&cli.output)?;

    save_results(&results, &summary, &cli.output)?;
    info!("Results saved to {:?}", cli.output);

    Ok(())
}
