use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::error::PKResult;
use crate::models::hours_to_datetime;
use crate::simulation::{AnalyteResult, AnalyteSummary};

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub now_h: f64,
    pub window_start_h: f64,
    pub window_end_h: f64,
    pub resolution_h: f64,
    pub rejected_doses: usize,
    pub analytes: Vec<AnalyteSummary>,
}

pub fn save_results<P: AsRef<Path>>(
    results: &[AnalyteResult],
    summary: &RunSummary,
    output_dir: P,
) -> PKResult<()> {
    let output_path = output_dir.as_ref();

    for result in results {
        let code = result.analyte.code().to_ascii_lowercase();
        save_series(result, &output_path.join(format!("{}_series.csv", code)))?;
        save_labs(result, &output_path.join(format!("{}_labs.csv", code)))?;
        save_events(result, &output_path.join(format!("{}_events.csv", code)))?;
    }

    save_summary(summary, &output_path.join("summary.json"))?;

    info!("All results saved to {:?}", output_path);
    Ok(())
}

fn timestamp(time_h: f64) -> String {
    hours_to_datetime(time_h)
        .map(|instant| instant.to_rfc3339())
        .unwrap_or_default()
}

fn save_series<P: AsRef<Path>>(result: &AnalyteResult, path: P) -> PKResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "TIME_H",
        "TIMESTAMP",
        "RAW_CONC",
        "CALIBRATED_CONC",
        "CALIBRATION_FACTOR",
    ])?;

    for row in &result.rows {
        writer.write_record(&[
            row.time_h.to_string(),
            timestamp(row.time_h),
            row.raw_conc.to_string(),
            row.calibrated_conc.to_string(),
            row.factor.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_labs<P: AsRef<Path>>(result: &AnalyteResult, path: P) -> PKResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "TIME_H",
        "TIMESTAMP",
        "VALUE",
        "UNIT",
        "CANONICAL_VALUE",
        "SIMULATED",
        "STATUS",
        "RATIO",
    ])?;

    for outcome in &result.labs {
        writer.write_record(&[
            outcome.lab.time_h.to_string(),
            timestamp(outcome.lab.time_h),
            outcome.lab.conc_value.to_string(),
            outcome.lab.unit.clone(),
            outcome.canonical_value.map(|v| v.to_string()).unwrap_or_default(),
            outcome.simulated.to_string(),
            outcome.status.label().to_string(),
            outcome.status.ratio().map(|r| r.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_events<P: AsRef<Path>>(result: &AnalyteResult, path: P) -> PKResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["TIME_H", "TIMESTAMP", "DOSE_MG", "ESTER", "CONC"])?;

    for marker in &result.events {
        writer.write_record(&[
            marker.time_h.to_string(),
            timestamp(marker.time_h),
            marker.dose_mg.to_string(),
            marker.ester.code().to_string(),
            marker.conc.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_summary<P: AsRef<Path>>(summary: &RunSummary, path: P) -> PKResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}
