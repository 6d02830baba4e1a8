use serde::{Deserialize, Serialize};

use crate::calibration::LabPointOutcome;
use crate::catalog::{Analyte, Ester};

/// A track is worth drawing once any sample exceeds this (canonical units).
pub const VISIBLE_SIGNAL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub time_h: f64,
    pub raw_conc: f64,
    pub calibrated_conc: f64,
    pub factor: f64,
}

/// A dose placed on its analyte's curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMarker {
    pub time_h: f64,
    pub dose_mg: f64,
    pub ester: Ester,
    pub conc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyteResult {
    pub analyte: Analyte,
    pub rows: Vec<SeriesRow>,
    pub labs: Vec<LabPointOutcome>,
    pub events: Vec<EventMarker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyteSummary {
    pub analyte: Analyte,
    pub unit: String,
    pub cmax: f64,
    pub tmax_h: Option<f64>,
    pub auc: f64,
    pub n_doses: usize,
    pub n_labs: usize,
    pub n_anchors: usize,
    pub visible: bool,
}

impl AnalyteResult {
    pub fn get_max_concentration(&self) -> f64 {
        self.rows.iter().map(|row| row.calibrated_conc).fold(0.0, f64::max)
    }

    /// Trapezoidal area under the calibrated curve over the sampled window.
    pub fn get_auc(&self) -> f64 {
        self.rows
            .windows(2)
            .map(|w| {
                (w[1].time_h - w[0].time_h) * (w[0].calibrated_conc + w[1].calibrated_conc) / 2.0
            })
            .sum()
    }

    pub fn get_time_to_max(&self) -> Option<f64> {
        self.rows
            .iter()
            .max_by(|a, b| a.calibrated_conc.total_cmp(&b.calibrated_conc))
            .map(|row| row.time_h)
    }

    pub fn has_visible_signal(&self) -> bool {
        self.rows.iter().any(|row| row.calibrated_conc > VISIBLE_SIGNAL_THRESHOLD)
    }

    pub fn anchor_count(&self) -> usize {
        self.labs.iter().filter(|lab| lab.is_anchor()).count()
    }

    pub fn summary(&self) -> AnalyteSummary {
        AnalyteSummary {
            analyte: self.analyte,
            unit: self.analyte.canonical_unit().symbol().to_string(),
            cmax: self.get_max_concentration(),
            tmax_h: self.get_time_to_max(),
            auc: self.get_auc(),
            n_doses: self.events.len(),
            n_labs: self.labs.len(),
            n_anchors: self.anchor_count(),
            visible: self.has_visible_signal(),
        }
    }
}
