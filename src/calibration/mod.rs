//! Reconciles the dose-driven curve with lab measurements.
//!
//! Each usable lab result becomes an anchor holding `measured / simulated`
//! at its draw time. Between anchors the ratio is interpolated linearly;
//! before the first and after the last it is held flat. With no anchors the
//! factor is exactly 1.0, so the calibrated curve is the raw model.

use log::{debug, warn};
use serde::Serialize;

use crate::catalog::{self, Analyte};
use crate::error::PKError;
use crate::models::{LabResult, PKModel, TimeSeriesPoint};

/// Why a lab point did or did not become an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalibrationStatus {
    Anchored { ratio: f64 },
    UnsupportedUnit,
    ZeroPrediction,
    InvalidMeasurement,
    Disabled,
}

impl CalibrationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CalibrationStatus::Anchored { .. } => "anchored",
            CalibrationStatus::UnsupportedUnit => "unsupported_unit",
            CalibrationStatus::ZeroPrediction => "zero_prediction",
            CalibrationStatus::InvalidMeasurement => "invalid_measurement",
            CalibrationStatus::Disabled => "disabled",
        }
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            CalibrationStatus::Anchored { ratio } => Some(*ratio),
            _ => None,
        }
    }
}

/// A lab point as the chart marks it: original reading, canonical value when
/// convertible, the model's prediction at that time and the outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabPointOutcome {
    pub lab: LabResult,
    pub canonical_value: Option<f64>,
    pub simulated: f64,
    pub status: CalibrationStatus,
}

impl LabPointOutcome {
    pub fn is_anchor(&self) -> bool {
        matches!(self.status, CalibrationStatus::Anchored { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationAnchor {
    pub time_h: f64,
    pub ratio: f64,
}

/// Piecewise-linear scale factor over time.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CalibrationFunction {
    anchors: Vec<CalibrationAnchor>,
}

impl CalibrationFunction {
    /// The constant 1.0.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Anchors are sorted by time; anchors sharing a timestamp are averaged.
    pub fn from_anchors(mut anchors: Vec<CalibrationAnchor>) -> Self {
        anchors.retain(|a| a.time_h.is_finite() && a.ratio.is_finite());
        anchors.sort_by(|a, b| a.time_h.total_cmp(&b.time_h));

        let mut merged: Vec<CalibrationAnchor> = Vec::with_capacity(anchors.len());
        let mut run = 0usize;
        for anchor in anchors {
            match merged.last_mut() {
                Some(last) if last.time_h == anchor.time_h => {
                    run += 1;
                    last.ratio += (anchor.ratio - last.ratio) / run as f64;
                }
                _ => {
                    run = 1;
                    merged.push(anchor);
                }
            }
        }

        Self { anchors: merged }
    }

    pub fn anchors(&self) -> &[CalibrationAnchor] {
        &self.anchors
    }

    pub fn is_identity(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn evaluate(&self, time_h: f64) -> f64 {
        let (first, last) = match (self.anchors.first(), self.anchors.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 1.0,
        };
        if time_h.is_nan() {
            return 1.0;
        }

        if time_h <= first.time_h {
            return first.ratio;
        }
        if time_h >= last.time_h {
            return last.ratio;
        }

        // first.time_h < time_h < last.time_h, so 1 <= idx < len
        let idx = self.anchors.partition_point(|a| a.time_h < time_h);
        let right = self.anchors[idx];
        if right.time_h == time_h {
            return right.ratio;
        }
        let left = self.anchors[idx - 1];

        let frac = (time_h - left.time_h) / (right.time_h - left.time_h);
        left.ratio + frac * (right.ratio - left.ratio)
    }

    /// Scale every sample of `raw` by the factor at its time.
    pub fn apply(&self, raw: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
        raw.iter()
            .map(|point| TimeSeriesPoint {
                time_h: point.time_h,
                conc: point.conc * self.evaluate(point.time_h),
            })
            .collect()
    }
}

/// A raw curve seen through a calibration function.
#[derive(Debug, Clone)]
pub struct CalibratedCurve<'a, M: PKModel> {
    raw: M,
    function: &'a CalibrationFunction,
}

impl<M: PKModel> PKModel for CalibratedCurve<'_, M> {
    fn concentration_at(&self, time_h: f64) -> f64 {
        self.raw.concentration_at(time_h) * self.function.evaluate(time_h)
    }
}

/// Calibration of one analyte against the current lab snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calibration {
    pub analyte: Analyte,
    pub function: CalibrationFunction,
    pub outcomes: Vec<LabPointOutcome>,
}

impl Calibration {
    /// Labs for other analytes are ignored. Points that cannot be converted,
    /// or where the model predicts nothing, are reported and skipped.
    pub fn build<M: PKModel>(analyte: Analyte, raw: &M, labs: &[LabResult]) -> Self {
        let mut outcomes = Vec::new();
        let mut anchors = Vec::new();

        for lab in labs.iter().filter(|lab| lab.analyte == analyte) {
            let simulated = raw.concentration_at(lab.time_h);
            let canonical = catalog::convert(lab.conc_value, &lab.unit, analyte);

            let (canonical_value, status) = match canonical {
                Err(e @ PKError::UnsupportedUnit { .. }) => {
                    warn!("Lab at {}h excluded from calibration: {}", lab.time_h, e);
                    (None, CalibrationStatus::UnsupportedUnit)
                }
                Err(e) => {
                    warn!("Lab at {}h excluded from calibration: {}", lab.time_h, e);
                    (None, CalibrationStatus::InvalidMeasurement)
                }
                Ok(measured) => (Some(measured), anchor_status(lab, measured, simulated)),
            };

            if let CalibrationStatus::Anchored { ratio } = status {
                anchors.push(CalibrationAnchor {
                    time_h: lab.time_h,
                    ratio,
                });
            }

            outcomes.push(LabPointOutcome {
                lab: lab.clone(),
                canonical_value,
                simulated,
                status,
            });
        }

        let function = CalibrationFunction::from_anchors(anchors);
        debug!(
            "{} calibration: {} anchors from {} lab points",
            analyte.code(),
            function.anchors().len(),
            outcomes.len()
        );

        Self {
            analyte,
            function,
            outcomes,
        }
    }

    /// Identity calibration that still reports each lab as a raw marker.
    pub fn uncalibrated<M: PKModel>(analyte: Analyte, raw: &M, labs: &[LabResult]) -> Self {
        let outcomes = labs
            .iter()
            .filter(|lab| lab.analyte == analyte)
            .map(|lab| LabPointOutcome {
                lab: lab.clone(),
                canonical_value: catalog::convert(lab.conc_value, &lab.unit, analyte).ok(),
                simulated: raw.concentration_at(lab.time_h),
                status: CalibrationStatus::Disabled,
            })
            .collect();

        Self {
            analyte,
            function: CalibrationFunction::identity(),
            outcomes,
        }
    }

    pub fn curve<M: PKModel>(&self, raw: M) -> CalibratedCurve<'_, M> {
        CalibratedCurve {
            raw,
            function: &self.function,
        }
    }

    pub fn anchor_count(&self) -> usize {
        self.function.anchors().len()
    }
}

fn anchor_status(lab: &LabResult, measured: f64, simulated: f64) -> CalibrationStatus {
    if !(measured.is_finite() && measured >= 0.0) {
        warn!("Lab at {}h has invalid value {}", lab.time_h, lab.conc_value);
        return CalibrationStatus::InvalidMeasurement;
    }
    if !(simulated.is_finite() && simulated > 0.0) {
        warn!("Lab at {}h excluded: model predicts zero", lab.time_h);
        return CalibrationStatus::ZeroPrediction;
    }

    let ratio = measured / simulated;
    if !ratio.is_finite() {
        return CalibrationStatus::ZeroPrediction;
    }
    CalibrationStatus::Anchored { ratio }
}

/// Calibrated series for one analyte plus the per-lab outcomes.
pub fn calibrate<M: PKModel>(
    analyte: Analyte,
    raw: &M,
    raw_series: &[TimeSeriesPoint],
    labs: &[LabResult],
) -> (Vec<TimeSeriesPoint>, Vec<LabPointOutcome>) {
    let calibration = Calibration::build(analyte, raw, labs);
    let series = calibration.function.apply(raw_series);
    (series, calibration.outcomes)
}
