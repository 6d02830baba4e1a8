pub mod one_compartment;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Analyte, Ester};
use crate::error::{PKError, PKResult};

pub use one_compartment::OneCompartmentModel;

pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// A concentration-over-time function that can be evaluated at any instant.
pub trait PKModel {
    /// Concentration in the analyte's canonical unit at `time_h`.
    fn concentration_at(&self, time_h: f64) -> f64;
}

impl<M: PKModel + ?Sized> PKModel for &M {
    fn concentration_at(&self, time_h: f64) -> f64 {
        (**self).concentration_at(time_h)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseEvent {
    pub time_h: f64,
    pub dose_mg: f64,
    pub ester: Ester,
}

impl DoseEvent {
    pub fn new(time_h: f64, dose_mg: f64, ester: Ester) -> PKResult<Self> {
        if !time_h.is_finite() {
            return Err(PKError::Validation(format!(
                "Dose time must be finite, got {}",
                time_h
            )));
        }
        if !(dose_mg.is_finite() && dose_mg > 0.0) {
            return Err(PKError::Validation(format!(
                "Dose amount must be positive, got {}",
                dose_mg
            )));
        }
        Ok(Self { time_h, dose_mg, ester })
    }

    pub fn analyte(&self) -> Analyte {
        self.ester.analyte()
    }
}

/// Raw lab record as the lab-entry store hands it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabRecord {
    #[serde(rename = "timeH")]
    pub time_h: f64,
    #[serde(rename = "concValue")]
    pub conc_value: f64,
    pub unit: String,
    #[serde(rename = "type", default)]
    pub lab_type: String,
}

/// One measured value. The unit stays a raw string so unconvertible entries
/// can still be shown as they were entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LabRecord", into = "LabRecord")]
pub struct LabResult {
    pub time_h: f64,
    pub conc_value: f64,
    pub unit: String,
    pub analyte: Analyte,
}

impl LabResult {
    pub fn new(time_h: f64, conc_value: f64, unit: impl Into<String>, analyte: Analyte) -> Self {
        Self {
            time_h,
            conc_value,
            unit: unit.into(),
            analyte,
        }
    }
}

impl From<LabRecord> for LabResult {
    fn from(record: LabRecord) -> Self {
        Self {
            time_h: record.time_h,
            conc_value: record.conc_value,
            unit: record.unit,
            analyte: Analyte::from_lab_type(&record.lab_type),
        }
    }
}

impl From<LabResult> for LabRecord {
    fn from(lab: LabResult) -> Self {
        Self {
            time_h: lab.time_h,
            conc_value: lab.conc_value,
            unit: lab.unit,
            lab_type: lab.analyte.code().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time_h: f64,
    pub conc: f64,
}

impl TimeSeriesPoint {
    pub fn timestamp_ms(&self) -> f64 {
        hours_to_millis(self.time_h)
    }
}

pub fn hours_to_millis(time_h: f64) -> f64 {
    time_h * MILLIS_PER_HOUR
}

/// Hours since the Unix epoch for a wall-clock instant.
pub fn datetime_to_hours(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / MILLIS_PER_HOUR
}

/// Wall-clock instant for an epoch offset; `None` when out of chrono's range.
pub fn hours_to_datetime(time_h: f64) -> Option<DateTime<Utc>> {
    let millis = hours_to_millis(time_h);
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis.round() as i64).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dose_event_validation() {
        assert!(DoseEvent::new(0.0, 5.0, Ester::Valerate).is_ok());
        assert!(DoseEvent::new(0.0, 0.0, Ester::Valerate).is_err());
        assert!(DoseEvent::new(0.0, -1.0, Ester::Valerate).is_err());
        assert!(DoseEvent::new(f64::NAN, 1.0, Ester::Valerate).is_err());
    }

    #[test]
    fn test_lab_record_type_mapping() {
        let json = r#"[
            {"timeH": 10.0, "concValue": 150.0, "unit": "pg/mL", "type": "E2"},
            {"timeH": 12.0, "concValue": 20.0, "unit": "ng/mL", "type": "CPA"},
            {"timeH": 14.0, "concValue": 400.0, "unit": "pmol/L"}
        ]"#;
        let labs: Vec<LabResult> = serde_json::from_str(json).unwrap();
        assert_eq!(labs[0].analyte, Analyte::Estradiol);
        assert_eq!(labs[1].analyte, Analyte::Cyproterone);
        assert_eq!(labs[2].analyte, Analyte::Estradiol);
        assert_eq!(labs[2].unit, "pmol/L");
    }

    #[test]
    fn test_lab_result_written_in_store_shape() {
        let labs = vec![
            LabResult::new(12.0, 20.0, "ng/mL", Analyte::Cyproterone),
            LabResult::new(14.0, 400.0, "pmol/L", Analyte::Estradiol),
        ];
        let json = serde_json::to_value(&labs).unwrap();
        assert_eq!(json[0]["timeH"], 12.0);
        assert_eq!(json[0]["concValue"], 20.0);
        assert_eq!(json[0]["type"], "CPA");
        assert_eq!(json[1]["type"], "E2");

        let back: Vec<LabResult> = serde_json::from_value(json).unwrap();
        assert_eq!(back, labs);
    }

    #[test]
    fn test_time_conversions() {
        let point = TimeSeriesPoint { time_h: 2.0, conc: 1.0 };
        assert_relative_eq!(point.timestamp_ms(), 7_200_000.0);

        let instant = hours_to_datetime(24.0).unwrap();
        assert_eq!(instant.to_rfc3339(), "1970-01-02T00:00:00+00:00");
        assert_relative_eq!(datetime_to_hours(instant), 24.0, epsilon = 1e-12);

        assert!(hours_to_datetime(f64::INFINITY).is_none());
    }
}
