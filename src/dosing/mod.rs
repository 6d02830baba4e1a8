use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::Ester;
use crate::error::PKResult;
use crate::models::DoseEvent;

/// Raw dose record as the dose-history store hands it over. The ester stays a
/// string until the regimen resolves it against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseRecord {
    #[serde(rename = "timeH")]
    pub time_h: f64,
    #[serde(rename = "doseMG")]
    pub dose_mg: f64,
    pub ester: String,
}

impl DoseRecord {
    fn resolve(&self) -> PKResult<DoseEvent> {
        let ester: Ester = self.ester.parse()?;
        DoseEvent::new(self.time_h, self.dose_mg, ester)
    }
}

/// A dose record that could not be turned into an event.
#[derive(Debug, Clone)]
pub struct RejectedDose {
    pub record: DoseRecord,
    pub reason: String,
}

/// Snapshot of the dose history, sorted by time.
#[derive(Debug, Clone, Default)]
pub struct DosingRegimen {
    pub events: Vec<DoseEvent>,
    pub rejected: Vec<RejectedDose>,
}

impl DosingRegimen {
    pub fn new(mut events: Vec<DoseEvent>) -> Self {
        events.sort_by(|a, b| a.time_h.total_cmp(&b.time_h));
        Self {
            events,
            rejected: Vec::new(),
        }
    }

    /// Resolve every record; bad records are set aside, never fatal.
    pub fn from_records(records: &[DoseRecord]) -> Self {
        let mut events = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for record in records {
            match record.resolve() {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("Skipping dose at {}h: {}", record.time_h, e);
                    rejected.push(RejectedDose {
                        record: record.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!("Resolved {} dose events ({} rejected)", events.len(), rejected.len());

        let mut regimen = Self::new(events);
        regimen.rejected = rejected;
        regimen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Analyte;

    fn record(time_h: f64, dose_mg: f64, ester: &str) -> DoseRecord {
        DoseRecord {
            time_h,
            dose_mg,
            ester: ester.to_string(),
        }
    }

    #[test]
    fn test_regimen_sorts_by_time() {
        let records = vec![
            record(24.0, 5.0, "EV"),
            record(-12.0, 5.0, "EV"),
            record(0.0, 12.5, "CPA"),
        ];

        let regimen = DosingRegimen::from_records(&records);
        assert_eq!(regimen.events.len(), 3);
        assert_eq!(regimen.events[0].time_h, -12.0);
        assert_eq!(regimen.events[1].time_h, 0.0);
        assert_eq!(regimen.events[2].time_h, 24.0);
        assert!(regimen.rejected.is_empty());
    }

    #[test]
    fn test_unknown_ester_is_rejected_not_fatal() {
        let records = vec![
            record(0.0, 5.0, "EV"),
            record(6.0, 5.0, "mystery"),
            record(12.0, -1.0, "EC"),
        ];

        let regimen = DosingRegimen::from_records(&records);
        assert_eq!(regimen.events.len(), 1);
        assert_eq!(regimen.rejected.len(), 2);
        assert!(regimen.rejected[0].reason.contains("mystery"));
    }

    #[test]
    fn test_mixed_analytes_share_one_regimen() {
        let records = vec![
            record(0.0, 5.0, "EV"),
            record(0.0, 12.5, "CPA"),
            record(24.0, 2.0, "oral"),
        ];

        let regimen = DosingRegimen::from_records(&records);
        let analytes: Vec<Analyte> = regimen.events.iter().map(|e| e.analyte()).collect();
        assert_eq!(analytes.len(), 3);
        assert_eq!(analytes.iter().filter(|&&a| a == Analyte::Cyproterone).count(), 1);
        assert_eq!(regimen.events[2].ester, Ester::OralEstradiol);
    }

    #[test]
    fn test_records_deserialize_from_store_fields() {
        let json = r#"[{"timeH": -48.0, "doseMG": 4.0, "ester": "EV"}]"#;
        let records: Vec<DoseRecord> = serde_json::from_str(json).unwrap();
        let regimen = DosingRegimen::from_records(&records);
        assert_eq!(regimen.events[0].ester, Ester::Valerate);
        assert_eq!(regimen.events[0].dose_mg, 4.0);
    }
}
