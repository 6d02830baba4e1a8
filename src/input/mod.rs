//! Loading dose and lab snapshots handed over by the storage layer.
//!
//! Files ending in `.csv` are read with headers; anything else is parsed as
//! a JSON array.

use log::info;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::dosing::DoseRecord;
use crate::error::PKResult;
use crate::models::LabResult;

pub fn load_doses<P: AsRef<Path>>(path: P) -> PKResult<Vec<DoseRecord>> {
    let records = load_records(path.as_ref())?;
    info!("Loaded {} dose records from {:?}", records.len(), path.as_ref());
    Ok(records)
}

pub fn load_labs<P: AsRef<Path>>(path: P) -> PKResult<Vec<LabResult>> {
    let labs = load_records(path.as_ref())?;
    info!("Loaded {} lab results from {:?}", labs.len(), path.as_ref());
    Ok(labs)
}

fn load_records<T: DeserializeOwned>(path: &Path) -> PKResult<Vec<T>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let records = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
        Ok(records)
    } else {
        let content = std::fs::read_to_string(path)?;
        Ok(parse_json(&content)?)
    }
}

pub fn parse_json<T: DeserializeOwned>(content: &str) -> PKResult<Vec<T>> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Analyte;
    use std::fs;

    fn scratch_file(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("hrt_pk_input_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_doses_json() {
        let path = scratch_file(
            "doses.json",
            r#"[{"timeH": 0.0, "doseMG": 5.0, "ester": "EV"},
                {"timeH": 168.0, "doseMG": 5.0, "ester": "EV"}]"#,
        );
        let doses = load_doses(&path).unwrap();
        assert_eq!(doses.len(), 2);
        assert_eq!(doses[1].time_h, 168.0);
    }

    #[test]
    fn test_load_labs_csv() {
        let path = scratch_file(
            "labs.csv",
            "timeH,concValue,unit,type\n48.0,150,pg/mL,E2\n50.0, 12.5 ,ng/mL,CPA\n",
        );
        let labs = load_labs(&path).unwrap();
        assert_eq!(labs.len(), 2);
        assert_eq!(labs[0].analyte, Analyte::Estradiol);
        assert_eq!(labs[1].analyte, Analyte::Cyproterone);
        assert_eq!(labs[1].conc_value, 12.5);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_json::<DoseRecord>("{not json").is_err());
    }
}
