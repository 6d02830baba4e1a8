//! Lab reporting units and their linear conversion into each analyte's
//! canonical unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Analyte;
use crate::error::{PKError, PKResult};

/// pg/mL per pmol/L of estradiol.
const E2_PMOL_TO_PG: f64 = 1.0 / 3.671;
/// ng/mL per nmol/L of cyproterone acetate (MW 416.94).
const CPA_NMOL_TO_NG: f64 = 0.41695;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcentrationUnit {
    PicogramPerMilliliter,
    NanogramPerLiter,
    PicomolePerLiter,
    NanomolePerLiter,
    NanogramPerMilliliter,
    MicrogramPerLiter,
    NanogramPerDeciliter,
}

impl ConcentrationUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            ConcentrationUnit::PicogramPerMilliliter => "pg/mL",
            ConcentrationUnit::NanogramPerLiter => "ng/L",
            ConcentrationUnit::PicomolePerLiter => "pmol/L",
            ConcentrationUnit::NanomolePerLiter => "nmol/L",
            ConcentrationUnit::NanogramPerMilliliter => "ng/mL",
            ConcentrationUnit::MicrogramPerLiter => "µg/L",
            ConcentrationUnit::NanogramPerDeciliter => "ng/dL",
        }
    }

    /// Multiplicative factor into the analyte's canonical unit, if registered.
    pub fn factor_to_canonical(&self, analyte: Analyte) -> Option<f64> {
        CONVERSIONS
            .iter()
            .find(|(a, u, _)| *a == analyte && u == self)
            .map(|(_, _, factor)| *factor)
    }
}

impl fmt::Display for ConcentrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ConcentrationUnit {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == 'µ' || c == 'μ' { 'u' } else { c })
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "pg/ml" => Ok(ConcentrationUnit::PicogramPerMilliliter),
            "ng/l" => Ok(ConcentrationUnit::NanogramPerLiter),
            "pmol/l" => Ok(ConcentrationUnit::PicomolePerLiter),
            "nmol/l" => Ok(ConcentrationUnit::NanomolePerLiter),
            "ng/ml" => Ok(ConcentrationUnit::NanogramPerMilliliter),
            "ug/l" | "mcg/l" => Ok(ConcentrationUnit::MicrogramPerLiter),
            "ng/dl" => Ok(ConcentrationUnit::NanogramPerDeciliter),
            _ => Err(raw.to_string()),
        }
    }
}

static CONVERSIONS: [(Analyte, ConcentrationUnit, f64); 13] = [
    (Analyte::Estradiol, ConcentrationUnit::PicogramPerMilliliter, 1.0),
    (Analyte::Estradiol, ConcentrationUnit::NanogramPerLiter, 1.0),
    (Analyte::Estradiol, ConcentrationUnit::PicomolePerLiter, E2_PMOL_TO_PG),
    (Analyte::Estradiol, ConcentrationUnit::NanomolePerLiter, E2_PMOL_TO_PG * 1000.0),
    (Analyte::Estradiol, ConcentrationUnit::NanogramPerMilliliter, 1000.0),
    (Analyte::Estradiol, ConcentrationUnit::MicrogramPerLiter, 1000.0),
    (Analyte::Estradiol, ConcentrationUnit::NanogramPerDeciliter, 10.0),
    (Analyte::Cyproterone, ConcentrationUnit::NanogramPerMilliliter, 1.0),
    (Analyte::Cyproterone, ConcentrationUnit::MicrogramPerLiter, 1.0),
    (Analyte::Cyproterone, ConcentrationUnit::PicogramPerMilliliter, 0.001),
    (Analyte::Cyproterone, ConcentrationUnit::NanogramPerLiter, 0.001),
    (Analyte::Cyproterone, ConcentrationUnit::NanomolePerLiter, CPA_NMOL_TO_NG),
    (Analyte::Cyproterone, ConcentrationUnit::PicomolePerLiter, CPA_NMOL_TO_NG / 1000.0),
];

fn factor_for(unit: &str, analyte: Analyte) -> PKResult<f64> {
    let unsupported = || PKError::UnsupportedUnit {
        unit: unit.to_string(),
        analyte,
    };

    let parsed: ConcentrationUnit = unit.parse().map_err(|_| unsupported())?;
    parsed.factor_to_canonical(analyte).ok_or_else(unsupported)
}

/// Convert a lab value reported in `from_unit` into the analyte's canonical unit.
pub fn convert(value: f64, from_unit: &str, analyte: Analyte) -> PKResult<f64> {
    Ok(value * factor_for(from_unit, analyte)?)
}

/// Express a canonical-unit value in `to_unit`.
pub fn convert_from_canonical(value: f64, to_unit: &str, analyte: Analyte) -> PKResult<f64> {
    Ok(value / factor_for(to_unit, analyte)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_canonical_unit_is_identity() {
        for analyte in Analyte::ALL {
            let unit = analyte.canonical_unit();
            assert_eq!(unit.factor_to_canonical(analyte), Some(1.0));
        }
    }

    #[test]
    fn test_estradiol_conversions() {
        let e2 = |value: f64, unit: &str| convert(value, unit, Analyte::Estradiol).unwrap();
        assert_relative_eq!(e2(367.1, "pmol/L"), 100.0, epsilon = 1e-9);
        assert_relative_eq!(e2(0.15, "ng/mL"), 150.0, epsilon = 1e-9);
        assert_relative_eq!(e2(15.0, "ng/dL"), 150.0, epsilon = 1e-9);
        assert_relative_eq!(e2(200.0, "pg/ml"), 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cyproterone_conversions() {
        let cpa = |value: f64, unit: &str| convert(value, unit, Analyte::Cyproterone).unwrap();
        assert_relative_eq!(cpa(10.0, "nmol/L"), 4.1695, epsilon = 1e-9);
        assert_relative_eq!(cpa(2500.0, "pg/mL"), 2.5, epsilon = 1e-9);
        assert_relative_eq!(cpa(3.0, "µg/L"), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_every_registered_pair_round_trips() {
        for (analyte, unit, _) in CONVERSIONS.iter() {
            let value = 123.456;
            let canonical = convert(value, unit.symbol(), *analyte).unwrap();
            let back = convert_from_canonical(canonical, unit.symbol(), *analyte).unwrap();
            assert_relative_eq!(back, value, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_unknown_unit_is_unsupported() {
        match convert(1.0, "mIU/mL", Analyte::Estradiol) {
            Err(PKError::UnsupportedUnit { unit, analyte }) => {
                assert_eq!(unit, "mIU/mL");
                assert_eq!(analyte, Analyte::Estradiol);
            }
            other => panic!("expected UnsupportedUnit, got {:?}", other),
        }
    }

    #[test]
    fn test_unregistered_pair_is_unsupported() {
        assert!(ConcentrationUnit::NanogramPerDeciliter
            .factor_to_canonical(Analyte::Cyproterone)
            .is_none());
        assert!(convert(1.0, "ng/dL", Analyte::Cyproterone).is_err());
    }
}
