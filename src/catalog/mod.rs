//! Static kinetic constants for every formulation the dose log can hold.
//!
//! The table below is the only place rate constants live. Adding a
//! formulation means adding an [`Ester`] variant and one table row; the
//! simulator never branches on the variant itself.

pub mod units;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PKError, PKResult};

pub use units::{convert, convert_from_canonical, ConcentrationUnit};

/// A measured or simulated substance. Each analyte is simulated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Analyte {
    #[serde(rename = "E2")]
    Estradiol,
    #[serde(rename = "CPA")]
    Cyproterone,
}

impl Analyte {
    pub const ALL: [Analyte; 2] = [Analyte::Estradiol, Analyte::Cyproterone];

    /// Unit the simulator works in for this analyte.
    pub fn canonical_unit(&self) -> ConcentrationUnit {
        match self {
            Analyte::Estradiol => ConcentrationUnit::PicogramPerMilliliter,
            Analyte::Cyproterone => ConcentrationUnit::NanogramPerMilliliter,
        }
    }

    /// Factor taking mg/L into the canonical unit.
    fn mg_per_l_to_canonical(&self) -> f64 {
        match self {
            Analyte::Estradiol => 1.0e6,
            Analyte::Cyproterone => 1.0e3,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Analyte::Estradiol => "E2",
            Analyte::Cyproterone => "CPA",
        }
    }

    /// Lab-entry `type` field: `CPA` targets cyproterone, everything else estradiol.
    pub fn from_lab_type(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("CPA") {
            Analyte::Cyproterone
        } else {
            Analyte::Estradiol
        }
    }
}

impl fmt::Display for Analyte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analyte::Estradiol => write!(f, "estradiol"),
            Analyte::Cyproterone => write!(f, "cyproterone acetate"),
        }
    }
}

/// Chemical or delivery form of a dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ester {
    Benzoate,
    Valerate,
    Cypionate,
    Enanthate,
    Undecylate,
    OralEstradiol,
    SublingualEstradiol,
    Patch,
    Gel,
    CyproteroneAcetate,
}

impl Ester {
    pub const ALL: [Ester; 10] = [
        Ester::Benzoate,
        Ester::Valerate,
        Ester::Cypionate,
        Ester::Enanthate,
        Ester::Undecylate,
        Ester::OralEstradiol,
        Ester::SublingualEstradiol,
        Ester::Patch,
        Ester::Gel,
        Ester::CyproteroneAcetate,
    ];

    /// Catalog entry for an already-parsed variant.
    pub fn params(&self) -> &'static FormulationParams {
        // Rows are stored in declaration order.
        &FORMULATIONS[*self as usize]
    }

    pub fn analyte(&self) -> Analyte {
        self.params().analyte
    }

    /// Short code as stored by the dose-entry UI.
    pub fn code(&self) -> &'static str {
        match self {
            Ester::Benzoate => "EB",
            Ester::Valerate => "EV",
            Ester::Cypionate => "EC",
            Ester::Enanthate => "EEn",
            Ester::Undecylate => "EUn",
            Ester::OralEstradiol => "E2",
            Ester::SublingualEstradiol => "E2SL",
            Ester::Patch => "E2Patch",
            Ester::Gel => "E2Gel",
            Ester::CyproteroneAcetate => "CPA",
        }
    }
}

impl fmt::Display for Ester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Ester {
    type Err = PKError;

    fn from_str(tag: &str) -> PKResult<Self> {
        let normalized: String = tag
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        let ester = match normalized.as_str() {
            "eb" | "benzoate" | "estradiolbenzoate" => Ester::Benzoate,
            "ev" | "valerate" | "estradiolvalerate" => Ester::Valerate,
            "ec" | "cypionate" | "estradiolcypionate" => Ester::Cypionate,
            "een" | "enanthate" | "estradiolenanthate" => Ester::Enanthate,
            "eun" | "undecylate" | "estradiolundecylate" => Ester::Undecylate,
            "e2" | "oral" | "oralestradiol" | "estradiol" => Ester::OralEstradiol,
            "e2sl" | "sublingual" | "sublingualestradiol" => Ester::SublingualEstradiol,
            "e2patch" | "patch" | "transdermalpatch" => Ester::Patch,
            "e2gel" | "gel" | "transdermalgel" => Ester::Gel,
            "cpa" | "cyproterone" | "cyproteroneacetate" => Ester::CyproteroneAcetate,
            _ => return Err(PKError::UnknownFormulation(tag.to_string())),
        };

        Ok(ester)
    }
}

/// One catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormulationParams {
    pub ester: Ester,
    pub analyte: Analyte,
    /// Absorption rate constant (1/h).
    pub ka: f64,
    /// Elimination rate constant (1/h).
    pub ke: f64,
    /// Fraction of the administered mass reaching circulation as the analyte.
    pub bioavailability: f64,
    /// Apparent volume of distribution (L).
    pub volume_l: f64,
}

impl FormulationParams {
    /// Concentration in the analyte's canonical unit per mg entering the
    /// central compartment.
    pub fn canonical_scale(&self) -> f64 {
        self.analyte.mg_per_l_to_canonical() / self.volume_l
    }
}

const E2_VOLUME_L: f64 = 1890.0;
const E2_KE: f64 = 0.070;

static FORMULATIONS: [FormulationParams; 10] = [
    FormulationParams {
        ester: Ester::Benzoate,
        analyte: Analyte::Estradiol,
        ka: 0.040,
        ke: E2_KE,
        bioavailability: 0.723,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::Valerate,
        analyte: Analyte::Estradiol,
        ka: 0.020,
        ke: E2_KE,
        bioavailability: 0.764,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::Cypionate,
        analyte: Analyte::Estradiol,
        ka: 0.0075,
        ke: E2_KE,
        bioavailability: 0.687,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::Enanthate,
        analyte: Analyte::Estradiol,
        ka: 0.010,
        ke: E2_KE,
        bioavailability: 0.708,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::Undecylate,
        analyte: Analyte::Estradiol,
        ka: 0.0025,
        ke: E2_KE,
        bioavailability: 0.618,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::OralEstradiol,
        analyte: Analyte::Estradiol,
        ka: 0.32,
        ke: 0.045,
        bioavailability: 0.05,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::SublingualEstradiol,
        analyte: Analyte::Estradiol,
        ka: 1.20,
        ke: 0.120,
        bioavailability: 0.10,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::Patch,
        analyte: Analyte::Estradiol,
        ka: 0.030,
        ke: E2_KE,
        bioavailability: 0.80,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::Gel,
        analyte: Analyte::Estradiol,
        ka: 0.050,
        ke: 0.090,
        bioavailability: 0.10,
        volume_l: E2_VOLUME_L,
    },
    FormulationParams {
        ester: Ester::CyproteroneAcetate,
        analyte: Analyte::Cyproterone,
        ka: 0.35,
        ke: 0.016,
        bioavailability: 0.88,
        volume_l: 1400.0,
    },
];

/// Resolve a raw ester tag to its kinetic constants.
pub fn lookup(ester_tag: &str) -> PKResult<&'static FormulationParams> {
    let ester: Ester = ester_tag.parse()?;
    Ok(ester.params())
}

/// All catalog rows.
pub fn formulations() -> &'static [FormulationParams] {
    &FORMULATIONS
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_catalog_covers_every_ester() {
        assert_eq!(FORMULATIONS.len(), Ester::ALL.len());
        for ester in Ester::ALL {
            assert_eq!(ester.params().ester, ester);
        }
    }

    #[test]
    fn test_rate_constants_are_positive() {
        for params in formulations() {
            assert!(params.ka > 0.0);
            assert!(params.ke > 0.0);
            assert!(params.bioavailability > 0.0 && params.bioavailability <= 1.0);
            assert!(params.volume_l > 0.0);
        }
    }

    #[test]
    fn test_lookup_accepts_codes_and_names() {
        assert_eq!(lookup("EV").unwrap().ester, Ester::Valerate);
        assert_eq!(lookup("valerate").unwrap().ester, Ester::Valerate);
        assert_eq!(lookup(" Estradiol_Cypionate ").unwrap().ester, Ester::Cypionate);
        assert_eq!(lookup("cpa").unwrap().analyte, Analyte::Cyproterone);
    }

    #[test]
    fn test_codes_round_trip_through_parser() {
        for ester in Ester::ALL {
            let parsed: Ester = ester.code().parse().unwrap();
            assert_eq!(parsed, ester);
        }
    }

    #[test]
    fn test_lookup_rejects_unknown_tag() {
        match lookup("progesterone") {
            Err(PKError::UnknownFormulation(tag)) => assert_eq!(tag, "progesterone"),
            other => panic!("expected UnknownFormulation, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_scale_depends_on_analyte() {
        let ev = Ester::Valerate.params();
        assert_relative_eq!(ev.canonical_scale(), 1.0e6 / 1890.0, epsilon = 1e-9);

        let cpa = Ester::CyproteroneAcetate.params();
        assert_relative_eq!(cpa.canonical_scale(), 1.0e3 / 1400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lab_type_defaults_to_estradiol() {
        assert_eq!(Analyte::from_lab_type("CPA"), Analyte::Cyproterone);
        assert_eq!(Analyte::from_lab_type("E2"), Analyte::Estradiol);
        assert_eq!(Analyte::from_lab_type(""), Analyte::Estradiol);
    }
}
