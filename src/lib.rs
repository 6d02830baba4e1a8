//! Estradiol and cyproterone acetate concentration curves from a dose log,
//! corrected against lab measurements.
//!
//! The pipeline is three pure stages:
//!
//! 1. [`catalog`]: kinetic constants per formulation and lab-unit conversion.
//! 2. [`simulation`]: superposition of one-compartment responses, evaluated
//!    lazily and sampled over a caller-supplied [`SampleWindow`].
//! 3. [`calibration`]: per-lab ratios interpolated into a time-varying scale
//!    factor applied to the raw curve.
//!
//! Nothing here reads the clock; "now" is always an argument.

pub mod calibration;
pub mod catalog;
pub mod config;
pub mod dosing;
pub mod error;
pub mod input;
pub mod models;
pub mod output;
pub mod simulation;

pub use calibration::{
    calibrate, Calibration, CalibrationFunction, CalibrationStatus, LabPointOutcome,
};
pub use catalog::{convert, lookup, Analyte, Ester, FormulationParams};
pub use config::Config;
pub use dosing::{DoseRecord, DosingRegimen};
pub use error::{PKError, PKResult};
pub use models::{DoseEvent, LabResult, PKModel, TimeSeriesPoint};
pub use simulation::{
    concentration_at, sample, simulate, simulate_analyte, AnalyteResult, SampleWindow, Simulator,
};
