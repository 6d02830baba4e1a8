use thiserror::Error;

use crate::catalog::Analyte;

#[derive(Error, Debug)]
pub enum PKError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown formulation: {0}")]
    UnknownFormulation(String),

    #[error("Unsupported unit '{unit}' for {analyte}")]
    UnsupportedUnit { unit: String, analyte: Analyte },

    #[error("Invalid sampling window: {0}")]
    InvalidWindow(String),

    #[error("Parameter validation error: {0}")]
    Validation(String),
}

pub type PKResult<T> = Result<T, PKError>;
