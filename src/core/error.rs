use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("unknown risk profile '{0}' (expected low, medium or high)")]
    InvalidProfile(String),
    #[error("horizon start {start} must be before horizon end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("initial principal must be a positive amount, got {0}")]
    InvalidPrincipal(f64),
    #[error("invalid tax rule: {0}")]
    InvalidTaxRule(String),
}
