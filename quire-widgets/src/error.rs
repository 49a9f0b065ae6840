//! Widget errors.

use thiserror::Error;

pub type WidgetResult<T> = Result<T, WidgetError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    #[error("Slider element must have an id")]
    MissingId,

    #[error("Duplicate slider id: {0}")]
    DuplicateId(String),

    #[error("Invalid slider range: min {min} > max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("Slider bounds must be finite")]
    NonFiniteBound,

    #[error("Slider step must be positive, got {0}")]
    InvalidStep(f64),
}
