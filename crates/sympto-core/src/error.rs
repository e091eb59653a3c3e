use thiserror::Error;

/// Structural problems in a batch of raw observations.
///
/// Any of these aborts the whole analysis; sparse or missing optional
/// fields never produce an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("observation {index}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { index: usize, value: String },

    #[error("observation {index}: temperature '{value}' is not a number")]
    InvalidTemperature { index: usize, value: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
