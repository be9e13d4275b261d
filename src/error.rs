use thiserror::Error;

/// Fieldless view of [`BioSimError`] for callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidMap,
    InvalidLocation,
    InvalidAnimalSpec,
    InvalidParameters,
    InvariantViolation,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BioSimError {
    #[error("invalid map at row {row}, column {col}: {reason}")]
    InvalidMap {
        row: usize,
        col: usize,
        reason: String,
    },

    #[error("invalid location ({row}, {col}): {reason}")]
    InvalidLocation {
        row: i64,
        col: i64,
        reason: String,
    },

    #[error("invalid animal specification: {0}")]
    InvalidAnimalSpec(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("invariant violated after {phase} phase: {reason}")]
    InvariantViolation { phase: String, reason: String },
}

impl BioSimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BioSimError::InvalidMap { .. } => ErrorKind::InvalidMap,
            BioSimError::InvalidLocation { .. } => ErrorKind::InvalidLocation,
            BioSimError::InvalidAnimalSpec(_) => ErrorKind::InvalidAnimalSpec,
            BioSimError::InvalidParameters(_) => ErrorKind::InvalidParameters,
            BioSimError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }
}

pub type Result<T> = std::result::Result<T, BioSimError>;
