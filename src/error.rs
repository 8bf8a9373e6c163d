use thiserror::Error;

/// Errors reported back to the caller by the record store and the exporter.
///
/// None of these are fatal: a rejected operation leaves the store exactly as it was.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    #[error("invalid {kind}: {reason}")]
    Validation { kind: &'static str, reason: String },

    #[error("{kind} '{key}' already exists")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} position {index} out of range (have {len})")]
    OutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("export failed: {0}")]
    ExportFailed(String),
}

impl TrackerError {
    pub fn validation(kind: &'static str, reason: impl Into<String>) -> Self {
        TrackerError::Validation {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
