//! Error types of the transform pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Why a raw row did not become a price point. Rows failing this way are
/// dropped and the series continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipRow {
    #[error("blank row")]
    Blank,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unparsable date: '{0}'")]
    InvalidDate(String),

    #[error("unparsable value: '{0}'")]
    InvalidValue(String),
}

/// A rate table exists but cannot be used. Surfaced to the operator.
#[derive(Debug, Error)]
pub enum RateTableError {
    #[error("failed to read rate table {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rate record at {}:{line}: {reason}", path.display())]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Failure writing one destination pair of an instrument.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
