//! Error types for olr-diagnose.

use thiserror::Error;

use olr_core::CodecError;
use olr_decoder::DecodeFailure;
use olr_geo::GeoError;
use olr_map::MapError;

/// Errors that abort one analysis (reported as `UNKNOWN_ERROR`) or a batch.
#[derive(Debug, Error)]
pub enum DiagnoseError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("geometry error: {0}")]
    Geo(#[from] GeoError),

    #[error("map error: {0}")]
    Map(#[from] MapError),

    #[error("decoder error: {0}")]
    Decode(#[from] DecodeFailure),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("case {row}: {reason}")]
    InvalidCase { row: usize, reason: String },
}

/// Alias for `Result<T, DiagnoseError>`.
pub type DiagnoseResult<T> = Result<T, DiagnoseError>;
