//! Map adapter error type.

use thiserror::Error;

use olr_geo::Crs;

/// Errors produced by `olr-map`.
#[derive(Debug, Error)]
pub enum MapError {
    /// The id was never materialized by this adapter, or has no row.
    #[error("line {0} not found")]
    LineNotFound(String),

    #[error("node {0} not found")]
    NodeNotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("geometry JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored row violates the schema (bad direction code, empty geometry…).
    #[error("invalid row {id}: {reason}")]
    InvalidRow { id: String, reason: String },

    #[error("buffer is in EPSG:{} but the map is in EPSG:{}", .buffer.epsg(), .map.epsg())]
    CrsMismatch { map: Crs, buffer: Crs },
}

/// Alias for `Result<T, MapError>`.
pub type MapResult<T> = Result<T, MapError>;
