//! Geometry error type.

use thiserror::Error;

use olr_core::Coordinates;

#[derive(Debug, Error)]
pub enum GeoError {
    /// Line `index` does not start where line `index - 1` ends.
    #[error("lines are not connected: line {index} starts at {start}, previous ends at {prev_end}")]
    NotConnected { index: usize, prev_end: Coordinates, start: Coordinates },

    #[error("geometry has no coordinates")]
    EmptyGeometry,

    #[error("buffer radius must be positive, got {0} m")]
    InvalidRadius(f64),
}

pub type GeoResult<T> = Result<T, GeoError>;
