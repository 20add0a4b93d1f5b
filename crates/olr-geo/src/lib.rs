//! `olr-geo` — geometry toolkit for WGS84 and Web Mercator maps.
//!
//! All functions are pure.  Distances are ground metres, bearings are radians
//! measured clockwise from true north in `(−π, π]`.  The free functions work
//! on WGS84; [`Crs`] offers the same operations for any supported CRS.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`crs`]      | `Crs`: per-CRS metric, Web Mercator transforms            |
//! | [`geodesic`] | distance, bearing, extrapolation, interpolation, split/join |
//! | [`buffer`]   | `Buffer`: polygon around a polyline, containment, clipping |
//! | [`error`]    | `GeoError`, `GeoResult<T>`                                |

pub mod buffer;
pub mod crs;
pub mod error;
pub mod geodesic;

#[cfg(test)]
mod tests;

pub use buffer::Buffer;
pub use crs::{lon_lat_to_web_merc, web_merc_to_lon_lat, Crs, EARTH_RADIUS_M};
pub use error::{GeoError, GeoResult};
pub use geodesic::{
    bearing, distance, distance_to_line, extrapolate, interpolate, join_lines,
    line_string_length, project_onto_line, search_rect, split_line,
};
