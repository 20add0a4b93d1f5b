//! Geodesic primitives over WGS84 coordinates.
//!
//! Every measurement goes through Karney's algorithm (`geo::Geodesic`), so
//! results hold anywhere on the ellipsoid, not just near the equator.  Paths
//! are plain coordinate slices; `Vec<Coordinates>` is the owned polyline type
//! throughout the workspace.  The path helpers here are the WGS84 case of the
//! [`Crs`] methods.

use std::f64::consts::PI;

use geo::{Bearing, Destination, Distance, Geodesic, Point, Rect};

use olr_core::Coordinates;

use crate::{Crs, GeoError, GeoResult};

/// Geodesic distance between two coordinates in metres.
#[inline]
pub fn distance(a: Coordinates, b: Coordinates) -> f64 {
    Geodesic.distance(Point::from(a), Point::from(b))
}

/// Forward azimuth from `a` to `b`: radians in `(−π, π]`, zero at true north.
pub fn bearing(a: Coordinates, b: Coordinates) -> f64 {
    let mut deg = Geodesic.bearing(Point::from(a), Point::from(b));
    if deg > 180.0 {
        deg -= 360.0;
    } else if deg <= -180.0 {
        deg += 360.0;
    }
    let rad = deg.to_radians();
    // to_radians(180.0) can land a hair above π
    if rad > PI { PI } else { rad }
}

/// The point `dist_m` metres from `point` along azimuth `bearing_rad`.
#[inline]
pub fn extrapolate(point: Coordinates, dist_m: f64, bearing_rad: f64) -> Coordinates {
    Geodesic
        .destination(Point::from(point), bearing_rad.to_degrees(), dist_m)
        .into()
}

/// Sum of the geodesic lengths of all segments.
pub fn line_string_length(line: &[Coordinates]) -> f64 {
    Crs::Wgs84.line_string_length(line)
}

/// Walk `meters_into` metres along `path`; see [`Crs::interpolate`].
pub fn interpolate(path: &[Coordinates], meters_into: f64) -> GeoResult<Coordinates> {
    Crs::Wgs84.interpolate(path, meters_into)
}

/// Split `line` at `meters_into` metres; see [`Crs::split_line`].
pub fn split_line(
    line: &[Coordinates],
    meters_into: f64,
) -> (Option<Vec<Coordinates>>, Option<Vec<Coordinates>>) {
    Crs::Wgs84.split_line(line, meters_into)
}

/// Concatenate polylines end to end.
///
/// Each line must start exactly on the previous line's last coordinate; the
/// shared coordinate appears once in the result.
pub fn join_lines<L: AsRef<[Coordinates]>>(lines: &[L]) -> GeoResult<Vec<Coordinates>> {
    let mut out: Vec<Coordinates> = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let (&start, rest) = line.split_first().ok_or(GeoError::EmptyGeometry)?;
        match out.last() {
            None => out.push(start),
            Some(&prev_end) if prev_end == start => {}
            Some(&prev_end) => return Err(GeoError::NotConnected { index, prev_end, start }),
        }
        out.extend_from_slice(rest);
    }
    if out.is_empty() {
        return Err(GeoError::EmptyGeometry);
    }
    Ok(out)
}

/// Geodesic distance from `coord` to the closest point of `line`.
pub fn distance_to_line(coord: Coordinates, line: &[Coordinates]) -> f64 {
    Crs::Wgs84.distance_to_line(coord, line)
}

/// Project `coord` onto `line`: `(metres along the line, distance off it)`.
pub fn project_onto_line(coord: Coordinates, line: &[Coordinates]) -> Option<(f64, f64)> {
    Crs::Wgs84.project_onto_line(coord, line)
}

/// Lon/lat rectangle that encloses the circle of `radius_m` around `coord`.
pub fn search_rect(coord: Coordinates, radius_m: f64) -> Rect<f64> {
    Crs::Wgs84.search_rect(coord, radius_m)
}
