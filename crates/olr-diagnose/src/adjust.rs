//! Moving a reference's end points onto the source geometry.
//!
//! A reference's first and last LRPs rarely sit exactly where the located
//! path starts and ends: offsets trim the path, and the codec quantizes
//! coordinates and DNPs.  Before the in-buffer re-decode both points are
//! snapped to the source geometry's endpoints and their bearings and DNPs
//! measured on it again.

use olr_core::{Coordinates, Fow, Frc, LineReference, Lrp};
use olr_geo::{bearing, interpolate, line_string_length, project_onto_line, GeoError, GeoResult};

/// Bearing of `line` at its start, measured towards the point `dist_m`
/// along it.  Degrees, `[0, 360)`.
pub fn start_bearing_deg(line: &[Coordinates], dist_m: f64) -> GeoResult<f64> {
    let start = interpolate(line, 0.0)?;
    let ahead = interpolate(line, dist_m)?;
    Ok(bearing(start, ahead).to_degrees().rem_euclid(360.0))
}

/// Bearing of `line` at its end, measured backwards towards the point
/// `dist_m` before it.
pub fn end_bearing_deg(line: &[Coordinates], dist_m: f64) -> GeoResult<f64> {
    let length = line_string_length(line);
    let end = interpolate(line, length)?;
    let behind = interpolate(line, length - dist_m)?;
    Ok(bearing(end, behind).to_degrees().rem_euclid(360.0))
}

/// `reference` with its first LRP on `source`'s first coordinate, its last
/// LRP on `source`'s last coordinate, and both offsets folded away.
///
/// DNPs next to the moved points are measured along `source`: the first
/// LRP's runs to where the second LRP projects onto `source`, and the
/// second-to-last LRP's runs from its own projection to the end.  With two
/// LRPs that is simply the length of `source`.  Bearings of the moved points
/// are taken from `source` over `bear_dist_m`.  Intermediate LRPs keep
/// their coordinates and bearings.
pub fn adjust_reference(reference: &LineReference, source: &[Coordinates], bear_dist_m: f64) -> GeoResult<LineReference> {
    let (&start, &end) = source.first().zip(source.last()).ok_or(GeoError::EmptyGeometry)?;
    let n = reference.points.len();
    if n < 2 {
        return Err(GeoError::EmptyGeometry);
    }
    let length = line_string_length(source);
    let along = |lrp: &Lrp| project_onto_line(lrp.coord, source).map(|(m, _)| m).ok_or(GeoError::EmptyGeometry);

    let mut adjusted = reference.clone();
    adjusted.positive_offset_m = 0.0;
    adjusted.negative_offset_m = 0.0;

    if n == 2 {
        adjusted.points[0].dnp_m = length;
    } else {
        adjusted.points[0].dnp_m = along(&reference.points[1])?;
        adjusted.points[n - 2].dnp_m = (length - along(&reference.points[n - 2])?).max(0.0);
    }

    let first = &mut adjusted.points[0];
    first.coord = start;
    first.bearing_deg = start_bearing_deg(source, bear_dist_m)?;

    let last = &mut adjusted.points[n - 1];
    last.coord = end;
    last.bearing_deg = end_bearing_deg(source, bear_dist_m)?;

    Ok(adjusted)
}

/// A two-point reference covering all of `geometry`, as a source map would
/// encode a single-class road stretch.
pub fn line_reference_for(geometry: &[Coordinates], frc: Frc, fow: Fow, bear_dist_m: f64) -> GeoResult<LineReference> {
    let (&start, &end) = geometry.first().zip(geometry.last()).ok_or(GeoError::EmptyGeometry)?;
    Ok(LineReference {
        points: vec![
            Lrp {
                coord: start,
                frc,
                fow,
                bearing_deg: start_bearing_deg(geometry, bear_dist_m)?,
                lfrcnp: frc,
                dnp_m: line_string_length(geometry),
            },
            Lrp {
                coord: end,
                frc,
                fow,
                bearing_deg: end_bearing_deg(geometry, bear_dist_m)?,
                lfrcnp: Frc::Frc7,
                dnp_m: 0.0,
            },
        ],
        positive_offset_m: 0.0,
        negative_offset_m: 0.0,
    })
}
