//! Buffer polygons around a polyline, in metres on the ground.
//!
//! # Construction
//!
//! The polyline is projected into an azimuthal equidistant frame centred on
//! its first vertex (metres east/north of the centre, measured with the
//! [`Crs`] distance and azimuth).  Each segment becomes a capsule of the
//! requested radius, the capsules are unioned with `geo::BooleanOps`, and the
//! outline is mapped back into the CRS with [`Crs::extrapolate`].
//!
//! The arcs are polygonised with their vertices pushed slightly outward so
//! every point within `radius_m` of the polyline lies inside the polygon.
//!
//! # Queries
//!
//! All containment and clipping queries run in the CRS coordinates against
//! the unprojected polygon.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::{
    BooleanOps, BoundingRect, Contains, Coord, Intersects, LineString, MultiLineString,
    MultiPolygon, Point, Polygon, Rect,
};

use olr_core::Coordinates;

use crate::{Crs, GeoError, GeoResult};

/// Vertices per half circle of a segment capsule.
const ARC_STEPS: usize = 16;

/// A buffer polygon around a source geometry.
#[derive(Clone, Debug)]
pub struct Buffer {
    polygon: MultiPolygon<f64>,
    radius_m: f64,
    crs: Crs,
}

impl Buffer {
    /// Build the buffer of a WGS84 `line` at `radius_m` metres.
    pub fn around(line: &[Coordinates], radius_m: f64) -> GeoResult<Buffer> {
        Buffer::around_in(Crs::Wgs84, line, radius_m)
    }

    /// Build the buffer of `line`, given in `crs` coordinates, at `radius_m`
    /// ground metres.  The polygon stays in `crs`.
    pub fn around_in(crs: Crs, line: &[Coordinates], radius_m: f64) -> GeoResult<Buffer> {
        if radius_m.is_nan() || radius_m <= 0.0 {
            return Err(GeoError::InvalidRadius(radius_m));
        }
        let &origin = line.first().ok_or(GeoError::EmptyGeometry)?;
        let frame = LocalFrame { crs, origin };

        let projected: Vec<Coord<f64>> = line.iter().map(|&c| frame.project(c)).collect();
        // Circumscribe the arcs instead of inscribing them.
        let r = radius_m / (PI / (2 * ARC_STEPS) as f64).cos();

        let mut union = MultiPolygon::new(Vec::new());
        if projected.len() == 1 {
            union = MultiPolygon::new(vec![capsule(projected[0], projected[0], r)]);
        }
        for w in projected.windows(2) {
            let piece = MultiPolygon::new(vec![capsule(w[0], w[1], r)]);
            union = if union.0.is_empty() { piece } else { union.union(&piece) };
        }

        let polygon = MultiPolygon::new(
            union
                .0
                .into_iter()
                .map(|poly| {
                    let (exterior, interiors) = poly.into_inner();
                    Polygon::new(
                        frame.unproject_ring(&exterior),
                        interiors.iter().map(|ring| frame.unproject_ring(ring)).collect(),
                    )
                })
                .collect(),
        );
        Ok(Buffer { polygon, radius_m, crs })
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// The buffer outline, in [`crs`](Self::crs) coordinates.
    pub fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }

    /// `true` when the whole polyline lies inside the buffer.
    ///
    /// A single-coordinate line is tested as a point.
    pub fn contains_line(&self, line: &[Coordinates]) -> bool {
        match line {
            [] => false,
            [only] => self.contains_point(*only),
            _ => {
                let ls = to_line_string(line);
                self.polygon.0.iter().any(|poly| poly.contains(&ls))
            }
        }
    }

    pub fn contains_point(&self, coord: Coordinates) -> bool {
        let p = Point::from(coord);
        self.polygon.0.iter().any(|poly| poly.contains(&p))
    }

    /// `true` when the polyline touches the buffer anywhere.
    pub fn intersects_line(&self, line: &[Coordinates]) -> bool {
        match line {
            [] => false,
            [only] => self.polygon.intersects(&Point::from(*only)),
            _ => self.polygon.intersects(&to_line_string(line)),
        }
    }

    /// Ground length in metres of the part of `line` inside the buffer.
    pub fn intersection_length(&self, line: &[Coordinates]) -> f64 {
        if line.len() < 2 {
            return 0.0;
        }
        let clipped = self
            .polygon
            .clip(&MultiLineString::new(vec![to_line_string(line)]), false);
        clipped
            .0
            .iter()
            .map(|ls| {
                let coords: Vec<Coordinates> = ls.coords().map(|&c| c.into()).collect();
                self.crs.line_string_length(&coords)
            })
            .sum()
    }

    /// Bounding rectangle in CRS coordinates, `None` for an empty polygon.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.polygon.bounding_rect()
    }
}

fn to_line_string(line: &[Coordinates]) -> LineString<f64> {
    line.iter().map(|&c| Coord::from(c)).collect()
}

/// Capsule of radius `r` around segment `a`–`b` in the projected frame.
fn capsule(a: Coord<f64>, b: Coord<f64>, r: f64) -> Polygon<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let heading = if dx == 0.0 && dy == 0.0 { 0.0 } else { dy.atan2(dx) };

    let mut ring = Vec::with_capacity(2 * ARC_STEPS + 3);
    let step = PI / ARC_STEPS as f64;
    // Around `b` from the left normal, through the heading, to the right normal.
    for i in 0..=ARC_STEPS {
        let t = heading + FRAC_PI_2 - step * i as f64;
        ring.push(Coord { x: b.x + r * t.cos(), y: b.y + r * t.sin() });
    }
    // Around `a` from the right normal, through the back, to the left normal.
    for i in 0..=ARC_STEPS {
        let t = heading - FRAC_PI_2 - step * i as f64;
        ring.push(Coord { x: a.x + r * t.cos(), y: a.y + r * t.sin() });
    }
    Polygon::new(LineString::new(ring), Vec::new())
}

/// Azimuthal equidistant frame: `x` metres east, `y` metres north.
struct LocalFrame {
    crs: Crs,
    origin: Coordinates,
}

impl LocalFrame {
    fn project(&self, c: Coordinates) -> Coord<f64> {
        if c == self.origin {
            return Coord { x: 0.0, y: 0.0 };
        }
        let d = self.crs.distance(self.origin, c);
        let az = self.crs.bearing(self.origin, c);
        Coord { x: d * az.sin(), y: d * az.cos() }
    }

    fn unproject(&self, xy: Coord<f64>) -> Coordinates {
        let d = xy.x.hypot(xy.y);
        if d == 0.0 {
            return self.origin;
        }
        self.crs.extrapolate(self.origin, d, xy.x.atan2(xy.y))
    }

    fn unproject_ring(&self, ring: &LineString<f64>) -> LineString<f64> {
        ring.coords().map(|&xy| Coord::from(self.unproject(xy))).collect()
    }
}
