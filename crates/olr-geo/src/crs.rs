//! Coordinate reference systems a map may store its geometry in.
//!
//! | CRS                  | Coordinates          | Measurements                          |
//! |----------------------|----------------------|---------------------------------------|
//! | [`Crs::Wgs84`]       | lon/lat degrees      | geodesic on the WGS84 ellipsoid       |
//! | [`Crs::WebMercator`] | EPSG:3857 x/y metres | planar, scaled back to ground metres  |
//!
//! OpenLR references always carry WGS84 coordinates; [`Crs::project`]
//! moves them into a map's CRS before decoding.  Both variants keep the
//! `Coordinates` field names: `lon` holds x and `lat` holds y in Web
//! Mercator.
//!
//! Web Mercator stretches lengths by `1 / cos(lat)`.  Planar lengths are
//! divided by that factor at each segment's midpoint, so DNPs (which are
//! ground metres) compare directly against either kind of map.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, SQRT_2};

use geo::{Closest, ClosestPoint, Coord, Line, Point, Rect};

use olr_core::Coordinates;

use crate::geodesic;
use crate::{GeoError, GeoResult};

/// Sphere radius of EPSG:3857.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// The CRS of a map's stored coordinates, and the metric that goes with it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Crs {
    /// EPSG:4326.
    #[default]
    Wgs84,
    /// EPSG:3857, spherical Web Mercator.
    WebMercator,
}

/// WGS84 degrees to Web Mercator metres.
pub fn lon_lat_to_web_merc(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Web Mercator metres to WGS84 degrees.
pub fn web_merc_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// Web Mercator scale factor at northing `y`, i.e. `1 / cos(lat)`.
#[inline]
fn merc_scale(y: f64) -> f64 {
    (y / EARTH_RADIUS_M).cosh()
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
        }
    }

    /// Move a WGS84 coordinate into this CRS.
    pub fn project(self, c: Coordinates) -> Coordinates {
        match self {
            Crs::Wgs84 => c,
            Crs::WebMercator => {
                let (x, y) = lon_lat_to_web_merc(c.lon, c.lat);
                Coordinates::new(x, y)
            }
        }
    }

    /// Move a coordinate of this CRS back to WGS84.
    pub fn unproject(self, c: Coordinates) -> Coordinates {
        match self {
            Crs::Wgs84 => c,
            Crs::WebMercator => {
                let (lon, lat) = web_merc_to_lon_lat(c.lon, c.lat);
                Coordinates::new(lon, lat)
            }
        }
    }

    /// Ground distance between two coordinates in metres.
    pub fn distance(self, a: Coordinates, b: Coordinates) -> f64 {
        match self {
            Crs::Wgs84 => geodesic::distance(a, b),
            Crs::WebMercator => (b.lon - a.lon).hypot(b.lat - a.lat) / merc_scale((a.lat + b.lat) / 2.0),
        }
    }

    /// Azimuth from `a` to `b`: radians in `(−π, π]`, zero at north.
    pub fn bearing(self, a: Coordinates, b: Coordinates) -> f64 {
        match self {
            Crs::Wgs84 => geodesic::bearing(a, b),
            // Mercator is conformal, so grid north is true north.
            Crs::WebMercator => (b.lon - a.lon).atan2(b.lat - a.lat),
        }
    }

    /// The point `dist_m` ground metres from `point` along `bearing_rad`.
    pub fn extrapolate(self, point: Coordinates, dist_m: f64, bearing_rad: f64) -> Coordinates {
        match self {
            Crs::Wgs84 => geodesic::extrapolate(point, dist_m, bearing_rad),
            Crs::WebMercator => {
                let (sin, cos) = bearing_rad.sin_cos();
                // Second pass takes the scale at the midpoint, as `distance` does.
                let rough_y = point.lat + dist_m * merc_scale(point.lat) * cos;
                let k = merc_scale((point.lat + rough_y) / 2.0);
                Coordinates::new(point.lon + dist_m * k * sin, point.lat + dist_m * k * cos)
            }
        }
    }

    /// Sum of the segment lengths.
    pub fn line_string_length(self, line: &[Coordinates]) -> f64 {
        line.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// Walk `meters_into` metres along `path`.
    ///
    /// Lands exactly on a vertex when the distance matches one, otherwise
    /// extrapolates from the preceding vertex along its segment.  Distances
    /// past the end clamp to the last vertex; `meters_into <= 0` gives the
    /// first.
    pub fn interpolate(self, path: &[Coordinates], meters_into: f64) -> GeoResult<Coordinates> {
        let (&first, &last) = path.first().zip(path.last()).ok_or(GeoError::EmptyGeometry)?;
        if meters_into <= 0.0 {
            return Ok(first);
        }

        let mut walked = 0.0;
        for (i, w) in path.windows(2).enumerate() {
            let seg = self.distance(w[0], w[1]);
            if walked + seg > meters_into {
                let offset = meters_into - walked;
                if offset == 0.0 {
                    return Ok(path[i]);
                }
                return Ok(self.extrapolate(w[0], offset, self.bearing(w[0], w[1])));
            }
            walked += seg;
        }
        Ok(last)
    }

    /// Split `line` at `meters_into` metres.
    ///
    /// The prefix is `None` when the split is at the start, the suffix is
    /// `None` when the split is at or past the end.  Otherwise both halves
    /// share the split coordinate.
    pub fn split_line(
        self,
        line: &[Coordinates],
        meters_into: f64,
    ) -> (Option<Vec<Coordinates>>, Option<Vec<Coordinates>>) {
        if line.is_empty() {
            return (None, None);
        }
        if meters_into <= 0.0 {
            return (None, Some(line.to_vec()));
        }

        let mut walked = 0.0;
        for (i, w) in line.windows(2).enumerate() {
            let seg = self.distance(w[0], w[1]);
            if walked + seg > meters_into {
                let offset = meters_into - walked;
                if offset == 0.0 {
                    return (Some(line[..=i].to_vec()), Some(line[i..].to_vec()));
                }
                let cut = self.extrapolate(w[0], offset, self.bearing(w[0], w[1]));

                let mut prefix = line[..=i].to_vec();
                prefix.push(cut);
                let mut suffix = Vec::with_capacity(line.len() - i);
                suffix.push(cut);
                suffix.extend_from_slice(&line[i + 1..]);
                return (Some(prefix), Some(suffix));
            }
            walked += seg;
        }
        (Some(line.to_vec()), None)
    }

    /// Distance from `coord` to the closest point of `line`.
    pub fn distance_to_line(self, coord: Coordinates, line: &[Coordinates]) -> f64 {
        self.project_onto_line(coord, line).map_or(f64::INFINITY, |(_, d)| d)
    }

    /// Project `coord` onto `line`: `(metres along the line, distance off it)`.
    ///
    /// The closest point of each segment is found in coordinate space and
    /// then measured with [`distance`](Self::distance).  For WGS84 that is
    /// accurate over the short ranges decoders search.  Ties go to the
    /// earliest segment.  `None` for an empty line.
    pub fn project_onto_line(self, coord: Coordinates, line: &[Coordinates]) -> Option<(f64, f64)> {
        match line {
            [] => None,
            [only] => Some((0.0, self.distance(coord, *only))),
            _ => {
                let p = Point::from(coord);
                let mut walked = 0.0;
                let mut best: Option<(f64, f64)> = None;
                for w in line.windows(2) {
                    let seg = Line::new(Coord::from(w[0]), Coord::from(w[1]));
                    let foot: Coordinates = match seg.closest_point(&p) {
                        Closest::Intersection(q) | Closest::SinglePoint(q) => q.into(),
                        Closest::Indeterminate => w[0],
                    };
                    let off = self.distance(coord, foot);
                    if best.is_none_or(|(_, d)| off < d) {
                        best = Some((walked + self.distance(w[0], foot), off));
                    }
                    walked += self.distance(w[0], w[1]);
                }
                best
            }
        }
    }

    /// Rectangle in this CRS enclosing the circle of `radius_m` around
    /// `coord`.
    ///
    /// The corners are projected `radius_m·√2` along the 225° and 45°
    /// azimuths, so the rectangle extends at least `radius_m` in each
    /// cardinal direction.  It is only a prefilter; callers must still check
    /// exact distances.
    pub fn search_rect(self, coord: Coordinates, radius_m: f64) -> Rect<f64> {
        let diagonal = radius_m * SQRT_2;
        let lower_left = self.extrapolate(coord, diagonal, -3.0 * FRAC_PI_4);
        let upper_right = self.extrapolate(coord, diagonal, FRAC_PI_4);
        Rect::new(Coord::from(lower_left), Coord::from(upper_right))
    }
}
