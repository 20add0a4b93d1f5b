//! WGS84 coordinate type.
//!
//! `Coordinates` stores double-precision longitude/latitude in degrees.
//! Unlike a simulation grid, decoded geometries are compared for *exact*
//! coordinate equality (line joining, first/last LRP detection), so no
//! lossy storage is allowed here.

use geo::{Coord, Point};

/// A WGS84 coordinate pair in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinates> for Coord<f64> {
    #[inline]
    fn from(c: Coordinates) -> Self {
        Coord { x: c.lon, y: c.lat }
    }
}

impl From<Coordinates> for Point<f64> {
    #[inline]
    fn from(c: Coordinates) -> Self {
        Point::new(c.lon, c.lat)
    }
}

impl From<Coord<f64>> for Coordinates {
    #[inline]
    fn from(c: Coord<f64>) -> Self {
        Self { lon: c.x, lat: c.y }
    }
}

impl From<Point<f64>> for Coordinates {
    #[inline]
    fn from(p: Point<f64>) -> Self {
        Self { lon: p.x(), lat: p.y() }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lon, self.lat)
    }
}
