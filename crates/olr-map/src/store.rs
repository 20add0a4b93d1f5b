//! Spatial store boundary.
//!
//! A [`RoadStore`] serves raw rows exactly as stored: one [`RoadRow`] per
//! physical road, whatever its direction.  Splitting rows into directed lines
//! is the adapters' job (see [`crate::arena::virtualize`]).

use geo::Rect;

use olr_core::{Coordinates, Fow, Frc};
use olr_geo::Crs;

use crate::{MapError, MapResult};

/// Travel direction of a stored road, by its numeric code.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Direction {
    /// Code 1: drivable both ways.
    Both = 1,
    /// Code 2: drivable along the stored geometry only.
    Forward = 2,
    /// Code 3: drivable against the stored geometry only.
    Reverse = 3,
}

impl Direction {
    pub fn from_code(code: i64) -> Option<Direction> {
        match code {
            1 => Some(Direction::Both),
            2 => Some(Direction::Forward),
            3 => Some(Direction::Reverse),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// `true` when a line along the stored geometry exists.
    #[inline]
    pub fn has_forward(self) -> bool {
        matches!(self, Direction::Both | Direction::Forward)
    }

    /// `true` when a line against the stored geometry exists.
    #[inline]
    pub fn has_reverse(self) -> bool {
        matches!(self, Direction::Both | Direction::Reverse)
    }

    /// Number of directed lines this row produces.
    #[inline]
    pub fn line_count(self) -> usize {
        if self == Direction::Both { 2 } else { 1 }
    }
}

/// One stored road.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadRow {
    pub id:        String,
    pub fow:       Fow,
    pub frc:       Frc,
    pub direction: Direction,
    pub start_id:  String,
    pub end_id:    String,
    pub length_m:  f64,
    pub geometry:  Vec<Coordinates>,
}

impl RoadRow {
    /// Check the invariants the adapters rely on.
    pub fn validate(&self) -> MapResult<()> {
        if self.geometry.len() < 2 {
            return Err(MapError::InvalidRow {
                id:     self.id.clone(),
                reason: format!("geometry has {} coordinates", self.geometry.len()),
            });
        }
        if self.id.starts_with('-') {
            return Err(MapError::InvalidRow {
                id:     self.id.clone(),
                reason: "stored ids must not start with '-'".into(),
            });
        }
        Ok(())
    }

    /// Bounding rectangle of the geometry, in store coordinates.
    pub fn bounding_rect(&self) -> Rect<f64> {
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for c in &self.geometry {
            min = (min.0.min(c.lon), min.1.min(c.lat));
            max = (max.0.max(c.lon), max.1.max(c.lat));
        }
        Rect::new((min.0, min.1), (max.0, max.1))
    }
}

/// One stored intersection.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionRow {
    pub id:    String,
    pub coord: Coordinates,
}

/// Read access to a road database.
///
/// Results are returned in a stable order so that repeated queries against
/// the same store materialize lines in the same order.  Geometry, rectangles
/// and intersection coordinates are all in the store's [`crs`](Self::crs).
pub trait RoadStore {
    /// CRS of every stored coordinate.
    fn crs(&self) -> Crs {
        Crs::Wgs84
    }

    /// The road with stored id `id`, if any.
    fn road(&self, id: &str) -> MapResult<Option<RoadRow>>;

    fn roads(&self) -> MapResult<Vec<RoadRow>>;

    /// Roads whose bounding rectangle overlaps `rect`.
    fn roads_in_bbox(&self, rect: Rect<f64>) -> MapResult<Vec<RoadRow>>;

    /// Roads that start or end at intersection `node_id`.
    fn roads_at_node(&self, node_id: &str) -> MapResult<Vec<RoadRow>>;

    fn intersection(&self, id: &str) -> MapResult<Option<IntersectionRow>>;

    fn intersections(&self) -> MapResult<Vec<IntersectionRow>>;

    fn intersections_in_bbox(&self, rect: Rect<f64>) -> MapResult<Vec<IntersectionRow>>;

    fn road_count(&self) -> MapResult<usize>;

    fn intersection_count(&self) -> MapResult<usize>;

    /// Number of directed lines the stored roads split into.
    fn directed_line_count(&self) -> MapResult<usize> {
        Ok(self.roads()?.iter().map(|r| r.direction.line_count()).sum())
    }

    /// Rectangle covering every stored road, `None` for an empty store.
    fn extent(&self) -> MapResult<Option<Rect<f64>>>;
}
