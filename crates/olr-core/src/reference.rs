//! Map-independent location references.
//!
//! A [`LocationReference`] is what the binary codec produces and what the
//! decoder consumes.  The diagnosis engine only ever rewrites the first and
//! last [`Lrp`] of a [`LineReference`] and its offsets; everything else is
//! passed through untouched.

use crate::{Coordinates, Fow, Frc};

/// A location reference point: one waypoint of a reference.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lrp {
    pub coord: Coordinates,
    pub frc: Frc,
    pub fow: Fow,
    /// Bearing in degrees clockwise from true north, `[0, 360)`.
    pub bearing_deg: f64,
    /// Lowest FRC to the next point.  `Frc7` on the last point.
    pub lfrcnp: Frc,
    /// Distance to the next point in metres.  `0.0` on the last point.
    pub dnp_m: f64,
}

/// A linear location: at least two LRPs plus trim offsets.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineReference {
    pub points: Vec<Lrp>,
    /// Metres to trim from the start of the path between the first two LRPs.
    pub positive_offset_m: f64,
    /// Metres to trim from the end of the path between the last two LRPs.
    pub negative_offset_m: f64,
}

impl LineReference {
    /// First LRP.  Line references always carry at least two points.
    pub fn first(&self) -> &Lrp {
        &self.points[0]
    }

    /// Last LRP.
    pub fn last(&self) -> &Lrp {
        &self.points[self.points.len() - 1]
    }

    /// `true` when `coord` is exactly the first or last LRP coordinate.
    pub fn is_terminal_coord(&self, coord: Coordinates) -> bool {
        self.first().coord == coord || self.last().coord == coord
    }

    /// A copy with every LRP coordinate passed through `f`.
    pub fn map_coords(&self, f: impl Fn(Coordinates) -> Coordinates) -> LineReference {
        LineReference {
            points:            map_points(&self.points, &f),
            positive_offset_m: self.positive_offset_m,
            negative_offset_m: self.negative_offset_m,
        }
    }
}

fn map_points(points: &[Lrp], f: &impl Fn(Coordinates) -> Coordinates) -> Vec<Lrp> {
    points.iter().map(|p| Lrp { coord: f(p.coord), ..p.clone() }).collect()
}

impl PointAlongLineReference {
    pub fn map_coords(&self, f: impl Fn(Coordinates) -> Coordinates) -> PointAlongLineReference {
        PointAlongLineReference { points: map_points(&self.points, &f), ..self.clone() }
    }
}

/// A point located along a line between two LRPs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointAlongLineReference {
    pub points: Vec<Lrp>,
    pub positive_offset_m: f64,
    /// Raw 2-bit orientation code.
    pub orientation: u8,
    /// Raw 2-bit side-of-road code.
    pub side_of_road: u8,
}

/// A point of interest with an access point on the road network.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoiReference {
    pub access: PointAlongLineReference,
    pub poi: Coordinates,
}

/// Closed set of reference kinds this workspace understands.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocationReference {
    Line(LineReference),
    GeoCoordinate(Coordinates),
    PointAlongLine(PointAlongLineReference),
    Poi(PoiReference),
}

impl LocationReference {
    /// Short name of the reference kind, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            LocationReference::Line(_) => "line",
            LocationReference::GeoCoordinate(_) => "geo-coordinate",
            LocationReference::PointAlongLine(_) => "point-along-line",
            LocationReference::Poi(_) => "poi-with-access-point",
        }
    }

    /// A copy with every coordinate (LRPs and POI) passed through `f`.
    /// Bearings, distances and attributes are kept.
    pub fn map_coords(&self, f: impl Fn(Coordinates) -> Coordinates) -> LocationReference {
        match self {
            LocationReference::Line(l) => LocationReference::Line(l.map_coords(f)),
            LocationReference::GeoCoordinate(c) => LocationReference::GeoCoordinate(f(*c)),
            LocationReference::PointAlongLine(pal) => LocationReference::PointAlongLine(pal.map_coords(f)),
            LocationReference::Poi(poi) => LocationReference::Poi(PoiReference {
                access: poi.access.map_coords(&f),
                poi:    f(poi.poi),
            }),
        }
    }

    /// The line reference, if this is one.
    pub fn as_line(&self) -> Option<&LineReference> {
        match self {
            LocationReference::Line(l) => Some(l),
            _ => None,
        }
    }
}
