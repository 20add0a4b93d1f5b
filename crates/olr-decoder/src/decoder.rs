//! The decoder boundary: what goes in, what comes out.

use thiserror::Error;

use olr_core::{CodecError, Coordinates, LocationReference};
use olr_geo::{join_lines, Crs, GeoError, GeoResult};
use olr_map::{Line, MapError, MapReader};

use crate::DecoderConfig;

/// Resolves a location reference onto the lines of a map.
///
/// Implementations must be deterministic: the same reference, reader
/// contents and config always give the same result.
pub trait Decoder {
    fn decode(
        &self,
        reference: &LocationReference,
        reader: &mut dyn MapReader,
        config: &DecoderConfig,
    ) -> DecodeResult<MapObjects>;
}

/// Why a decode produced no location.
#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error("no candidate lines for LRP {lrp}")]
    NoCandidates { lrp: usize },

    #[error("no acceptable path from LRP {from_lrp} to the next")]
    NoPath { from_lrp: usize },

    #[error("unsupported location reference: {0}")]
    Unsupported(&'static str),

    #[error("invalid code: {0}")]
    Code(#[from] CodecError),

    #[error("map error: {0}")]
    Map(#[from] MapError),

    #[error("geometry error: {0}")]
    Geo(#[from] GeoError),
}

impl DecodeFailure {
    /// `true` when the map simply has no match under the given config, as
    /// opposed to a broken code or store.
    pub fn is_no_match(&self) -> bool {
        matches!(self, DecodeFailure::NoCandidates { .. } | DecodeFailure::NoPath { .. })
    }
}

/// Alias for `Result<T, DecodeFailure>`.
pub type DecodeResult<T> = Result<T, DecodeFailure>;

// ── Results ───────────────────────────────────────────────────────────────────

/// A decoded location, one variant per reference kind.
#[derive(Clone, Debug, PartialEq)]
pub enum MapObjects {
    Line(LineLocation),
    PointAlongLine(PointAlongLineLocation),
    Poi(PoiLocation),
    Coordinates(Coordinates),
}

impl MapObjects {
    pub fn kind(&self) -> &'static str {
        match self {
            MapObjects::Line(_) => "line",
            MapObjects::PointAlongLine(_) => "point-along-line",
            MapObjects::Poi(_) => "poi-with-access-point",
            MapObjects::Coordinates(_) => "coordinates",
        }
    }
}

/// A path of lines with the metres to cut off each end.
#[derive(Clone, Debug, PartialEq)]
pub struct LineLocation {
    /// Consecutive lines; each ends where the next starts.
    pub lines: Vec<Line>,
    pub p_off: f64,
    pub n_off: f64,
    /// CRS of the line geometry, i.e. of the map decoded on.
    pub crs:   Crs,
}

impl LineLocation {
    /// Geometry of every line joined end to end, offsets not applied.
    pub fn joined_geometry(&self) -> GeoResult<Vec<Coordinates>> {
        let geometries: Vec<&[Coordinates]> = self.lines.iter().map(|l| l.geometry.as_slice()).collect();
        join_lines(&geometries)
    }

    /// The located path: joined geometry with `p_off` cut from the start and
    /// `n_off` from the end.  Offsets that consume the whole path leave a
    /// single coordinate.
    pub fn trimmed_geometry(&self) -> GeoResult<Vec<Coordinates>> {
        let joined = self.joined_geometry()?;

        let front = if self.p_off > 0.0 {
            match self.crs.split_line(&joined, self.p_off) {
                (_, Some(rest)) => rest,
                (_, None) => vec![joined[joined.len() - 1]],
            }
        } else {
            joined
        };

        if self.n_off <= 0.0 {
            return Ok(front);
        }
        let keep = self.crs.line_string_length(&front) - self.n_off;
        if keep <= 0.0 {
            return Ok(vec![front[0]]);
        }
        Ok(match self.crs.split_line(&front, keep) {
            (Some(head), _) => head,
            (None, _) => vec![front[0]],
        })
    }
}

/// A position on a single line.
#[derive(Clone, Debug, PartialEq)]
pub struct PointAlongLineLocation {
    pub line:         Line,
    pub meters_into:  f64,
    pub orientation:  u8,
    pub side_of_road: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoiLocation {
    pub access: PointAlongLineLocation,
    pub poi:    Coordinates,
}
