//! OpenLR physical data format, version 3.
//!
//! # Layout
//!
//! ```text
//! status | first LRP (9 B) | intermediate LRPs (7 B each) | last LRP (6 B) | offsets (0–2 B)
//! ```
//!
//! The status byte carries the version (bits 0–2), the attribute flag
//! (bit 3), area flags (bits 4 and 6) and the point flag (bit 5).  The first
//! LRP uses absolute 24-bit coordinates; all later LRPs are relative to the
//! previous one in units of 10⁻⁵ degrees.
//!
//! Only line references can be written; every kind in
//! [`LocationReference`] can be read.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;

use crate::{
    CodecError, CodecResult, Coordinates, Fow, Frc, LineReference, LocationReference, Lrp,
    PoiReference, PointAlongLineReference,
};

const VERSION: u8 = 3;

/// 2²⁴ / 360: absolute coordinate resolution.
const BIT24_FACTOR: f64 = 16_777_216.0 / 360.0;
/// Relative coordinates are stored in 10⁻⁵ degrees.
const DECA_MICRO_DEG: f64 = 100_000.0;
const DISTANCE_INTERVAL_M: f64 = 58.6;
const BEARING_SECTOR_DEG: f64 = 11.25;

const FIRST_LRP_SIZE: usize = 9;
const INTERMEDIATE_LRP_SIZE: usize = 7;
const LAST_LRP_SIZE: usize = 6;
const MIN_LINE_SIZE: usize = 1 + FIRST_LRP_SIZE + LAST_LRP_SIZE;
const GEO_COORD_SIZE: usize = 7;
const POINT_ALONG_LINE_SIZE: usize = 16;
const POI_SIZE: usize = 20;

const STATUS_ATTRIBUTE_FLAG: u8 = 0x08;
const STATUS_AREA_FLAG_0: u8 = 0x10;
const STATUS_POINT_FLAG: u8 = 0x20;
const STATUS_AREA_FLAG_1: u8 = 0x40;

const POSITIVE_OFFSET_FLAG: u8 = 0x40;
const NEGATIVE_OFFSET_FLAG: u8 = 0x20;

// ── Reading ───────────────────────────────────────────────────────────────────

/// Decode a base64 OpenLR code (e.g. `"CwmShiVYczPJBgCs/y0zAQ=="`).
pub fn decode_base64(code: &str) -> CodecResult<LocationReference> {
    let data = BASE64_STANDARD.decode(code.trim())?;
    decode_binary(&data)
}

/// Decode raw OpenLR bytes.
pub fn decode_binary(data: &[u8]) -> CodecResult<LocationReference> {
    let Some(&status) = data.first() else {
        return Err(CodecError::InvalidLength { kind: "empty", len: 0 });
    };

    let version = status & 0x07;
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let is_area = status & (STATUS_AREA_FLAG_0 | STATUS_AREA_FLAG_1) != 0;
    let is_point = status & STATUS_POINT_FLAG != 0;
    let has_attributes = status & STATUS_ATTRIBUTE_FLAG != 0;
    let len = data.len();

    match (is_area, is_point, has_attributes) {
        (false, false, true) => decode_line(data).map(LocationReference::Line),
        (false, true, false) if len == GEO_COORD_SIZE => {
            let mut r = ByteReader::new(&data[1..], "geo-coordinate");
            let lon = r.absolute()?;
            let lat = r.absolute()?;
            Ok(LocationReference::GeoCoordinate(Coordinates::new(lon, lat)))
        }
        (false, true, true) if len == POINT_ALONG_LINE_SIZE || len == POINT_ALONG_LINE_SIZE + 1 => {
            let mut r = ByteReader::new(&data[1..], "point-along-line");
            decode_point_along_line(&mut r, len > POINT_ALONG_LINE_SIZE)
                .map(LocationReference::PointAlongLine)
        }
        (false, true, true) if len == POI_SIZE || len == POI_SIZE + 1 => {
            let mut r = ByteReader::new(&data[1..], "poi");
            let access = decode_point_along_line(&mut r, len > POI_SIZE)?;
            let anchor = access.points[0].coord;
            let lon = r.relative(anchor.lon)?;
            let lat = r.relative(anchor.lat)?;
            Ok(LocationReference::Poi(PoiReference { access, poi: Coordinates::new(lon, lat) }))
        }
        _ => Err(CodecError::UnsupportedLocationType { status, len }),
    }
}

fn decode_line(data: &[u8]) -> CodecResult<LineReference> {
    let len = data.len();
    if len < MIN_LINE_SIZE {
        return Err(CodecError::InvalidLength { kind: "line", len });
    }
    let intermediates = (len - MIN_LINE_SIZE) / INTERMEDIATE_LRP_SIZE;
    let offset_bytes = (len - MIN_LINE_SIZE) % INTERMEDIATE_LRP_SIZE;

    let mut r = ByteReader::new(&data[1..], "line");
    let mut points = Vec::with_capacity(intermediates + 2);

    let first = Coordinates::new(r.absolute()?, r.absolute()?);
    points.push(r.lrp_attributes(first)?);

    let mut prev = first;
    for _ in 0..intermediates {
        let coord = Coordinates::new(r.relative(prev.lon)?, r.relative(prev.lat)?);
        points.push(r.lrp_attributes(coord)?);
        prev = coord;
    }

    let coord = Coordinates::new(r.relative(prev.lon)?, r.relative(prev.lat)?);
    let attr1 = r.byte()?;
    let attr4 = r.byte()?;

    let has_positive = attr4 & POSITIVE_OFFSET_FLAG != 0;
    let has_negative = attr4 & NEGATIVE_OFFSET_FLAG != 0;
    if usize::from(has_positive) + usize::from(has_negative) != offset_bytes {
        return Err(CodecError::InvalidLength { kind: "line", len });
    }

    let positive_offset_m = if has_positive {
        offset_m(r.byte()?, points[0].dnp_m)
    } else {
        0.0
    };
    let negative_offset_m = if has_negative {
        offset_m(r.byte()?, points[points.len() - 1].dnp_m)
    } else {
        0.0
    };

    points.push(Lrp {
        coord,
        frc: Frc::from_code(attr1 >> 3),
        fow: Fow::from_code(attr1),
        bearing_deg: bearing_deg(attr4),
        lfrcnp: Frc::Frc7,
        dnp_m: 0.0,
    });

    Ok(LineReference { points, positive_offset_m, negative_offset_m })
}

fn decode_point_along_line(
    r: &mut ByteReader<'_>,
    has_offset_byte: bool,
) -> CodecResult<PointAlongLineReference> {
    let first_coord = Coordinates::new(r.absolute()?, r.absolute()?);
    let first_attr1 = r.peek()?;
    let first = r.lrp_attributes(first_coord)?;

    let coord = Coordinates::new(r.relative(first_coord.lon)?, r.relative(first_coord.lat)?);
    let attr1 = r.byte()?;
    let attr4 = r.byte()?;
    let has_positive = attr4 & POSITIVE_OFFSET_FLAG != 0;
    if has_positive != has_offset_byte {
        return Err(CodecError::InvalidLength { kind: r.kind, len: r.data.len() + 1 });
    }
    let positive_offset_m = if has_positive { offset_m(r.byte()?, first.dnp_m) } else { 0.0 };

    let last = Lrp {
        coord,
        frc: Frc::from_code(attr1 >> 3),
        fow: Fow::from_code(attr1),
        bearing_deg: bearing_deg(attr4),
        lfrcnp: Frc::Frc7,
        dnp_m: 0.0,
    };

    Ok(PointAlongLineReference {
        points: vec![first, last],
        positive_offset_m,
        orientation: first_attr1 >> 6,
        side_of_road: attr1 >> 6,
    })
}

/// Bounds-checked cursor over the body of a reference.
struct ByteReader<'a> {
    data: &'a [u8],
    pos:  usize,
    kind: &'static str,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8], kind: &'static str) -> Self {
        Self { data, pos: 0, kind }
    }

    fn peek(&self) -> CodecResult<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(CodecError::InvalidLength { kind: self.kind, len: self.data.len() + 1 })
    }

    fn byte(&mut self) -> CodecResult<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    /// 24-bit signed absolute coordinate in degrees.
    fn absolute(&mut self) -> CodecResult<f64> {
        let raw = (i32::from(self.byte()?) << 16)
            | (i32::from(self.byte()?) << 8)
            | i32::from(self.byte()?);
        // Sign-extend from 24 bits.
        let v = (raw << 8) >> 8;
        Ok((f64::from(v) - f64::from(v.signum()) * 0.5) / BIT24_FACTOR)
    }

    /// 16-bit signed coordinate relative to `prev`, in degrees.
    fn relative(&mut self, prev: f64) -> CodecResult<f64> {
        let v = i16::from_be_bytes([self.byte()?, self.byte()?]);
        Ok(prev + f64::from(v) / DECA_MICRO_DEG)
    }

    /// The three attribute bytes of a first or intermediate LRP.
    fn lrp_attributes(&mut self, coord: Coordinates) -> CodecResult<Lrp> {
        let attr1 = self.byte()?;
        let attr2 = self.byte()?;
        let attr3 = self.byte()?;
        Ok(Lrp {
            coord,
            frc: Frc::from_code(attr1 >> 3),
            fow: Fow::from_code(attr1),
            bearing_deg: bearing_deg(attr2),
            lfrcnp: Frc::from_code(attr2 >> 5),
            dnp_m: (f64::from(attr3) + 0.5) * DISTANCE_INTERVAL_M,
        })
    }
}

#[inline]
fn bearing_deg(attr: u8) -> f64 {
    (f64::from(attr & 0x1F) + 0.5) * BEARING_SECTOR_DEG
}

#[inline]
fn offset_m(bucket: u8, dnp_m: f64) -> f64 {
    (f64::from(bucket) + 0.5) / 256.0 * dnp_m
}

// ── Writing ───────────────────────────────────────────────────────────────────

/// Encode a line reference as base64.
pub fn encode_line_base64(line: &LineReference) -> CodecResult<String> {
    encode_line_binary(line).map(|bytes| BASE64_STANDARD.encode(bytes))
}

/// Encode a line reference as raw OpenLR bytes.
///
/// Coordinates, bearings, distances and offsets are quantized exactly as the
/// format prescribes; relative coordinates are computed against the
/// *quantized* previous point so errors do not accumulate.
pub fn encode_line_binary(line: &LineReference) -> CodecResult<Vec<u8>> {
    let n = line.points.len();
    if n < 2 {
        return Err(CodecError::TooFewPoints(n));
    }

    let mut out = Vec::with_capacity(MIN_LINE_SIZE + (n - 2) * INTERMEDIATE_LRP_SIZE + 2);
    out.push(STATUS_ATTRIBUTE_FLAG | VERSION);

    let first = &line.points[0];
    let mut prev = Coordinates::new(
        push_absolute(&mut out, first.coord.lon),
        push_absolute(&mut out, first.coord.lat),
    );
    push_lrp_attributes(&mut out, first);

    for p in &line.points[1..n - 1] {
        prev = Coordinates::new(
            push_relative(&mut out, p.coord.lon, prev.lon)?,
            push_relative(&mut out, p.coord.lat, prev.lat)?,
        );
        push_lrp_attributes(&mut out, p);
    }

    let last = &line.points[n - 1];
    push_relative(&mut out, last.coord.lon, prev.lon)?;
    push_relative(&mut out, last.coord.lat, prev.lat)?;
    out.push(attr1(last));

    let mut attr4 = bearing_code(last.bearing_deg);
    if line.positive_offset_m > 0.0 {
        attr4 |= POSITIVE_OFFSET_FLAG;
    }
    if line.negative_offset_m > 0.0 {
        attr4 |= NEGATIVE_OFFSET_FLAG;
    }
    out.push(attr4);

    if line.positive_offset_m > 0.0 {
        out.push(offset_code(line.positive_offset_m, first.dnp_m));
    }
    if line.negative_offset_m > 0.0 {
        out.push(offset_code(line.negative_offset_m, line.points[n - 2].dnp_m));
    }
    Ok(out)
}

/// Write a 24-bit absolute coordinate and return its decoded value.
fn push_absolute(out: &mut Vec<u8>, deg: f64) -> f64 {
    // Decoded values sit exactly on a half step; nudge them back into their bucket.
    let v = (deg.signum() * (0.5 + 1e-6) + deg * BIT24_FACTOR) as i32;
    out.extend_from_slice(&v.to_be_bytes()[1..]);
    (f64::from(v) - f64::from(v.signum()) * 0.5) / BIT24_FACTOR
}

/// Write a 16-bit relative coordinate and return its decoded value.
fn push_relative(out: &mut Vec<u8>, deg: f64, prev: f64) -> CodecResult<f64> {
    let delta = (deg - prev) * DECA_MICRO_DEG;
    let rounded = delta.round();
    if rounded < f64::from(i16::MIN) || rounded > f64::from(i16::MAX) {
        return Err(CodecError::RelativeOverflow { delta: deg - prev });
    }
    out.extend_from_slice(&(rounded as i16).to_be_bytes());
    Ok(prev + rounded / DECA_MICRO_DEG)
}

fn push_lrp_attributes(out: &mut Vec<u8>, p: &Lrp) {
    out.push(attr1(p));
    out.push((p.lfrcnp.code() << 5) | bearing_code(p.bearing_deg));
    out.push(dnp_code(p.dnp_m));
}

#[inline]
fn attr1(p: &Lrp) -> u8 {
    (p.frc.code() << 3) | p.fow.code()
}

#[inline]
fn bearing_code(deg: f64) -> u8 {
    ((deg.rem_euclid(360.0) / BEARING_SECTOR_DEG) as u8).min(31)
}

#[inline]
fn dnp_code(dnp_m: f64) -> u8 {
    (dnp_m.max(0.0) / DISTANCE_INTERVAL_M).min(255.0) as u8
}

/// Offset bucket relative to the *decoded* DNP the reader will see.
fn offset_code(offset_m: f64, dnp_m: f64) -> u8 {
    let decoded_dnp = (f64::from(dnp_code(dnp_m)) + 0.5) * DISTANCE_INTERVAL_M;
    (offset_m / decoded_dnp * 256.0).clamp(0.0, 255.0) as u8
}
