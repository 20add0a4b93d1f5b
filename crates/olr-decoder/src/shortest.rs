//! Default [`Decoder`]: scored candidate lines per LRP, shortest paths
//! between consecutive candidates.
//!
//! # Candidates
//!
//! Every line within `search_radius_m` of an LRP is projected onto.  Its
//! score is the weighted geometric mean of four dimension scores, so a
//! zero in any weighted dimension rejects the candidate outright:
//!
//! | Dimension | Score                                             |
//! |-----------|---------------------------------------------------|
//! | geo       | `1 − distance / search_radius`                    |
//! | FRC       | `1 − |Δfrc| / 7`                                  |
//! | FOW       | `fow_standin_score[lrp fow][line fow]`            |
//! | bearing   | `1 − deviation / 180°`                            |
//!
//! Bearings are measured over `bear_dist_m` from the projection point,
//! forward for every LRP but the last, backward for the last one.  Every
//! measurement uses the reader's CRS; LRPs must already be in it.
//!
//! # Paths
//!
//! Dijkstra over `outgoing_lines`, never turning back onto the peer of the
//! line just driven.  Costs are whole centimetres; ties pop in `NodeIdx`
//! order, so the search is deterministic.  A path is accepted when every
//! line's FRC is within the LRP's tolerated lowest FRC and its length is
//! within `dnp_tolerance_m` of the LRP's DNP.  Consecutive LRPs are matched
//! depth first over the ranked candidates.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use olr_core::{
    Frc, LineIdx, LineReference, LocationReference, Lrp, NodeIdx, PointAlongLineReference,
};
use olr_geo::{Crs, GeoResult};
use olr_map::{Line, MapReader};

use crate::{
    DecodeFailure, DecodeResult, Decoder, DecoderConfig, LineLocation, MapObjects, PoiLocation,
    PointAlongLineLocation,
};

/// Candidate pairs tried per decode before giving up.
const MAX_PAIR_ATTEMPTS: usize = 1_000;

/// A projection this close to the far end of a line leaves nothing to
/// drive on.
const END_SLACK_M: f64 = 0.5;

/// Shortest-path decoder with weighted candidate scoring.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShortestPathDecoder;

impl Decoder for ShortestPathDecoder {
    fn decode(
        &self,
        reference: &LocationReference,
        reader: &mut dyn MapReader,
        config: &DecoderConfig,
    ) -> DecodeResult<MapObjects> {
        match reference {
            LocationReference::Line(line) => decode_line(reader, line, config).map(MapObjects::Line),
            LocationReference::GeoCoordinate(coord) => Ok(MapObjects::Coordinates(*coord)),
            LocationReference::PointAlongLine(pal) => {
                decode_point(reader, pal, config).map(MapObjects::PointAlongLine)
            }
            LocationReference::Poi(poi) => {
                let access = decode_point(reader, &poi.access, config)?;
                Ok(MapObjects::Poi(PoiLocation { access, poi: poi.poi }))
            }
        }
    }
}

// ── Candidates ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct Candidate {
    line:    LineIdx,
    along_m: f64,
    score:   f64,
}

fn candidates(
    reader: &mut dyn MapReader,
    lrp: &Lrp,
    is_last: bool,
    config: &DecoderConfig,
) -> DecodeResult<Vec<Candidate>> {
    let crs = reader.crs();
    let mut found = Vec::new();
    for h in reader.find_lines_close_to(lrp.coord, config.search_radius_m)? {
        let line = reader.line(h);
        let Some((along_m, off_m)) = crs.project_onto_line(lrp.coord, &line.geometry) else {
            continue;
        };
        let length = crs.line_string_length(&line.geometry);
        let at_wrong_end = if is_last { along_m < END_SLACK_M } else { length - along_m < END_SLACK_M };
        if at_wrong_end {
            continue;
        }

        let deviation = match line_bearing_deg(crs, line, along_m, is_last, config.bear_dist_m)? {
            Some(deg) => bearing_deviation(lrp.bearing_deg, deg),
            None => 0.0,
        };
        if deviation > config.max_bear_deviation_deg {
            trace!(line = %line.id, deviation, "bearing out of tolerance");
            continue;
        }

        let score = score(lrp, line, off_m, deviation, config);
        if score < config.min_score {
            trace!(line = %line.id, score, "score below minimum");
            continue;
        }
        found.push(Candidate { line: h, along_m, score });
    }

    found.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| reader.line(a.line).id.cmp(&reader.line(b.line).id))
    });
    if config.candidate_threshold > 0 {
        found.truncate(config.candidate_threshold);
    }
    Ok(found)
}

/// Bearing of `line` at `along_m`, in degrees `[0, 360)`.  `None` when the
/// line is too short to give a direction.
fn line_bearing_deg(crs: Crs, line: &Line, along_m: f64, backward: bool, dist_m: f64) -> GeoResult<Option<f64>> {
    let here = crs.interpolate(&line.geometry, along_m)?;
    let there = if backward {
        crs.interpolate(&line.geometry, along_m - dist_m)?
    } else {
        crs.interpolate(&line.geometry, along_m + dist_m)?
    };
    if crs.distance(here, there) == 0.0 {
        return Ok(None);
    }
    Ok(Some(crs.bearing(here, there).to_degrees().rem_euclid(360.0)))
}

/// Smallest angle between two bearings, `[0, 180]`.
fn bearing_deviation(a_deg: f64, b_deg: f64) -> f64 {
    let d = (a_deg - b_deg).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn score(lrp: &Lrp, line: &Line, off_m: f64, deviation_deg: f64, config: &DecoderConfig) -> f64 {
    let frc_delta = (f64::from(lrp.frc.code()) - f64::from(line.frc.code())).abs();
    weighted_geometric_mean(&[
        (config.geo_weight, (1.0 - off_m / config.search_radius_m).max(0.0)),
        (config.frc_weight, 1.0 - frc_delta / 7.0),
        (config.fow_weight, config.fow_score(lrp.fow, line.fow)),
        (config.bear_weight, 1.0 - deviation_deg / 180.0),
    ])
}

/// `Π sᵢ^(wᵢ/Σw)` over the parts with a positive weight; `1` when none has.
fn weighted_geometric_mean(parts: &[(f64, f64)]) -> f64 {
    let total: f64 = parts.iter().filter(|(w, _)| *w > 0.0).map(|(w, _)| w).sum();
    if total <= 0.0 {
        return 1.0;
    }
    let mut log_sum = 0.0;
    for &(w, s) in parts.iter().filter(|(w, _)| *w > 0.0) {
        if s <= 0.0 {
            return 0.0;
        }
        log_sum += w * s.ln();
    }
    (log_sum / total).exp()
}

// ── Paths ─────────────────────────────────────────────────────────────────────

#[inline]
fn to_cm(m: f64) -> u64 {
    (m.max(0.0) * 100.0).round() as u64
}

/// Lines from `from` to `to` (both included) that satisfy `lrp`'s lowest
/// FRC and DNP, or `None`.
fn route(
    reader: &mut dyn MapReader,
    from: Candidate,
    to: Candidate,
    lrp: &Lrp,
    config: &DecoderConfig,
) -> DecodeResult<Option<Vec<LineIdx>>> {
    let lowest = config.tolerated_frc(lrp.lfrcnp);
    if reader.line(from.line).frc > lowest || reader.line(to.line).frc > lowest {
        return Ok(None);
    }
    let tolerance = config.dnp_tolerance_m(lrp.dnp_m);
    let accept = |length: f64| (length - lrp.dnp_m).abs() <= tolerance;

    if from.line == to.line && to.along_m >= from.along_m {
        let length = to.along_m - from.along_m;
        return Ok(accept(length).then(|| vec![from.line]));
    }

    let head = (reader.line(from.line).length_m - from.along_m).max(0.0);
    let tail = to.along_m;
    let budget = lrp.dnp_m + tolerance - head - tail;
    if budget < 0.0 {
        return Ok(None);
    }

    let source = reader.end_node(from.line)?;
    let target = reader.start_node(to.line)?;
    let Some(middle) = shortest_path(reader, source, from.line, target, lowest, to_cm(budget))? else {
        return Ok(None);
    };
    let length = head + middle.iter().map(|&l| reader.line(l).length_m).sum::<f64>() + tail;
    if !accept(length) {
        trace!(length, dnp = lrp.dnp_m, "path length out of tolerance");
        return Ok(None);
    }

    let mut lines = Vec::with_capacity(middle.len() + 2);
    lines.push(from.line);
    lines.extend(middle);
    lines.push(to.line);
    Ok(Some(lines))
}

/// Dijkstra from `source` to `target`, having arrived at `source` on
/// `entry`.  Lines below `lowest` are skipped; so are paths longer than
/// `budget_cm`.
fn shortest_path(
    reader: &mut dyn MapReader,
    source: NodeIdx,
    entry: LineIdx,
    target: NodeIdx,
    lowest: Frc,
    budget_cm: u64,
) -> DecodeResult<Option<Vec<LineIdx>>> {
    if source == target {
        return Ok(Some(Vec::new()));
    }

    let mut dist: FxHashMap<NodeIdx, u64> = FxHashMap::default();
    // via[v] = (line that reached v, node it left from).
    let mut via: FxHashMap<NodeIdx, (LineIdx, NodeIdx)> = FxHashMap::default();
    dist.insert(source, 0);

    let mut heap: BinaryHeap<Reverse<(u64, NodeIdx)>> = BinaryHeap::new();
    heap.push(Reverse((0, source)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == target {
            return Ok(Some(reconstruct(&via, source, target)));
        }
        if dist.get(&node).is_some_and(|&d| cost > d) {
            continue;
        }

        let entered_by = via.get(&node).map_or(entry, |&(l, _)| l);
        for line in reader.outgoing_lines(node, Some(entered_by))? {
            let l = reader.line(line);
            if l.frc > lowest {
                continue;
            }
            let next_cost = cost.saturating_add(to_cm(l.length_m));
            if next_cost > budget_cm {
                continue;
            }
            let next = reader.end_node(line)?;
            if dist.get(&next).is_none_or(|&d| next_cost < d) {
                dist.insert(next, next_cost);
                via.insert(next, (line, node));
                heap.push(Reverse((next_cost, next)));
            }
        }
    }
    Ok(None)
}

fn reconstruct(via: &FxHashMap<NodeIdx, (LineIdx, NodeIdx)>, source: NodeIdx, target: NodeIdx) -> Vec<LineIdx> {
    let mut lines = Vec::new();
    let mut cur = target;
    while cur != source {
        let Some(&(line, prev)) = via.get(&cur) else { break };
        lines.push(line);
        cur = prev;
    }
    lines.reverse();
    lines
}

// ── Line references ───────────────────────────────────────────────────────────

/// Depth-first match of consecutive LRPs over their ranked candidates.
struct Search<'a> {
    points:     &'a [Lrp],
    config:     &'a DecoderConfig,
    candidates: Vec<Vec<Candidate>>,
    attempts:   usize,
    furthest:   usize,
}

impl Search<'_> {
    /// Routes from `from` (a candidate of LRP `i`) to the last LRP, and the
    /// candidate the last route ends on.
    fn extend(
        &mut self,
        reader: &mut dyn MapReader,
        i: usize,
        from: Candidate,
    ) -> DecodeResult<Option<(Vec<Vec<LineIdx>>, Candidate)>> {
        self.furthest = self.furthest.max(i);
        for k in 0..self.candidates[i + 1].len() {
            if self.attempts >= MAX_PAIR_ATTEMPTS {
                return Ok(None);
            }
            self.attempts += 1;

            let to = self.candidates[i + 1][k];
            let Some(lines) = route(reader, from, to, &self.points[i], self.config)? else {
                continue;
            };
            if i + 2 == self.points.len() {
                return Ok(Some((vec![lines], to)));
            }
            if let Some((mut rest, last)) = self.extend(reader, i + 1, to)? {
                rest.insert(0, lines);
                return Ok(Some((rest, last)));
            }
        }
        Ok(None)
    }
}

fn decode_line(
    reader: &mut dyn MapReader,
    reference: &LineReference,
    config: &DecoderConfig,
) -> DecodeResult<LineLocation> {
    let n = reference.points.len();
    if n < 2 {
        return Err(DecodeFailure::Unsupported("line reference with fewer than 2 points"));
    }
    let mut per_lrp = Vec::with_capacity(n);
    for (i, lrp) in reference.points.iter().enumerate() {
        let found = candidates(reader, lrp, i + 1 == n, config)?;
        if found.is_empty() {
            debug!(lrp = i, "no candidates");
            return Err(DecodeFailure::NoCandidates { lrp: i });
        }
        per_lrp.push(found);
    }

    let mut search = Search { points: &reference.points, config, candidates: per_lrp, attempts: 0, furthest: 0 };
    let mut matched = None;
    for k in 0..search.candidates[0].len() {
        let first = search.candidates[0][k];
        if let Some((routes, last)) = search.extend(reader, 0, first)? {
            matched = Some((first, routes, last));
            break;
        }
    }
    let Some((first, routes, last)) = matched else {
        debug!(furthest = search.furthest, attempts = search.attempts, "no path");
        return Err(DecodeFailure::NoPath { from_lrp: search.furthest });
    };

    // Each route starts on the line the previous one ended on.
    let mut handles: Vec<LineIdx> = Vec::new();
    for (k, lines) in routes.into_iter().enumerate() {
        handles.extend(lines.into_iter().skip(usize::from(k > 0)));
    }
    let last_length = reader.line(last.line).length_m;
    let lines: Vec<Line> = handles.iter().map(|&h| reader.line(h).clone()).collect();
    debug!(lines = lines.len(), "line reference decoded");

    Ok(LineLocation {
        lines,
        crs: reader.crs(),
        p_off: first.along_m + reference.positive_offset_m,
        n_off: (last_length - last.along_m).max(0.0) + reference.negative_offset_m,
    })
}

/// Decode the LRPs as a line, then walk `p_off` metres along it.
fn decode_point(
    reader: &mut dyn MapReader,
    reference: &PointAlongLineReference,
    config: &DecoderConfig,
) -> DecodeResult<PointAlongLineLocation> {
    let as_line = LineReference {
        points:            reference.points.clone(),
        positive_offset_m: reference.positive_offset_m,
        negative_offset_m: 0.0,
    };
    let path = decode_line(reader, &as_line, config)?;

    let mut remaining = path.p_off;
    let last = path.lines.len().saturating_sub(1);
    for (k, line) in path.lines.into_iter().enumerate() {
        if remaining <= line.length_m || k == last {
            let meters_into = remaining.min(line.length_m).max(0.0);
            return Ok(PointAlongLineLocation {
                line,
                meters_into,
                orientation:  reference.orientation,
                side_of_road: reference.side_of_road,
            });
        }
        remaining -= line.length_m;
    }
    Err(DecodeFailure::NoPath { from_lrp: 0 })
}
