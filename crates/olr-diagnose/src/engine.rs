//! The diagnosis procedure.
//!
//! ```text
//! source outside target extent ──────────────────────────► OUTSIDE_MAP_BOUNDS
//! decode on target (initial bundle)
//!   ├─ no match ─► buffer map (original reference) ─► restricted ladder
//!   ├─ not a line ─────────────────────────────────────► UNSUPPORTED_LOCATION_TYPE
//!   └─ line: trimmed path inside buffer ───────────────► OK (1.0)
//!            else overlap, adjusted reference, buffer map, re-decode
//!              ├─ longer than the target decode ───────► ALTERNATE_SHORTEST_PATH
//!              ├─ not longer ─► unrestricted ladder
//!              └─ no match ───► restricted ladder
//! ```
//!
//! Both ladders try `AnyPath` first (no match means a missing road), then
//! the configured relaxations in order; the first relaxation that matches
//! names the cause.  The unrestricted ladder also requires the relaxed
//! decode to fall inside the buffer.  When several relaxations would match,
//! only the first is reported.
//!
//! Codes and source geometries are WGS84.  On a projected target the source
//! is moved into the target CRS before the extent check and the buffer is
//! built there; references are moved by the map adapters.

use tracing::{debug, info, warn};

use olr_core::{decode_base64, Coordinates, LocationReference};
use olr_decoder::{BufferMatch, Bundle, ConfigTable, DecodeFailure, DecodeResult, Decoder, FullMatch, MapObjects};
use olr_geo::{Buffer, GeoError};
use olr_map::{BufferMap, FullMap, RoadStore};

use crate::adjust::adjust_reference;
use crate::{Analysis, AnalysisConfig, AnalysisResult, DiagnoseError, DiagnoseResult};

/// Decodes per ladder: `AnyPath` plus at most this many minus one
/// relaxations.
pub const MAX_LADDER_ATTEMPTS: usize = 5;

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`DiagnosisEngine`].
///
/// | Method                 | Default                    |
/// |------------------------|----------------------------|
/// | `.config(c)`           | `AnalysisConfig::default()` |
/// | `.buffer_radius(m)`    | 20 m                       |
/// | `.table(t)`            | `ConfigTable::default()`   |
pub struct DiagnosisEngineBuilder<S: RoadStore, D: Decoder> {
    store:   S,
    decoder: D,
    config:  AnalysisConfig,
}

impl<S: RoadStore, D: Decoder> DiagnosisEngineBuilder<S, D> {
    pub fn new(store: S, decoder: D) -> Self {
        Self { store, decoder, config: AnalysisConfig::default() }
    }

    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn buffer_radius(mut self, radius_m: f64) -> Self {
        self.config.buffer_radius_m = radius_m;
        self
    }

    pub fn table(mut self, table: ConfigTable) -> Self {
        self.config.table = table;
        self
    }

    /// Validate the configuration and wrap the store in an unrestricted map.
    pub fn build(self) -> DiagnoseResult<DiagnosisEngine<S, D>> {
        let radius = self.config.buffer_radius_m;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(DiagnoseError::InvalidConfig(format!("buffer radius must be positive, got {radius}")));
        }
        Ok(DiagnosisEngine {
            target:  FullMap::new(self.store),
            decoder: self.decoder,
            config:  self.config,
        })
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Diagnoses codes against one target map.
///
/// Owns the target adapter and its caches; run one engine per worker for
/// batch parallelism.
pub struct DiagnosisEngine<S: RoadStore, D: Decoder> {
    target:  FullMap<S>,
    decoder: D,
    config:  AnalysisConfig,
}

impl<S: RoadStore, D: Decoder> DiagnosisEngine<S, D> {
    pub fn builder(store: S, decoder: D) -> DiagnosisEngineBuilder<S, D> {
        DiagnosisEngineBuilder::new(store, decoder)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn target(&self) -> &FullMap<S> {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut FullMap<S> {
        &mut self.target
    }

    /// Diagnose `code` against the target, given the geometry it covers on
    /// the source map.  Errors are reported as `UNKNOWN_ERROR`.
    pub fn analyze(&mut self, code: &str, source: &[Coordinates]) -> Analysis {
        let analysis = self.try_analyze(code, source).unwrap_or_else(|e| {
            warn!(code, error = %e, "analysis failed");
            Analysis::without_overlap(AnalysisResult::UnknownError)
        });
        info!(code, result = %analysis.result, overlap = analysis.overlap, "analyzed");
        analysis
    }

    /// Like [`analyze`](Self::analyze) for an already decoded reference.
    pub fn analyze_reference(&mut self, reference: &LocationReference, source: &[Coordinates]) -> Analysis {
        self.try_analyze_reference(reference, source).unwrap_or_else(|e| {
            warn!(kind = reference.kind(), error = %e, "analysis failed");
            Analysis::without_overlap(AnalysisResult::UnknownError)
        })
    }

    /// Like [`analyze`](Self::analyze), but errors are returned.
    pub fn try_analyze(&mut self, code: &str, source: &[Coordinates]) -> DiagnoseResult<Analysis> {
        if !self.covers(source)? {
            return Ok(Analysis::without_overlap(AnalysisResult::OutsideMapBounds));
        }
        let reference = decode_base64(code)?;
        self.diagnose(&reference, source)
    }

    pub fn try_analyze_reference(&mut self, reference: &LocationReference, source: &[Coordinates]) -> DiagnoseResult<Analysis> {
        if !self.covers(source)? {
            return Ok(Analysis::without_overlap(AnalysisResult::OutsideMapBounds));
        }
        self.diagnose(reference, source)
    }

    /// `true` when every vertex of `source` lies within the target extent.
    fn covers(&self, source: &[Coordinates]) -> DiagnoseResult<bool> {
        if source.is_empty() {
            return Err(GeoError::EmptyGeometry.into());
        }
        let Some(extent) = self.target.extent()? else {
            return Ok(false);
        };
        let crs = self.target.store().crs();
        let (min, max) = (extent.min(), extent.max());
        Ok(source
            .iter()
            .map(|&c| crs.project(c))
            .all(|c| c.lon >= min.x && c.lon <= max.x && c.lat >= min.y && c.lat <= max.y))
    }

    fn diagnose(&mut self, reference: &LocationReference, source: &[Coordinates]) -> DiagnoseResult<Analysis> {
        let Self { target, decoder, config } = self;
        let decoder: &dyn Decoder = &*decoder;
        let table = &config.table;

        let first = attempt(target.decode_reference(decoder, reference, table.get(config.initial_bundle)))?;
        let crs = target.store().crs();
        let projected: Vec<Coordinates> = source.iter().map(|&c| crs.project(c)).collect();
        let buffer = Buffer::around_in(crs, &projected, config.buffer_radius_m)?;

        let location = match first {
            Attempt::Found(MapObjects::Line(location)) => location,
            Attempt::Found(other) => {
                debug!(kind = other.kind(), "decoded to a non-line location");
                return Ok(Analysis::without_overlap(AnalysisResult::UnsupportedLocationType));
            }
            Attempt::Unsupported => {
                return Ok(Analysis::without_overlap(AnalysisResult::UnsupportedLocationType));
            }
            Attempt::NoMatch => {
                let Some(line) = reference.as_line() else {
                    return Ok(Analysis::without_overlap(AnalysisResult::UnsupportedLocationType));
                };
                debug!("no match on the target, trying inside the buffer");
                let mut map = BufferMap::new(&mut *target, &buffer, line.clone())?;
                let result = restricted_ladder(&mut map, decoder, table)?;
                return Ok(Analysis::without_overlap(result));
            }
        };

        let trimmed = location.trimmed_geometry()?;
        if buffer.contains_line(&trimmed) {
            return Ok(Analysis::new(AnalysisResult::Ok, 1.0));
        }
        let decoded_length = crs.line_string_length(&trimmed);
        let overlap = overlap_ratio(&buffer, &trimmed, decoded_length);
        debug!(decoded_length, overlap, "target decode leaves the buffer");

        let Some(line) = reference.as_line() else {
            return Ok(Analysis::new(AnalysisResult::UnsupportedLocationType, overlap));
        };
        let in_buffer_config = table.get(config.in_buffer_bundle);
        let adjusted = adjust_reference(line, source, in_buffer_config.bear_dist_m)?;

        let decided = {
            let mut map = BufferMap::new(&mut *target, &buffer, adjusted.clone())?;
            match attempt(map.decode_with(decoder, in_buffer_config))? {
                Attempt::Found(MapObjects::Line(inside)) => {
                    let inside_length = crs.line_string_length(&inside.trimmed_geometry()?);
                    debug!(inside_length, decoded_length, "in-buffer decode");
                    (inside_length > decoded_length).then_some(AnalysisResult::AlternateShortestPath)
                }
                Attempt::Found(_) | Attempt::Unsupported => Some(AnalysisResult::UnsupportedLocationType),
                Attempt::NoMatch => Some(restricted_ladder(&mut map, decoder, table)?),
            }
        };
        let result = match decided {
            Some(result) => result,
            None => {
                let adjusted = LocationReference::Line(adjusted);
                unrestricted_ladder(target, decoder, table, &adjusted, &buffer)?
            }
        };
        Ok(Analysis::new(result, overlap))
    }
}

// ── Ladders ───────────────────────────────────────────────────────────────────

enum Attempt {
    Found(MapObjects),
    NoMatch,
    Unsupported,
}

/// Sort a decode outcome into what the ladder branches on.  Codec and map
/// errors abort the analysis.
fn attempt(result: DecodeResult<MapObjects>) -> DiagnoseResult<Attempt> {
    match result {
        Ok(objects) => Ok(Attempt::Found(objects)),
        Err(DecodeFailure::Unsupported(kind)) => {
            debug!(kind, "decoder does not support the reference");
            Ok(Attempt::Unsupported)
        }
        Err(e) if e.is_no_match() => Ok(Attempt::NoMatch),
        Err(e) => Err(e.into()),
    }
}

/// Relaxation bundles that name a cause, in ladder order, within the
/// attempt budget.
fn relaxations(table: &ConfigTable) -> impl Iterator<Item = (Bundle, AnalysisResult)> + '_ {
    table
        .relaxations
        .iter()
        .filter_map(|&bundle| AnalysisResult::from_relaxation(bundle).map(|cause| (bundle, cause)))
        .take(MAX_LADDER_ATTEMPTS - 1)
}

fn overlap_ratio(buffer: &Buffer, trimmed: &[Coordinates], length: f64) -> f64 {
    if length <= 0.0 {
        return 0.0;
    }
    (buffer.intersection_length(trimmed) / length).clamp(0.0, 1.0)
}

/// Ladder over a buffer-restricted map: the first relaxation that matches
/// at all is the cause.
fn restricted_ladder<S: RoadStore>(
    map: &mut BufferMap<'_, S>,
    decoder: &dyn Decoder,
    table: &ConfigTable,
) -> DiagnoseResult<AnalysisResult> {
    let any = attempt(map.decode_with(decoder, table.get(Bundle::AnyPath)))?;
    debug!(bundle = %Bundle::AnyPath, found = matches!(any, Attempt::Found(_)), "restricted ladder");
    if !matches!(any, Attempt::Found(_)) {
        return Ok(AnalysisResult::MissingOrMisconfiguredRoad);
    }
    for (bundle, cause) in relaxations(table) {
        let found = matches!(attempt(map.decode_with(decoder, table.get(bundle)))?, Attempt::Found(_));
        debug!(%bundle, found, "restricted ladder");
        if found {
            return Ok(cause);
        }
    }
    Ok(AnalysisResult::IncorrectFirstOrLastLrpPlacement)
}

/// Ladder over the whole target: the first relaxation whose trimmed path
/// lies inside `buffer` is the cause.
fn unrestricted_ladder<S: RoadStore>(
    target: &mut FullMap<S>,
    decoder: &dyn Decoder,
    table: &ConfigTable,
    reference: &LocationReference,
    buffer: &Buffer,
) -> DiagnoseResult<AnalysisResult> {
    let any = attempt(target.decode_reference(decoder, reference, table.get(Bundle::AnyPath)))?;
    debug!(bundle = %Bundle::AnyPath, found = matches!(any, Attempt::Found(_)), "unrestricted ladder");
    if !matches!(any, Attempt::Found(_)) {
        return Ok(AnalysisResult::MissingOrMisconfiguredRoad);
    }
    for (bundle, cause) in relaxations(table) {
        let contained = match attempt(target.decode_reference(decoder, reference, table.get(bundle)))? {
            Attempt::Found(MapObjects::Line(location)) => buffer.contains_line(&location.trimmed_geometry()?),
            _ => false,
        };
        debug!(%bundle, contained, "unrestricted ladder");
        if contained {
            return Ok(cause);
        }
    }
    Ok(AnalysisResult::IncorrectFirstOrLastLrpPlacement)
}
