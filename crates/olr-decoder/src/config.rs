//! Decoding tolerances and scoring weights.
//!
//! A [`DecoderConfig`] is opaque to the diagnosis engine; only a
//! [`Decoder`](crate::Decoder) reads its fields.  The named presets below
//! are the ones the relaxation ladder is built from.

use olr_core::{Fow, Frc};

/// `FOW_STANDIN[lrp fow][candidate fow]`: how well a candidate's form of way
/// stands in for the one the LRP asks for.
pub const STRICT_FOW_STANDIN: [[f64; 8]; 8] = [
    [0.50, 0.50, 0.50, 0.50, 0.50, 0.50, 0.50, 0.10], // Undefined
    [0.50, 1.00, 0.75, 0.25, 0.00, 0.00, 0.00, 0.10], // Motorway
    [0.50, 0.75, 1.00, 0.75, 0.50, 0.00, 0.00, 0.10], // MultipleCarriageway
    [0.50, 0.00, 0.75, 1.00, 0.50, 0.50, 0.00, 0.10], // SingleCarriageway
    [0.50, 0.00, 0.00, 0.50, 1.00, 0.50, 0.00, 0.10], // Roundabout
    [0.50, 0.00, 0.00, 0.50, 0.50, 1.00, 0.00, 0.10], // TrafficSquare
    [0.50, 0.50, 0.40, 0.30, 0.00, 0.00, 1.00, 0.10], // SlipRoad
    [0.50, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 1.00], // Other
];

/// Every form of way is a perfect stand-in for every other.
pub const RELAXED_FOW_STANDIN: [[f64; 8]; 8] = [[1.0; 8]; 8];

/// Lowest FRC accepted on a path, indexed by the LRP's `lfrcnp`: one class
/// below what the reference states.
pub const STRICT_TOLERATED_LFRC: [Frc; 8] = [
    Frc::Frc1, Frc::Frc2, Frc::Frc3, Frc::Frc4,
    Frc::Frc5, Frc::Frc6, Frc::Frc7, Frc::Frc7,
];

/// Any class is accepted anywhere.
pub const RELAXED_TOLERATED_LFRC: [Frc; 8] = [Frc::Frc7; 8];

/// Tolerances and weights for one decode.
///
/// Constructed once and read-only afterwards.  Use a named constructor and
/// struct-update syntax to derive variants:
///
/// ```
/// use olr_decoder::DecoderConfig;
///
/// let wide = DecoderConfig { search_radius_m: 50.0, ..DecoderConfig::strict() };
/// assert_eq!(wide.geo_weight, DecoderConfig::strict().geo_weight);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderConfig {
    /// Candidate lines must lie within this many metres of the LRP.
    pub search_radius_m:        f64,
    /// Largest accepted difference between LRP and candidate bearing.
    pub max_bear_deviation_deg: f64,
    /// Candidates scoring below this are dropped.
    pub min_score:              f64,
    /// Candidates kept per LRP, best first.  `0` keeps all of them.
    pub candidate_threshold:    usize,
    /// Accepted path length deviation as a fraction of the DNP.
    pub max_dnp_deviation:      f64,
    /// Accepted path length deviation in metres, added to the fraction.
    pub tolerated_dnp_dev_m:    f64,
    pub tolerated_lfrc:         [Frc; 8],
    pub geo_weight:             f64,
    pub frc_weight:             f64,
    pub fow_weight:             f64,
    pub bear_weight:            f64,
    pub fow_standin_score:      [[f64; 8]; 8],
    /// Distance along a candidate over which its bearing is measured.
    pub bear_dist_m:            f64,
}

impl DecoderConfig {
    /// Tight tolerances, every dimension weighted equally.
    pub fn strict() -> Self {
        Self {
            search_radius_m:        20.0,
            max_bear_deviation_deg: 30.0,
            min_score:              0.3,
            candidate_threshold:    20,
            max_dnp_deviation:      0.1,
            tolerated_dnp_dev_m:    30.0,
            tolerated_lfrc:         STRICT_TOLERATED_LFRC,
            geo_weight:             0.25,
            frc_weight:             0.25,
            fow_weight:             0.25,
            bear_weight:            0.25,
            fow_standin_score:      STRICT_FOW_STANDIN,
            bear_dist_m:            20.0,
        }
    }

    /// Wider search, any FRC, bearing not scored.
    pub fn relaxed() -> Self {
        Self {
            search_radius_m:        50.0,
            max_bear_deviation_deg: 45.0,
            tolerated_lfrc:         RELAXED_TOLERATED_LFRC,
            geo_weight:             0.66,
            frc_weight:             0.17,
            fow_weight:             0.17,
            bear_weight:            0.0,
            ..Self::strict()
        }
    }

    /// Strict scoring with every candidate kept and a looser path length,
    /// for decoding inside a buffer polygon.
    pub fn buffer() -> Self {
        Self { candidate_threshold: 0, max_dnp_deviation: 0.2, ..Self::strict() }
    }

    /// Any connected path of a plausible length.  Only distance is scored.
    pub fn any_path() -> Self {
        Self {
            min_score:              0.0,
            candidate_threshold:    0,
            max_dnp_deviation:      0.2,
            tolerated_lfrc:         RELAXED_TOLERATED_LFRC,
            max_bear_deviation_deg: 180.0,
            geo_weight:             1.0,
            frc_weight:             0.0,
            fow_weight:             0.0,
            bear_weight:            0.0,
            ..Self::strict()
        }
    }

    /// Shared base of the `ignoring_*` variants.
    fn ladder_step() -> Self {
        Self {
            candidate_threshold: 0,
            max_dnp_deviation:   0.2,
            geo_weight:          0.33,
            frc_weight:          0.33,
            fow_weight:          0.33,
            bear_weight:         0.33,
            ..Self::strict()
        }
    }

    pub fn ignoring_frc() -> Self {
        Self { frc_weight: 0.0, tolerated_lfrc: RELAXED_TOLERATED_LFRC, ..Self::ladder_step() }
    }

    pub fn ignoring_fow() -> Self {
        Self { fow_weight: 0.0, fow_standin_score: RELAXED_FOW_STANDIN, ..Self::ladder_step() }
    }

    pub fn ignoring_bearing() -> Self {
        Self { bear_weight: 0.0, max_bear_deviation_deg: 180.0, ..Self::ladder_step() }
    }

    /// Path length is effectively unchecked; the other weights stay at
    /// their strict values.
    pub fn ignoring_path_length() -> Self {
        Self {
            candidate_threshold: 0,
            max_dnp_deviation:   1.0,
            tolerated_dnp_dev_m: 1000.0,
            ..Self::strict()
        }
    }

    /// Lowest FRC a path may use after an LRP with lowest-FRC `lfrcnp`.
    #[inline]
    pub fn tolerated_frc(&self, lfrcnp: Frc) -> Frc {
        self.tolerated_lfrc[lfrcnp.code() as usize]
    }

    #[inline]
    pub fn fow_score(&self, lrp: Fow, candidate: Fow) -> f64 {
        self.fow_standin_score[lrp.code() as usize][candidate.code() as usize]
    }

    /// Largest accepted `|path length − dnp|` for a segment of `dnp_m`.
    #[inline]
    pub fn dnp_tolerance_m(&self, dnp_m: f64) -> f64 {
        self.max_dnp_deviation * dnp_m + self.tolerated_dnp_dev_m
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::strict()
    }
}
