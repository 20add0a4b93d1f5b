//! Diagnosis categories.

use std::fmt;

use serde::{Deserialize, Serialize};

use olr_decoder::Bundle;

/// The single most likely reason a code decodes differently on the target.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisResult {
    Ok,
    /// The target decode took a shorter path outside the buffer even though
    /// the source path exists on the target.
    AlternateShortestPath,
    MissingOrMisconfiguredRoad,
    FrcMismatch,
    FowMismatch,
    PathLengthMismatch,
    BearingMismatch,
    IncorrectFirstOrLastLrpPlacement,
    UnsupportedLocationType,
    OutsideMapBounds,
    UnknownError,
}

impl AnalysisResult {
    pub const ALL: [AnalysisResult; 11] = [
        AnalysisResult::Ok,
        AnalysisResult::AlternateShortestPath,
        AnalysisResult::MissingOrMisconfiguredRoad,
        AnalysisResult::FrcMismatch,
        AnalysisResult::FowMismatch,
        AnalysisResult::PathLengthMismatch,
        AnalysisResult::BearingMismatch,
        AnalysisResult::IncorrectFirstOrLastLrpPlacement,
        AnalysisResult::UnsupportedLocationType,
        AnalysisResult::OutsideMapBounds,
        AnalysisResult::UnknownError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnalysisResult::Ok => "OK",
            AnalysisResult::AlternateShortestPath => "ALTERNATE_SHORTEST_PATH",
            AnalysisResult::MissingOrMisconfiguredRoad => "MISSING_OR_MISCONFIGURED_ROAD",
            AnalysisResult::FrcMismatch => "FRC_MISMATCH",
            AnalysisResult::FowMismatch => "FOW_MISMATCH",
            AnalysisResult::PathLengthMismatch => "PATH_LENGTH_MISMATCH",
            AnalysisResult::BearingMismatch => "BEARING_MISMATCH",
            AnalysisResult::IncorrectFirstOrLastLrpPlacement => "INCORRECT_FIRST_OR_LAST_LRP_PLACEMENT",
            AnalysisResult::UnsupportedLocationType => "UNSUPPORTED_LOCATION_TYPE",
            AnalysisResult::OutsideMapBounds => "OUTSIDE_MAP_BOUNDS",
            AnalysisResult::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// The category a relaxation bundle stands for, if it names one.
    pub fn from_relaxation(bundle: Bundle) -> Option<AnalysisResult> {
        match bundle {
            Bundle::IgnoreFrc => Some(AnalysisResult::FrcMismatch),
            Bundle::IgnoreFow => Some(AnalysisResult::FowMismatch),
            Bundle::IgnorePathLength => Some(AnalysisResult::PathLengthMismatch),
            Bundle::IgnoreBearing => Some(AnalysisResult::BearingMismatch),
            Bundle::Strict | Bundle::Relaxed | Bundle::Buffer | Bundle::AnyPath => None,
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A category plus the share of the target decode that lies inside the
/// buffer around the source geometry, in `[0, 1]`.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Analysis {
    pub result:  AnalysisResult,
    pub overlap: f64,
}

impl Analysis {
    pub fn new(result: AnalysisResult, overlap: f64) -> Self {
        Self { result, overlap }
    }

    /// `result` with no overlap, for outcomes decided before any
    /// comparison.
    pub fn without_overlap(result: AnalysisResult) -> Self {
        Self { result, overlap: 0.0 }
    }
}
