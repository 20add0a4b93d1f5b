//! Diagnosis settings.

use olr_decoder::{Bundle, ConfigTable};

/// Immutable settings for a [`DiagnosisEngine`](crate::DiagnosisEngine).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisConfig {
    /// Radius of the buffer around the source geometry, in metres.
    pub buffer_radius_m:  f64,
    /// Bundle of the first decode against the whole target map.
    pub initial_bundle:   Bundle,
    /// Bundle of the re-decode restricted to the buffer.
    pub in_buffer_bundle: Bundle,
    pub table:            ConfigTable,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            buffer_radius_m:  20.0,
            initial_bundle:   Bundle::Strict,
            in_buffer_bundle: Bundle::Strict,
            table:            ConfigTable::default(),
        }
    }
}
