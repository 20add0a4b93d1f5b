//! Named configuration bundles and the relaxation order.

use std::fmt;

use crate::DecoderConfig;

/// A named [`DecoderConfig`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bundle {
    Strict,
    Relaxed,
    Buffer,
    AnyPath,
    IgnoreFrc,
    IgnoreFow,
    IgnoreBearing,
    IgnorePathLength,
}

impl Bundle {
    pub const ALL: [Bundle; 8] = [
        Bundle::Strict, Bundle::Relaxed, Bundle::Buffer, Bundle::AnyPath,
        Bundle::IgnoreFrc, Bundle::IgnoreFow, Bundle::IgnoreBearing, Bundle::IgnorePathLength,
    ];

    /// Relaxations tried after `AnyPath`, in order.  The first one that
    /// decodes names the cause.
    pub const DEFAULT_RELAXATIONS: [Bundle; 4] = [
        Bundle::IgnoreFrc, Bundle::IgnoreFow, Bundle::IgnorePathLength, Bundle::IgnoreBearing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Bundle::Strict => "strict",
            Bundle::Relaxed => "relaxed",
            Bundle::Buffer => "buffer",
            Bundle::AnyPath => "any-path",
            Bundle::IgnoreFrc => "ignore-frc",
            Bundle::IgnoreFow => "ignore-fow",
            Bundle::IgnoreBearing => "ignore-bearing",
            Bundle::IgnorePathLength => "ignore-path-length",
        }
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One [`DecoderConfig`] per [`Bundle`] plus the ordered relaxation list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigTable {
    configs:         [DecoderConfig; 8],
    pub relaxations: Vec<Bundle>,
}

impl ConfigTable {
    #[inline]
    pub fn get(&self, bundle: Bundle) -> &DecoderConfig {
        &self.configs[bundle as usize]
    }

    /// Replace the configuration of `bundle`.
    pub fn with(mut self, bundle: Bundle, config: DecoderConfig) -> Self {
        self.configs[bundle as usize] = config;
        self
    }

    pub fn with_relaxations(mut self, relaxations: Vec<Bundle>) -> Self {
        self.relaxations = relaxations;
        self
    }
}

impl Default for ConfigTable {
    fn default() -> Self {
        // Order matches `Bundle`'s discriminants.
        Self {
            configs: [
                DecoderConfig::strict(),
                DecoderConfig::relaxed(),
                DecoderConfig::buffer(),
                DecoderConfig::any_path(),
                DecoderConfig::ignoring_frc(),
                DecoderConfig::ignoring_fow(),
                DecoderConfig::ignoring_bearing(),
                DecoderConfig::ignoring_path_length(),
            ],
            relaxations: Bundle::DEFAULT_RELAXATIONS.to_vec(),
        }
    }
}
