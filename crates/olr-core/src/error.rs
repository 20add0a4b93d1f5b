//! Codec error type.

use thiserror::Error;

/// Errors produced while reading or writing OpenLR binary data.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported physical format version {0}")]
    UnsupportedVersion(u8),

    #[error("unsupported location type (status byte {status:#04x}, {len} bytes)")]
    UnsupportedLocationType { status: u8, len: usize },

    #[error("invalid {kind} reference length: {len} bytes")]
    InvalidLength { kind: &'static str, len: usize },

    #[error("a line reference needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("coordinate delta {delta} deg does not fit a relative coordinate")]
    RelativeOverflow { delta: f64 },
}

/// Alias for `Result<T, CodecError>`.
pub type CodecResult<T> = Result<T, CodecError>;
