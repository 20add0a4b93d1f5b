//! Decoding entry points on the map adapters.

use tracing::debug;

use olr_core::{decode_base64, LocationReference};
use olr_map::{reference_in, BufferMap, FullMap, RoadStore};

use crate::{DecodeResult, Decoder, DecoderConfig, MapObjects};

/// Decode codes and references against an unrestricted map.
pub trait FullMatch {
    /// Binary-decode `code`, then decode the reference on this map.
    fn decode_code(&mut self, decoder: &dyn Decoder, code: &str, config: &DecoderConfig) -> DecodeResult<MapObjects>;

    /// Decode a WGS84 `reference` on this map.  Results are in the map CRS.
    fn decode_reference(
        &mut self,
        decoder: &dyn Decoder,
        reference: &LocationReference,
        config: &DecoderConfig,
    ) -> DecodeResult<MapObjects>;
}

impl<S: RoadStore> FullMatch for FullMap<S> {
    fn decode_code(&mut self, decoder: &dyn Decoder, code: &str, config: &DecoderConfig) -> DecodeResult<MapObjects> {
        let reference = decode_base64(code)?;
        debug!(code, kind = reference.kind(), "decoding code");
        self.decode_reference(decoder, &reference, config)
    }

    fn decode_reference(
        &mut self,
        decoder: &dyn Decoder,
        reference: &LocationReference,
        config: &DecoderConfig,
    ) -> DecodeResult<MapObjects> {
        let reference = reference_in(self.store().crs(), reference);
        decoder.decode(&reference, self, config)
    }
}

/// Decode a buffer-restricted map's own reference, already in the map CRS.
pub trait BufferMatch {
    fn decode_with(&mut self, decoder: &dyn Decoder, config: &DecoderConfig) -> DecodeResult<MapObjects>;
}

impl<S: RoadStore> BufferMatch for BufferMap<'_, S> {
    fn decode_with(&mut self, decoder: &dyn Decoder, config: &DecoderConfig) -> DecodeResult<MapObjects> {
        let reference = LocationReference::Line(self.reference().clone());
        decoder.decode(&reference, self, config)
    }
}
