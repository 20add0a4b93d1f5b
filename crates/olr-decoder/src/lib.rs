//! `olr-decoder` — everything on the decoder side of the map boundary.
//!
//! The diagnosis engine never scores candidates itself.  It hands a
//! reference, a [`MapReader`](olr_map::MapReader) and a [`DecoderConfig`] to
//! a [`Decoder`] and pattern-matches on the [`MapObjects`] (or
//! [`DecodeFailure`]) that comes back.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`config`]   | `DecoderConfig`, FOW stand-in and LFRC tolerance tables  |
//! | [`ladder`]   | `Bundle`, `ConfigTable` (named bundles + relaxation order) |
//! | [`decoder`]  | `Decoder` trait, `MapObjects`, `LineLocation`, `DecodeFailure` |
//! | [`matching`] | `FullMatch`, `BufferMatch` extension traits on the adapters |
//! | [`shortest`] | `ShortestPathDecoder`, the default `Decoder`            |

pub mod config;
pub mod decoder;
pub mod ladder;
pub mod matching;
pub mod shortest;


pub use config::DecoderConfig;
pub use decoder::{
    DecodeFailure, DecodeResult, Decoder, LineLocation, MapObjects, PoiLocation,
    PointAlongLineLocation,
};
pub use ladder::{Bundle, ConfigTable};
pub use matching::{BufferMatch, FullMatch};
pub use shortest::ShortestPathDecoder;
