//! `olr-core` — foundational types for the `olr_xmap` workspace.
//!
//! This crate is a dependency of every other `olr-*` crate.  It has no
//! `olr-*` dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `LineIdx`, `NodeIdx` arena handles                         |
//! | [`coords`]      | `Coordinates` (WGS84 lon/lat)                              |
//! | [`attrs`]       | `Frc`, `Fow` road attributes                               |
//! | [`reference`]   | `LocationReference`, `LineReference`, `Lrp`, …             |
//! | [`codec`]       | OpenLR physical format v3 (base64 ⇄ reference)             |
//! | [`error`]       | `CodecError`, `CodecResult`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod attrs;
pub mod codec;
pub mod coords;
pub mod error;
pub mod ids;
pub mod reference;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use attrs::{Fow, Frc};
pub use codec::{decode_base64, decode_binary, encode_line_base64, encode_line_binary};
pub use coords::Coordinates;
pub use error::{CodecError, CodecResult};
pub use ids::{LineIdx, NodeIdx};
pub use reference::{
    LineReference, LocationReference, Lrp, PoiReference, PointAlongLineReference,
};
