//! `olr-map` — the road network as an OpenLR decoder sees it.
//!
//! Stored roads may be two-way; decoders only understand one-way lines.  The
//! adapters here split every stored row into one or two directed [`Line`]s
//! (the reverse one carries the id `"-" + id`) and expose them, with their
//! [`Node`]s, through the object-safe [`MapReader`] trait.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`store`]  | `RoadStore` trait, `RoadRow`, `IntersectionRow`, `Direction` |
//! | [`memory`] | `MemoryStore` (R-tree), `MemoryStoreBuilder`                 |
//! | [`sqlite`] | `SqliteStore`, `StoreConfig`                                 |
//! | [`arena`]  | `Line`, `Node`, `Arena`, virtualization, peer relation       |
//! | [`reader`] | `MapReader` trait                                            |
//! | [`full`]   | `FullMap`: unrestricted adapter over a store                 |
//! | [`buffer`] | `BufferMap`: adapter restricted to a buffer polygon          |
//! | [`error`]  | `MapError`, `MapResult<T>`                                   |
//!
//! # Caching
//!
//! Adapters never share caches.  Every query that touches the store takes
//! `&mut self`, so a single adapter serves one decode at a time.

pub mod arena;
pub mod buffer;
pub mod error;
pub mod full;
pub mod memory;
pub mod reader;
pub mod sqlite;
pub mod store;

#[cfg(test)]
mod tests;

pub use arena::{are_peers, virtualize, Arena, Line, Node};
pub use buffer::BufferMap;
pub use error::{MapError, MapResult};
pub use full::FullMap;
pub use memory::{MemoryStore, MemoryStoreBuilder};
pub use reader::{reference_in, MapReader};
pub use sqlite::{SqliteStore, StoreConfig};
pub use store::{Direction, IntersectionRow, RoadRow, RoadStore};
