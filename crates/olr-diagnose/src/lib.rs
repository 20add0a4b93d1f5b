//! `olr-diagnose` — explains why an OpenLR code decodes differently on a
//! target map than on the map it was encoded from.
//!
//! Given a code and the geometry it covers on the source map, the
//! [`DiagnosisEngine`] decodes the code on the target map, compares the
//! result with a buffer around the source geometry, and on a mismatch
//! re-decodes under progressively relaxed configurations until one
//! dimension explains the difference.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`result`] | `AnalysisResult` categories, `Analysis`                    |
//! | [`config`] | `AnalysisConfig`                                           |
//! | [`adjust`] | Reference adjustment onto source geometry endpoints        |
//! | [`engine`] | `DiagnosisEngine`, `DiagnosisEngineBuilder`                |
//! | [`report`] | CSV case loading and batch reports                         |
//! | [`error`]  | `DiagnoseError`, `DiagnoseResult`                          |
//!
//! # Example
//!
//! ```
//! use olr_core::{encode_line_base64, Coordinates, Fow, Frc};
//! use olr_decoder::ShortestPathDecoder;
//! use olr_diagnose::{line_reference_for, AnalysisResult, DiagnosisEngine};
//! use olr_map::{Direction, MemoryStoreBuilder, RoadRow};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let a = Coordinates::new(6.10, 49.60);
//! let b = Coordinates::new(6.11, 49.60);
//! let source = vec![a, b];
//! let store = MemoryStoreBuilder::new()
//!     .intersection("A", a)
//!     .intersection("B", b)
//!     .road(RoadRow {
//!         id: "1".into(), fow: Fow::SingleCarriageway, frc: Frc::Frc3,
//!         direction: Direction::Both, start_id: "A".into(), end_id: "B".into(),
//!         length_m: olr_geo::line_string_length(&source), geometry: source.clone(),
//!     })
//!     .build()?;
//!
//! let code = encode_line_base64(&line_reference_for(&source, Frc::Frc3, Fow::SingleCarriageway, 20.0)?)?;
//! let mut engine = DiagnosisEngine::builder(store, ShortestPathDecoder)
//!     .buffer_radius(20.0)
//!     .build()?;
//! let analysis = engine.analyze(&code, &source);
//! assert_eq!(analysis.result, AnalysisResult::Ok);
//! assert_eq!(analysis.overlap, 1.0);
//! # Ok(())
//! # }
//! ```

pub mod adjust;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod result;


pub use adjust::{adjust_reference, end_bearing_deg, line_reference_for, start_bearing_deg};
pub use config::AnalysisConfig;
pub use engine::{DiagnosisEngine, DiagnosisEngineBuilder, MAX_LADDER_ATTEMPTS};
pub use error::{DiagnoseError, DiagnoseResult};
pub use report::{load_cases_csv, load_cases_reader, Case, CsvReport};
pub use result::{Analysis, AnalysisResult};
