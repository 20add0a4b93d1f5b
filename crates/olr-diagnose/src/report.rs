//! Batch analysis: CSV case files in, CSV reports out.
//!
//! # Case format
//!
//! ```csv
//! code,geometry
//! CwRbWyNG9RpsCQCb/jsbtAT/6/+jK1lE,"[[6.1,49.6],[6.1014,49.6]]"
//! ```
//!
//! `geometry` is the location on the source map as a JSON array of
//! `[lon, lat]` pairs.
//!
//! # Report files
//!
//! [`CsvReport`] writes `analysis.csv` (one row per case) and, on
//! [`finish`](CsvReport::finish), `summary.csv` (one row per category,
//! zero counts included).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::Writer;
use serde::Deserialize;
use tracing::info;

use olr_core::Coordinates;
use olr_decoder::Decoder;
use olr_map::RoadStore;

use crate::{Analysis, AnalysisResult, DiagnoseError, DiagnoseResult, DiagnosisEngine};

// ── Cases ─────────────────────────────────────────────────────────────────────

/// One code to diagnose and the geometry it covers on the source map.
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub code:     String,
    pub geometry: Vec<Coordinates>,
}

#[derive(Deserialize)]
struct CaseRecord {
    code:     String,
    geometry: String,
}

pub fn load_cases_csv(path: &Path) -> DiagnoseResult<Vec<Case>> {
    let file = File::open(path)?;
    load_cases_reader(file)
}

/// Like [`load_cases_csv`] but reads from any `Read` source.
pub fn load_cases_reader<R: Read>(reader: R) -> DiagnoseResult<Vec<Case>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut cases = Vec::new();
    for (row, record) in csv_reader.deserialize::<CaseRecord>().enumerate() {
        let record = record?;
        let pairs: Vec<[f64; 2]> = serde_json::from_str(&record.geometry)?;
        if pairs.is_empty() {
            return Err(DiagnoseError::InvalidCase { row, reason: "empty geometry".into() });
        }
        cases.push(Case {
            code:     record.code,
            geometry: pairs.into_iter().map(|[lon, lat]| Coordinates::new(lon, lat)).collect(),
        });
    }
    Ok(cases)
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Writes per-case rows and per-category counts.
pub struct CsvReport {
    cases:    Writer<File>,
    summary:  Writer<File>,
    counts:   [usize; AnalysisResult::ALL.len()],
    finished: bool,
}

impl CsvReport {
    /// Create both files in `dir` and write the case header.
    pub fn new(dir: &Path) -> DiagnoseResult<Self> {
        let mut cases = Writer::from_path(dir.join("analysis.csv"))?;
        cases.write_record(["index", "code", "result", "overlap"])?;
        let summary = Writer::from_path(dir.join("summary.csv"))?;
        Ok(Self {
            cases,
            summary,
            counts: [0; AnalysisResult::ALL.len()],
            finished: false,
        })
    }

    pub fn record(&mut self, index: usize, code: &str, analysis: &Analysis) -> DiagnoseResult<()> {
        self.cases.write_record(&[
            index.to_string(),
            code.to_string(),
            analysis.result.to_string(),
            format!("{:.6}", analysis.overlap),
        ])?;
        self.counts[analysis.result as usize] += 1;
        Ok(())
    }

    /// Count of analyses recorded so far with `result`.
    pub fn count(&self, result: AnalysisResult) -> usize {
        self.counts[result as usize]
    }

    /// Write the summary and flush both files.  Later calls do nothing.
    pub fn finish(&mut self) -> DiagnoseResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.summary.write_record(["result", "count"])?;
        for result in AnalysisResult::ALL {
            self.summary.write_record(&[result.to_string(), self.count(result).to_string()])?;
        }
        self.cases.flush()?;
        self.summary.flush()?;
        Ok(())
    }
}

impl<S: RoadStore, D: Decoder> DiagnosisEngine<S, D> {
    /// Analyze every case in order, recording each into `report`.
    ///
    /// The target cache is cleared between cases so memory stays bounded on
    /// long batches.
    pub fn run_batch(&mut self, cases: &[Case], report: &mut CsvReport) -> DiagnoseResult<Vec<Analysis>> {
        let mut out = Vec::with_capacity(cases.len());
        for (index, case) in cases.iter().enumerate() {
            self.target_mut().clear_cache();
            let analysis = self.analyze(&case.code, &case.geometry);
            report.record(index, &case.code, &analysis)?;
            out.push(analysis);
        }
        report.finish()?;
        info!(cases = cases.len(), ok = report.count(AnalysisResult::Ok), "batch finished");
        Ok(out)
    }
}
