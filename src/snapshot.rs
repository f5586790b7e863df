//! Snapshot persistence: one JSON bundle of every run artifact.
//!
//! The snapshot is written once at the end of a run and exists for
//! reproducibility and inspection; the only guarantee is a successful
//! round-trip through [`load`].

use crate::error::Result;
use crate::pipeline::PipelineReport;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serialize a report to pretty-printed JSON at `path`, overwriting any
/// previous snapshot there.
pub fn save(report: &PipelineReport, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Load a snapshot written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<PipelineReport> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let report = serde_json::from_reader(reader)?;
    Ok(report)
}
