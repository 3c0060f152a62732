//! Output collector and writers for the FocalCall table
//!
//! The `OutputCollector` provides a builder pattern for assembling the
//! terminal artifact of a run.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::config::Thresholds;
use crate::error::FocalError;
use crate::focal::FocalCall;

use super::types::{FocalOutput, RunSummary};

/// Builder for collecting run results into a `FocalOutput`
pub struct OutputCollector {
    output: FocalOutput,
}

impl OutputCollector {
    /// Create a new output collector stamped with the crate version
    pub fn new() -> Self {
        Self {
            output: FocalOutput {
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
        }
    }

    /// Set the thresholds the calls were made with
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.output.thresholds = thresholds;
        self
    }

    /// Set the surfaced calls
    pub fn with_calls(mut self, calls: Vec<FocalCall>) -> Self {
        self.output.calls = calls;
        self
    }

    /// Set the run summary
    pub fn with_summary(mut self, summary: RunSummary) -> Self {
        self.output.summary = Some(summary);
        self
    }

    /// Build and return the final output
    pub fn build(self) -> FocalOutput {
        self.output
    }
}

impl Default for OutputCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl FocalOutput {
    /// Write this output as pretty JSON, validating against the schema first
    /// when `schema::should_validate()` says so
    pub fn write_json_to<W: Write>(&self, writer: W) -> Result<(), FocalError> {
        if super::schema::should_validate() {
            let value = serde_json::to_value(self)?;
            if let Err(msg) = super::schema::validate(&value) {
                log::warn!("Schema validation failed: {}", msg);
                if cfg!(debug_assertions) {
                    return Err(FocalError::Schema(msg));
                }
            }
        }
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Write this output to a JSON file
    pub fn write_json(&self, path: &str) -> Result<(), FocalError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_json_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the call table as TSV with a header line
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> Result<(), FocalError> {
        writeln!(writer, "sample_id\tstatus\tregion\tregion_type")?;
        for c in &self.calls {
            writeln!(writer, "{}\t{}\t{}\t{}", c.sample_id, c.status, c.region_id, c.region_type)?;
        }
        Ok(())
    }

    /// Load output from a JSON file
    pub fn load_json(path: &str) -> Result<Self, FocalError> {
        let file = File::open(path)?;
        let output: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(output)
    }

    /// Check if any calls are present
    pub fn has_calls(&self) -> bool {
        !self.calls.is_empty()
    }
}
