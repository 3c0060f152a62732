//! Output module for focal resolution results
//!
//! This module provides:
//! - `FocalOutput`: the FocalCall table with thresholds and run summary
//! - `OutputCollector`: a builder for assembling it
//! - JSON schema generation/validation and JSON/TSV writers
//!
//! # Example
//!
//! ```ignore
//! use focalcn::output::OutputCollector;
//!
//! let output = OutputCollector::new()
//!     .with_thresholds(config.thresholds)
//!     .with_calls(calls)
//!     .with_summary(summary)
//!     .build();
//!
//! output.write_json("cohort.focal.json")?;
//! output.write_tsv(std::io::stdout())?;
//! ```

pub mod collector;
pub mod schema;
pub mod types;

// Re-export main types for convenience
pub use collector::OutputCollector;
pub use types::{FocalOutput, RunSummary};
