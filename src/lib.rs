//! Focal copy-number resolution.
//!
//! Collapses per-cytoband loss/gain/callable fractions and per-gene calls into
//! a single table of the most specific region at which each sample's
//! copy-number state differs from its enclosing context (arm > cytoband > gene).
//!
//! ```ignore
//! use focalcn::config::CallerConfig;
//! use focalcn::pipeline::PipelineRunner;
//!
//! let config = CallerConfig::load("caller.json")?;
//! let result = PipelineRunner::new(regions, genes).with_config(&config).run()?;
//! result.output.write_tsv(std::io::stdout())?;
//! ```

pub mod config;
pub mod error;
pub mod focal;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod utils;

pub use error::{FocalError, Result};
