//! Configuration for focal copy-number resolution.
//!
//! This module provides:
//! - `Thresholds`: the two classifier thresholds
//! - `CallerConfig`: thresholds plus run options, loadable from JSON

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

use crate::error::FocalError;

// ============================================================================
// Classifier Thresholds
// ============================================================================

/// Thresholds applied by the region classifier at arm and cytoband level.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// A region is loss/gain/unstable when the relevant fraction is strictly above this
    #[serde(default = "default_status_threshold")]
    pub status_threshold: f64,
    /// A region is uncallable when its callable fraction is below `1 - uncallable_threshold`
    #[serde(default = "default_uncallable_threshold")]
    pub uncallable_threshold: f64,
}

fn default_status_threshold() -> f64 { 0.9 }
fn default_uncallable_threshold() -> f64 { 0.5 }

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            status_threshold: default_status_threshold(),
            uncallable_threshold: default_uncallable_threshold(),
        }
    }
}

impl Thresholds {
    pub fn new(status_threshold: f64, uncallable_threshold: f64) -> Result<Self, FocalError> {
        let t = Self { status_threshold, uncallable_threshold };
        t.validate()?;
        Ok(t)
    }

    /// Minimum callable fraction for a region to receive any non-uncallable call
    pub fn min_callable(&self) -> f64 {
        1.0 - self.uncallable_threshold
    }

    /// Reject thresholds that would break the classifier's first-match-wins ordering.
    ///
    /// With `status_threshold <= 0.5` loss and gain could both clear the threshold.
    pub fn validate(&self) -> Result<(), FocalError> {
        check_unit("status_threshold", self.status_threshold)?;
        check_unit("uncallable_threshold", self.uncallable_threshold)?;
        if self.status_threshold <= 0.5 {
            return Err(FocalError::ThresholdMisconfiguration {
                name: "status_threshold",
                value: self.status_threshold,
                reason: "must be greater than 0.5 so loss and gain cannot both exceed it",
            });
        }
        Ok(())
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), FocalError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(FocalError::ThresholdMisconfiguration {
            name,
            value,
            reason: "must be within [0, 1]",
        });
    }
    Ok(())
}

// ============================================================================
// Run Configuration
// ============================================================================

/// How rows that fail input validation are handled.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Any malformed row rejects the whole input
    #[default]
    Strict,
    /// Malformed rows are dropped and reported in the run summary
    Skip,
}

/// Main caller configuration
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct CallerConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Delimiter joining bands in multi-band gene labels (e.g. "12p-12q")
    #[serde(default = "default_band_delimiter")]
    pub band_delimiter: String,
    #[serde(default)]
    pub input_policy: InputPolicy,
    /// Process samples on the rayon thread pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_band_delimiter() -> String { "-".to_string() }
fn default_parallel() -> bool { true }

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            band_delimiter: default_band_delimiter(),
            input_policy: InputPolicy::default(),
            parallel: default_parallel(),
        }
    }
}

impl CallerConfig {
    /// Load caller configuration from a JSON file and validate it
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open caller config {}", path))?;
        let reader = BufReader::new(file);
        let config: CallerConfig = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse caller config {}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid caller config {}", path))?;
        Ok(config)
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_input_policy(mut self, policy: InputPolicy) -> Self {
        self.input_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), FocalError> {
        self.thresholds.validate()?;
        if self.band_delimiter.is_empty() {
            return Err(FocalError::Config("band_delimiter must not be empty".to_string()));
        }
        Ok(())
    }
}
