//! Output data structures for a focal resolution run
//!
//! The FocalCall table is the terminal artifact; it is serialized together
//! with the thresholds that produced it and a summary of the run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Thresholds;
use crate::error::InputIssue;
use crate::focal::{FocalCall, MissingJoinKey, RegionType};

/// Top-level output of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FocalOutput {
    /// Crate version that produced the table
    pub version: String,

    /// Thresholds used for arm and cytoband classification
    pub thresholds: Thresholds,

    /// Surfaced calls in table order
    pub calls: Vec<FocalCall>,

    /// Run counts and excluded rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl FocalOutput {
    /// Calls for one sample, in table order
    pub fn calls_for<'a>(&'a self, sample_id: &'a str) -> impl Iterator<Item = &'a FocalCall> + 'a {
        self.calls.iter().filter(move |c| c.sample_id == sample_id)
    }

    /// Number of calls per region type
    pub fn counts_by_type(&self) -> BTreeMap<RegionType, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.calls {
            *counts.entry(c.region_type).or_insert(0) += 1;
        }
        counts
    }
}

// ============================================================================
// Run Summary
// ============================================================================

/// Counts and exclusions for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunSummary {
    /// Distinct samples processed
    pub samples: usize,

    /// RegionStat rows accepted
    pub region_rows: usize,

    /// GeneCall rows accepted
    pub gene_rows: usize,

    /// Gene x band rows after band expansion
    pub gene_band_candidates: usize,

    /// Neutral gene calls removed before expansion
    pub neutral_genes_dropped: usize,

    /// Surfaced arm calls
    pub arm_calls: usize,

    /// Surfaced cytoband calls
    pub cytoband_calls: usize,

    /// Surfaced gene calls
    pub gene_calls: usize,

    /// Malformed rows dropped under the skip policy
    #[serde(default)]
    pub skipped_rows: Vec<InputIssue>,

    /// Rows excluded because a parent level had no status
    #[serde(default)]
    pub missing_join_keys: Vec<MissingJoinKey>,
}

impl RunSummary {
    pub fn missing_by_parent(&self, parent_type: RegionType) -> usize {
        self.missing_join_keys
            .iter()
            .filter(|m| m.parent_type == parent_type)
            .count()
    }
}
