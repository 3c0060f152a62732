//! Focal copy-number resolution across the arm > cytoband > gene hierarchy.
//!
//! Stages, leaf first:
//! - `classify`: threshold classifier shared by arm and cytoband levels
//! - `arm`: length-weighted arm aggregation
//! - `cytoband`: per-band classification and arm-gated surfacing
//! - `gene`: band expansion, parent joins, gene surfacing and deduplication
//! - `rollup`: union into the long FocalCall table
//!
//! Levels are flat tables joined on (sample, arm) and (sample, cytoband).

pub mod arm;
pub mod classify;
pub mod cytoband;
pub mod gene;
pub mod rollup;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use arm::{aggregate_arms, ArmSummary};
pub use classify::{classify, DominantStatus};
pub use cytoband::{resolve_cytobands, CytobandCall, CytobandResolution};
pub use gene::{resolve_genes, GeneFocal, GeneResolution};
pub use rollup::{combine, normalize, FocalCall};

/// Hierarchy level of a region. Ordered coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    Arm,
    Cytoband,
    Gene,
}

impl RegionType {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionType::Arm => "arm",
            RegionType::Cytoband => "cytoband",
            RegionType::Gene => "gene",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row excluded because its parent level had no status for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MissingJoinKey {
    pub sample_id: String,
    /// Level of the row that was excluded
    pub row_type: RegionType,
    /// Band or gene symbol of the excluded row
    pub row_region: String,
    /// Level whose lookup failed
    pub parent_type: RegionType,
    /// Arm or band label that was not found
    pub parent_key: String,
}

impl fmt::Display for MissingJoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: no {} status for '{}'",
            self.sample_id, self.row_type, self.row_region, self.parent_type, self.parent_key
        )
    }
}
