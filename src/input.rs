//! Input tables consumed by the focal resolver.
//!
//! Both tables are produced upstream: `RegionStat` by the cytoband annotation
//! step, `GeneCall` by the gene-level CN annotation step. Rows are checked
//! here before any classification happens.

use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::InputPolicy;
use crate::error::{FocalError, InputIssue, InputTable};

/// Slack allowed on `loss + gain <= 1` for upstream rounding
const FRACTION_SUM_EPSILON: f64 = 1e-9;

/// Upper bound on a single band length (bp); keeps per-arm length sums in range
pub const MAX_REGION_LENGTH: u64 = 1 << 40;

/// Per sample x cytoband coverage fractions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RegionStat {
    pub sample_id: String,
    /// Arm label, e.g. "12p"
    pub chromosome_arm: String,
    /// Band label, e.g. "12p13.1"
    pub cytoband: String,
    /// Band length in bp; weight used for arm aggregation
    pub region_length: u64,
    pub loss_fraction: f64,
    pub gain_fraction: f64,
    pub callable_fraction: f64,
}

impl RegionStat {
    pub fn new(
        sample_id: &str,
        chromosome_arm: &str,
        cytoband: &str,
        region_length: u64,
        loss_fraction: f64,
        gain_fraction: f64,
        callable_fraction: f64,
    ) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            chromosome_arm: chromosome_arm.to_string(),
            cytoband: cytoband.to_string(),
            region_length,
            loss_fraction,
            gain_fraction,
            callable_fraction,
        }
    }

    fn key(&self) -> String {
        format!("{}/{}", self.sample_id, self.cytoband)
    }

    /// Returns the first reason this row is unusable, if any
    fn check(&self) -> Option<String> {
        if self.sample_id.is_empty() || self.chromosome_arm.is_empty() || self.cytoband.is_empty() {
            return Some("empty sample_id, chromosome_arm or cytoband".to_string());
        }
        if self.region_length == 0 {
            return Some("region_length must be positive".to_string());
        }
        if self.region_length > MAX_REGION_LENGTH {
            return Some(format!(
                "region_length {} exceeds {}",
                self.region_length, MAX_REGION_LENGTH
            ));
        }
        for (name, v) in [
            ("loss_fraction", self.loss_fraction),
            ("gain_fraction", self.gain_fraction),
            ("callable_fraction", self.callable_fraction),
        ] {
            if let Some(reason) = check_fraction(name, v) {
                return Some(reason);
            }
        }
        let sum = self.loss_fraction + self.gain_fraction;
        if sum > 1.0 + FRACTION_SUM_EPSILON {
            return Some(format!("loss_fraction + gain_fraction = {} exceeds 1", sum));
        }
        None
    }
}

fn check_fraction(name: &str, v: f64) -> Option<String> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        Some(format!("{} {} outside [0, 1]", name, v))
    } else {
        None
    }
}

/// Gene-level copy-number status as delivered upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GeneStatus {
    Loss,
    #[serde(alias = "amplification", alias = "amp")]
    Gain,
    Neutral,
}

impl GeneStatus {
    /// Parse a status label, folding the amplification synonyms into gain.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "loss" => Some(GeneStatus::Loss),
            "gain" | "amplification" | "amp" => Some(GeneStatus::Gain),
            "neutral" => Some(GeneStatus::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for GeneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneStatus::Loss => write!(f, "loss"),
            GeneStatus::Gain => write!(f, "gain"),
            GeneStatus::Neutral => write!(f, "neutral"),
        }
    }
}

/// Per sample x gene call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneCall {
    pub sample_id: String,
    pub gene_symbol: String,
    /// Band label; may join several bands, e.g. "12p-12q"
    pub cytoband_label: String,
    pub chromosome_arm: String,
    pub status: GeneStatus,
}

impl GeneCall {
    pub fn new(
        sample_id: &str,
        gene_symbol: &str,
        cytoband_label: &str,
        chromosome_arm: &str,
        status: GeneStatus,
    ) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            gene_symbol: gene_symbol.to_string(),
            cytoband_label: cytoband_label.to_string(),
            chromosome_arm: chromosome_arm.to_string(),
            status,
        }
    }

    fn key(&self) -> String {
        format!("{}/{}", self.sample_id, self.gene_symbol)
    }

    fn check(&self) -> Option<String> {
        if self.sample_id.is_empty()
            || self.gene_symbol.is_empty()
            || self.cytoband_label.is_empty()
            || self.chromosome_arm.is_empty()
        {
            return Some("empty sample_id, gene_symbol, cytoband_label or chromosome_arm".to_string());
        }
        None
    }
}

/// Inputs that passed validation, plus whatever was dropped under `InputPolicy::Skip`
#[derive(Debug, Clone, Default)]
pub struct ValidatedInputs {
    pub regions: Vec<RegionStat>,
    pub genes: Vec<GeneCall>,
    pub skipped: Vec<InputIssue>,
}

/// Check both tables row by row.
///
/// Duplicate band keys keep the first occurrence and flag the rest. A gene row
/// repeated verbatim is collapsed; one that repeats the key with different
/// content is flagged. Under `InputPolicy::Strict` any issue fails the whole
/// input; nothing is clamped.
pub fn validate_inputs(
    regions: Vec<RegionStat>,
    genes: Vec<GeneCall>,
    policy: InputPolicy,
) -> Result<ValidatedInputs, FocalError> {
    let mut issues: Vec<InputIssue> = Vec::new();

    let mut seen_bands: HashSet<(String, String)> = HashSet::new();
    let mut kept_regions = Vec::with_capacity(regions.len());
    for (row, r) in regions.into_iter().enumerate() {
        let reason = r.check().or_else(|| {
            if seen_bands.insert((r.sample_id.clone(), r.cytoband.clone())) {
                None
            } else {
                Some("duplicate (sample_id, cytoband)".to_string())
            }
        });
        match reason {
            Some(reason) => issues.push(InputIssue {
                table: InputTable::RegionStats,
                row,
                key: r.key(),
                reason,
            }),
            None => kept_regions.push(r),
        }
    }

    // exact repeats collapse; a repeated key with different content is malformed
    let mut seen_genes: HashMap<(String, String), usize> = HashMap::new();
    let mut kept_genes: Vec<GeneCall> = Vec::with_capacity(genes.len());
    let mut repeated = 0usize;
    for (row, g) in genes.into_iter().enumerate() {
        let mut reason = g.check();
        if reason.is_none() {
            let key = (g.sample_id.clone(), g.gene_symbol.clone());
            if let Some(&first) = seen_genes.get(&key) {
                if kept_genes[first] == g {
                    repeated += 1;
                    continue;
                }
                reason = Some(format!(
                    "duplicate (sample_id, gene_symbol) conflicts with an earlier row ({} vs {})",
                    g.status, kept_genes[first].status
                ));
            } else {
                seen_genes.insert(key, kept_genes.len());
            }
        }
        match reason {
            Some(reason) => issues.push(InputIssue {
                table: InputTable::GeneCalls,
                row,
                key: g.key(),
                reason,
            }),
            None => kept_genes.push(g),
        }
    }
    if repeated > 0 {
        debug!("Collapsed {} repeated gene call rows", repeated);
    }

    if issues.is_empty() {
        return Ok(ValidatedInputs { regions: kept_regions, genes: kept_genes, skipped: issues });
    }

    match policy {
        InputPolicy::Strict => Err(FocalError::MalformedInput { issues }),
        InputPolicy::Skip => {
            warn!("Skipping {} malformed input rows", issues.len());
            for issue in issues.iter().take(5) {
                warn!("  {}", issue);
            }
            Ok(ValidatedInputs { regions: kept_regions, genes: kept_genes, skipped: issues })
        }
    }
}
