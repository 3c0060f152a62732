//! Gene-level surfacing against arm and cytoband context.

use indexmap::IndexSet;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::classify::DominantStatus;
use super::{MissingJoinKey, RegionType};
use crate::input::{GeneCall, GeneStatus};
use crate::utils::band::split_band_label;

/// One gene call attached to one of the bands it spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneBandRow<'a> {
    pub sample_id: &'a str,
    pub gene_symbol: &'a str,
    pub chromosome_arm: &'a str,
    pub band: String,
    pub status: GeneStatus,
}

/// A surfaced gene call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct GeneFocal {
    pub sample_id: String,
    pub gene_symbol: String,
    pub status: GeneStatus,
}

#[derive(Debug, Clone, Default)]
pub struct GeneResolution {
    /// Distinct (sample, gene, status) rows that surfaced
    pub surfaced: Vec<GeneFocal>,
    /// Expanded (gene, band) rows before joining
    pub candidates: usize,
    /// Neutral gene calls removed before expansion
    pub neutral_dropped: usize,
    /// Expanded rows excluded for lack of an arm or band status
    pub missing: Vec<MissingJoinKey>,
}

/// Expand multi-band labels into one row per band.
///
/// A label with no usable piece is kept as-is so the join reports it.
pub fn expand_gene_bands<'a, I>(genes: I, delimiter: &str) -> Vec<GeneBandRow<'a>>
where
    I: IntoIterator<Item = &'a GeneCall>,
{
    genes
        .into_iter()
        .flat_map(|g| {
            let mut bands = split_band_label(&g.cytoband_label, delimiter);
            if bands.is_empty() {
                bands.push(g.cytoband_label.clone());
            }
            bands.into_iter().map(move |band| GeneBandRow {
                sample_id: g.sample_id.as_str(),
                gene_symbol: g.gene_symbol.as_str(),
                chromosome_arm: g.chromosome_arm.as_str(),
                band,
                status: g.status,
            })
        })
        .collect()
}

/// Whether a gene call surfaces given its arm and band context.
///
/// Surfaces when it differs from both parents, or when it differs from a
/// decisive band regardless of the arm.
pub fn gene_surfaces(gene: GeneStatus, arm: DominantStatus, band: DominantStatus) -> bool {
    let g = DominantStatus::from(gene);
    (g != arm && g != band) || (band.is_decisive() && g != band)
}

/// Resolve gene calls against arm and band statuses.
///
/// `arm_status` is keyed by (sample_id, chromosome_arm) and `band_status` by
/// (sample_id, cytoband), both over unfiltered tables.
pub fn resolve_genes(
    genes: &[GeneCall],
    arm_status: &HashMap<(&str, &str), DominantStatus>,
    band_status: &HashMap<(&str, &str), DominantStatus>,
    delimiter: &str,
) -> GeneResolution {
    let neutral_dropped = genes.iter().filter(|g| g.status == GeneStatus::Neutral).count();
    if neutral_dropped > 0 {
        debug!("Dropped {} neutral gene calls before band expansion", neutral_dropped);
    }

    let expanded = expand_gene_bands(
        genes.iter().filter(|g| g.status != GeneStatus::Neutral),
        delimiter,
    );
    let candidates = expanded.len();

    let mut missing = Vec::new();
    let mut kept: IndexSet<(&str, &str, GeneStatus)> = IndexSet::new();
    for row in &expanded {
        let Some(&arm) = arm_status.get(&(row.sample_id, row.chromosome_arm)) else {
            missing.push(missing_key(row, RegionType::Arm, row.chromosome_arm));
            continue;
        };
        let Some(&band) = band_status.get(&(row.sample_id, row.band.as_str())) else {
            missing.push(missing_key(row, RegionType::Cytoband, &row.band));
            continue;
        };
        if gene_surfaces(row.status, arm, band) {
            kept.insert((row.sample_id, row.gene_symbol, row.status));
        }
    }

    let surfaced = kept
        .into_iter()
        .map(|(sample_id, gene_symbol, status)| GeneFocal {
            sample_id: sample_id.to_string(),
            gene_symbol: gene_symbol.to_string(),
            status,
        })
        .collect();

    GeneResolution { surfaced, candidates, neutral_dropped, missing }
}

fn missing_key(row: &GeneBandRow<'_>, parent_type: RegionType, parent_key: &str) -> MissingJoinKey {
    MissingJoinKey {
        sample_id: row.sample_id.to_string(),
        row_type: RegionType::Gene,
        row_region: row.gene_symbol.to_string(),
        parent_type,
        parent_key: parent_key.to_string(),
    }
}
