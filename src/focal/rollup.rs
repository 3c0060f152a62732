//! Union of arm, cytoband and gene results into the FocalCall table.

use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::arm::ArmSummary;
use super::classify::DominantStatus;
use super::cytoband::CytobandCall;
use super::gene::GeneFocal;
use super::RegionType;
use crate::utils::band::karyotype_cmp;

/// One surfaced region for one sample
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FocalCall {
    pub sample_id: String,
    pub status: DominantStatus,
    /// Arm label, band label or gene symbol depending on `region_type`
    pub region_id: String,
    pub region_type: RegionType,
}

impl FocalCall {
    pub fn new(sample_id: &str, status: DominantStatus, region_id: &str, region_type: RegionType) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            status,
            region_id: region_id.to_string(),
            region_type,
        }
    }
}

/// Table order: sample, then arm < cytoband < gene, then region.
///
/// Arms and bands sort in karyotype order, genes by symbol.
pub fn table_order(a: &FocalCall, b: &FocalCall) -> Ordering {
    a.sample_id
        .cmp(&b.sample_id)
        .then(a.region_type.cmp(&b.region_type))
        .then_with(|| match a.region_type {
            RegionType::Gene => a.region_id.cmp(&b.region_id),
            RegionType::Arm | RegionType::Cytoband => karyotype_cmp(&a.region_id, &b.region_id),
        })
        .then(a.status.cmp(&b.status))
}

/// Drop neutral rows, sort into table order and keep one row per
/// (sample, region type, region).
///
/// Applying this to its own output returns it unchanged.
pub fn normalize(mut calls: Vec<FocalCall>) -> Vec<FocalCall> {
    calls.retain(|c| c.status != DominantStatus::Neutral);
    calls.sort_by(table_order);
    calls.dedup_by(|later, kept| {
        let same_region = later.sample_id == kept.sample_id
            && later.region_type == kept.region_type
            && later.region_id == kept.region_id;
        if same_region && later.status != kept.status {
            warn!(
                "Conflicting statuses for {} {} {}: keeping {}, dropping {}",
                kept.sample_id, kept.region_type, kept.region_id, kept.status, later.status
            );
        }
        same_region
    });
    calls
}

/// Combine arm summaries, surfaced cytobands and surfaced genes.
pub fn combine(arms: &[ArmSummary], cytobands: &[CytobandCall], genes: &[GeneFocal]) -> Vec<FocalCall> {
    let arm_rows = arms
        .iter()
        .map(|a| FocalCall::new(&a.sample_id, a.status, &a.chromosome_arm, RegionType::Arm));
    let band_rows = cytobands
        .iter()
        .map(|c| FocalCall::new(&c.sample_id, c.status, &c.cytoband, RegionType::Cytoband));
    let gene_rows = genes
        .iter()
        .map(|g| FocalCall::new(&g.sample_id, g.status.into(), &g.gene_symbol, RegionType::Gene));

    normalize(arm_rows.chain(band_rows).chain(gene_rows).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::GeneStatus;

    fn arm(sample: &str, arm: &str, status: DominantStatus) -> ArmSummary {
        ArmSummary {
            sample_id: sample.to_string(),
            chromosome_arm: arm.to_string(),
            n_bands: 1,
            total_length: 1,
            loss_fraction: 0.0,
            gain_fraction: 0.0,
            callable_fraction: 1.0,
            status,
        }
    }

    fn band(sample: &str, cytoband: &str, status: DominantStatus) -> CytobandCall {
        CytobandCall {
            sample_id: sample.to_string(),
            chromosome_arm: String::new(),
            cytoband: cytoband.to_string(),
            status,
            arm_status: DominantStatus::Neutral,
        }
    }

    fn gene(sample: &str, symbol: &str, status: GeneStatus) -> GeneFocal {
        GeneFocal { sample_id: sample.to_string(), gene_symbol: symbol.to_string(), status }
    }

    fn sample_table() -> Vec<FocalCall> {
        combine(
            &[
                arm("S2", "17p", DominantStatus::Loss),
                arm("S1", "10q", DominantStatus::Uncallable),
                arm("S1", "2p", DominantStatus::Neutral),
                arm("S1", "1q", DominantStatus::Gain),
            ],
            &[
                band("S1", "2p24.3", DominantStatus::Gain),
                band("S1", "2p16.1", DominantStatus::Neutral),
                band("S1", "2p11.2", DominantStatus::Unstable),
            ],
            &[gene("S1", "MYCN", GeneStatus::Gain), gene("S2", "TP53", GeneStatus::Loss)],
        )
    }

    #[test]
    fn test_combine_drops_neutral_and_orders() {
        let table = sample_table();
        let rows: Vec<_> = table
            .iter()
            .map(|c| (c.sample_id.as_str(), c.region_type, c.region_id.as_str(), c.status))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("S1", RegionType::Arm, "1q", DominantStatus::Gain),
                ("S1", RegionType::Arm, "10q", DominantStatus::Uncallable),
                ("S1", RegionType::Cytoband, "2p11.2", DominantStatus::Unstable),
                ("S1", RegionType::Cytoband, "2p24.3", DominantStatus::Gain),
                ("S1", RegionType::Gene, "MYCN", DominantStatus::Gain),
                ("S2", RegionType::Arm, "17p", DominantStatus::Loss),
                ("S2", RegionType::Gene, "TP53", DominantStatus::Loss),
            ]
        );
    }

    #[test]
    fn test_no_neutral_rows() {
        assert!(sample_table().iter().all(|c| c.status != DominantStatus::Neutral));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = sample_table();
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_collapses_duplicates() {
        let calls = vec![
            FocalCall::new("S1", DominantStatus::Loss, "CDKN2A", RegionType::Gene),
            FocalCall::new("S1", DominantStatus::Neutral, "9p", RegionType::Arm),
            FocalCall::new("S1", DominantStatus::Loss, "CDKN2A", RegionType::Gene),
            FocalCall::new("S1", DominantStatus::Loss, "9p21.3", RegionType::Cytoband),
        ];
        let out = normalize(calls);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].region_type, RegionType::Cytoband);
        assert_eq!(out[1].region_id, "CDKN2A");
    }

    #[test]
    fn test_region_unique_per_type() {
        // same label at two levels is allowed
        let calls = vec![
            FocalCall::new("S1", DominantStatus::Loss, "12p", RegionType::Arm),
            FocalCall::new("S1", DominantStatus::Loss, "12p", RegionType::Cytoband),
        ];
        assert_eq!(normalize(calls).len(), 2);
    }
}
