//! Cytoband classification and arm-gated surfacing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::arm::{arm_status_index, ArmSummary};
use super::classify::{classify, DominantStatus};
use super::{MissingJoinKey, RegionType};
use crate::config::Thresholds;
use crate::input::RegionStat;

/// A cytoband's own status next to its parent arm's status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CytobandCall {
    pub sample_id: String,
    pub chromosome_arm: String,
    pub cytoband: String,
    pub status: DominantStatus,
    pub arm_status: DominantStatus,
}

#[derive(Debug, Clone, Default)]
pub struct CytobandResolution {
    /// Every band with both statuses, before surfacing
    pub classified: Vec<CytobandCall>,
    /// Bands whose call adds information beyond the arm
    pub surfaced: Vec<CytobandCall>,
    /// Bands excluded for lack of an arm status
    pub missing: Vec<MissingJoinKey>,
}

impl CytobandResolution {
    /// Lookup of band status by (sample_id, cytoband) over the unfiltered table
    pub fn band_status_index(&self) -> HashMap<(&str, &str), DominantStatus> {
        self.classified
            .iter()
            .map(|c| ((c.sample_id.as_str(), c.cytoband.as_str()), c.status))
            .collect()
    }
}

/// Whether a band call surfaces under its arm.
///
/// A non-decisive arm lets every band through. A decisive arm hides its
/// bands unless the band makes a different decisive call.
pub fn should_surface(band: DominantStatus, arm: DominantStatus) -> bool {
    !arm.is_decisive() || (band != arm && band.is_decisive())
}

/// Classify each band on its own fractions and gate it on the arm status.
pub fn resolve_cytobands(
    regions: &[RegionStat],
    arms: &[ArmSummary],
    thresholds: &Thresholds,
) -> CytobandResolution {
    let arm_status = arm_status_index(arms);
    let mut res = CytobandResolution::default();

    for r in regions {
        let Some(&arm) = arm_status.get(&(r.sample_id.as_str(), r.chromosome_arm.as_str())) else {
            res.missing.push(MissingJoinKey {
                sample_id: r.sample_id.clone(),
                row_type: RegionType::Cytoband,
                row_region: r.cytoband.clone(),
                parent_type: RegionType::Arm,
                parent_key: r.chromosome_arm.clone(),
            });
            continue;
        };

        let call = CytobandCall {
            sample_id: r.sample_id.clone(),
            chromosome_arm: r.chromosome_arm.clone(),
            cytoband: r.cytoband.clone(),
            status: classify(r.loss_fraction, r.gain_fraction, r.callable_fraction, thresholds),
            arm_status: arm,
        };
        if should_surface(call.status, call.arm_status) {
            res.surfaced.push(call.clone());
        }
        res.classified.push(call);
    }

    res
}
