//! Arm-level aggregation of cytoband fractions.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::classify::{classify, DominantStatus};
use crate::config::Thresholds;
use crate::input::RegionStat;

/// Length-weighted fractions and dominant status for one (sample, arm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArmSummary {
    pub sample_id: String,
    pub chromosome_arm: String,
    /// Number of cytobands aggregated
    pub n_bands: usize,
    /// Summed cytoband length (bp)
    pub total_length: u64,
    pub loss_fraction: f64,
    pub gain_fraction: f64,
    pub callable_fraction: f64,
    pub status: DominantStatus,
}

/// Length-weighted sum of one fraction, with the range of values seen
#[derive(Clone, Copy)]
struct WeightedFraction {
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for WeightedFraction {
    fn default() -> Self {
        Self { sum: 0.0, min: f64::INFINITY, max: f64::NEG_INFINITY }
    }
}

impl WeightedFraction {
    fn add(&mut self, value: f64, weight: f64) {
        self.sum += value * weight;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Weighted mean, kept inside the range of its inputs.
    ///
    /// Rounding in `sum / total` can land an ulp outside that range; one band,
    /// or bands sharing a value, must give that value back exactly.
    fn mean(&self, total: f64) -> f64 {
        let mean = self.sum / total;
        // min > max only when every value was NaN
        if self.min <= self.max {
            mean.clamp(self.min, self.max)
        } else {
            mean
        }
    }
}

#[derive(Default)]
struct WeightedSums {
    n_bands: usize,
    total_length: u64,
    loss: WeightedFraction,
    gain: WeightedFraction,
    callable: WeightedFraction,
}

impl WeightedSums {
    fn add(&mut self, r: &RegionStat) {
        let w = r.region_length as f64;
        self.n_bands += 1;
        self.total_length = self.total_length.saturating_add(r.region_length);
        self.loss.add(r.loss_fraction, w);
        self.gain.add(r.gain_fraction, w);
        self.callable.add(r.callable_fraction, w);
    }
}

/// Aggregate cytoband rows into one summary per (sample, arm).
///
/// Fractions are means weighted by `region_length`. Summation follows input
/// row order and groups come out in first-seen order. Rows are expected to
/// have passed `input::validate_inputs` (positive, bounded lengths).
pub fn aggregate_arms(regions: &[RegionStat], thresholds: &Thresholds) -> Vec<ArmSummary> {
    let mut groups: IndexMap<(&str, &str), WeightedSums> = IndexMap::new();
    for r in regions {
        groups
            .entry((r.sample_id.as_str(), r.chromosome_arm.as_str()))
            .or_default()
            .add(r);
    }

    groups
        .into_iter()
        .map(|((sample_id, arm), sums)| {
            let w = sums.total_length as f64;
            let loss_fraction = sums.loss.mean(w);
            let gain_fraction = sums.gain.mean(w);
            let callable_fraction = sums.callable.mean(w);
            ArmSummary {
                sample_id: sample_id.to_string(),
                chromosome_arm: arm.to_string(),
                n_bands: sums.n_bands,
                total_length: sums.total_length,
                loss_fraction,
                gain_fraction,
                callable_fraction,
                status: classify(loss_fraction, gain_fraction, callable_fraction, thresholds),
            }
        })
        .collect()
}

/// Lookup of arm status by (sample_id, chromosome_arm)
pub fn arm_status_index(arms: &[ArmSummary]) -> HashMap<(&str, &str), DominantStatus> {
    arms.iter()
        .map(|a| ((a.sample_id.as_str(), a.chromosome_arm.as_str()), a.status))
        .collect()
}
