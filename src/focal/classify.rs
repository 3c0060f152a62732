//! Threshold classifier shared by the arm and cytoband levels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Thresholds;
use crate::input::GeneStatus;

/// Single status selected for a region.
///
/// Variant order is the classifier's precedence after `Uncallable`, which is
/// checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DominantStatus {
    Loss,
    Gain,
    Unstable,
    Uncallable,
    Neutral,
}

impl DominantStatus {
    /// Loss or gain: a directional call that can gate finer levels.
    pub fn is_decisive(self) -> bool {
        matches!(self, DominantStatus::Loss | DominantStatus::Gain)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DominantStatus::Loss => "loss",
            DominantStatus::Gain => "gain",
            DominantStatus::Unstable => "unstable",
            DominantStatus::Uncallable => "uncallable",
            DominantStatus::Neutral => "neutral",
        }
    }
}

impl fmt::Display for DominantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GeneStatus> for DominantStatus {
    fn from(s: GeneStatus) -> Self {
        match s {
            GeneStatus::Loss => DominantStatus::Loss,
            GeneStatus::Gain => DominantStatus::Gain,
            GeneStatus::Neutral => DominantStatus::Neutral,
        }
    }
}

/// Classify a region from its loss/gain/callable fractions.
///
/// First match wins: uncallable, loss, gain, unstable, neutral. All
/// comparisons are strict, so a fraction equal to the threshold does not
/// fire its rule.
pub fn classify(
    loss_fraction: f64,
    gain_fraction: f64,
    callable_fraction: f64,
    thresholds: &Thresholds,
) -> DominantStatus {
    let t = thresholds.status_threshold;
    if callable_fraction < thresholds.min_callable() {
        DominantStatus::Uncallable
    } else if loss_fraction > t {
        DominantStatus::Loss
    } else if gain_fraction > t {
        DominantStatus::Gain
    } else if loss_fraction + gain_fraction > t {
        DominantStatus::Unstable
    } else {
        DominantStatus::Neutral
    }
}
