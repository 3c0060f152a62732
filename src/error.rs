//! Error taxonomy for focal copy-number resolution.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which input table a malformed row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputTable {
    RegionStats,
    GeneCalls,
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputTable::RegionStats => write!(f, "region stats"),
            InputTable::GeneCalls => write!(f, "gene calls"),
        }
    }
}

/// A single rejected input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InputIssue {
    pub table: InputTable,
    /// 0-based row index in the table as supplied
    pub row: usize,
    /// Human readable key, e.g. "S1/12p13.1"
    pub key: String,
    pub reason: String,
}

impl fmt::Display for InputIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {} ({}): {}", self.table, self.row, self.key, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FocalError {
    #[error("Malformed input ({} rows rejected):\n{}", .issues.len(), format_issues(.issues))]
    MalformedInput { issues: Vec<InputIssue> },

    #[error("Invalid threshold {name} = {value}: {reason}")]
    ThresholdMisconfiguration {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output failed schema validation: {0}")]
    Schema(String),
}

// Cap on issues spelled out in the error message; the full list stays on the variant.
const MAX_LISTED_ISSUES: usize = 20;

fn format_issues(issues: &[InputIssue]) -> String {
    let mut lines: Vec<String> = issues
        .iter()
        .take(MAX_LISTED_ISSUES)
        .map(|i| format!("  - {}", i))
        .collect();
    if issues.len() > MAX_LISTED_ISSUES {
        lines.push(format!("  ... and {} more", issues.len() - MAX_LISTED_ISSUES));
    }
    lines.join("\n")
}

pub type Result<T> = std::result::Result<T, FocalError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(row: usize) -> InputIssue {
        InputIssue {
            table: InputTable::RegionStats,
            row,
            key: format!("S1/1p{}", row),
            reason: "loss_fraction 1.2 outside [0, 1]".to_string(),
        }
    }

    #[test]
    fn test_malformed_message_lists_rows() {
        let err = FocalError::MalformedInput { issues: vec![issue(3), issue(7)] };
        let msg = err.to_string();
        assert!(msg.contains("2 rows rejected"));
        assert!(msg.contains("region stats row 3 (S1/1p3)"));
        assert!(msg.contains("region stats row 7 (S1/1p7)"));
    }

    #[test]
    fn test_malformed_message_truncates() {
        let issues: Vec<_> = (0..25).map(issue).collect();
        let msg = FocalError::MalformedInput { issues }.to_string();
        assert!(msg.contains("... and 5 more"));
        assert!(!msg.contains("row 24 "));
    }
}
