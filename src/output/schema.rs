//! Schema for the serialized FocalCall table.
//!
//! The schema is derived from `FocalOutput` and compiled once per process.
//! `write_json_to` checks every document against it before writing.

use std::sync::LazyLock;

use jsonschema::Validator;
use schemars::schema_for;
use serde_json::Value;

use super::types::FocalOutput;

/// Env switch for validation in release builds
pub const VALIDATE_ENV: &str = "FOCALCN_VALIDATE_OUTPUT";

static SCHEMA: LazyLock<schemars::Schema> = LazyLock::new(|| schema_for!(FocalOutput));

// Compile failure is kept and reported on each call.
static VALIDATOR: LazyLock<Result<Validator, String>> = LazyLock::new(|| {
    let schema = serde_json::to_value(&*SCHEMA).map_err(|e| format!("schema to JSON: {}", e))?;
    jsonschema::validator_for(&schema).map_err(|e| format!("schema compile: {}", e))
});

/// Pretty-printed schema, e.g. for publishing next to result files.
pub fn schema_json_pretty() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&*SCHEMA)
}

/// Check a serialized table; the error lists every offending path.
pub fn validate(value: &Value) -> Result<(), String> {
    let validator = (*VALIDATOR).as_ref().map_err(Clone::clone)?;

    let problems: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("  - at '{}': {}", e.instance_path, e))
        .collect();
    if problems.is_empty() {
        return Ok(());
    }
    Err(format!("{} schema violations:\n{}", problems.len(), problems.join("\n")))
}

/// Debug builds always validate; release builds only with `FOCALCN_VALIDATE_OUTPUT=1|true`.
pub fn should_validate() -> bool {
    cfg!(debug_assertions) || env_enabled(std::env::var(VALIDATE_ENV).ok().as_deref())
}

fn env_enabled(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v == "1" || v.eq_ignore_ascii_case("true"))
}
