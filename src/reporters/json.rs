//! JSON reporter
//!
//! Outputs the full DetectionResult as pretty-printed JSON.
//! Useful for machine consumption, piping to jq, or further processing.

use crate::models::DetectionResult;
use anyhow::Result;

/// Render result as JSON
pub fn render(result: &DetectionResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Render result as compact JSON (single line, for JSON Lines output)
pub fn render_compact(result: &DetectionResult) -> Result<String> {
    Ok(serde_json::to_string(result)?)
}
