//! JSON dump of the finalized data.
//!
//! Stable top-level key set; indices are integers, ids are objects
//! with `kind` and `code`/`name` discriminators. Key ordering is
//! deterministic (serde_json maps are ordered by key).

use crate::context::Value;
use crate::error::Error;
use crate::finalize::FinalData;
use crate::merge::MergeContext;
use serde_json::json;
use std::path::Path;

pub fn render(mc: &MergeContext, data: &FinalData) -> serde_json::Value {
    let mut variables = serde_json::Map::new();
    for (name, value) in &mc.globals.variables {
        let value = match value {
            Value::Single(val) => json!(val),
            Value::List(vals) => json!(vals),
        };
        variables.insert(name.to_string(), value);
    }

    json!({
        "variables": variables,
        "capabilities": data.capabilities,
        "layers": data.layers,
        "trigger_macros": data.trigger_macros,
        "result_macros": data.result_macros,
        "pixel_mapping": data.pixel_mapping,
        "pixel_display_mapping": data.pixel_display_mapping,
        "animations": data.animations,
        "scancode_positions": data.scancode_positions,
        "pixel_positions": data.pixel_positions,
        "kll_version": data.kll_version,
        "compiler_version": data.compiler_version,
    })
}

pub fn write(mc: &MergeContext, data: &FinalData, output: Option<&Path>) -> Result<(), Error> {
    let value = render(mc, data);
    let text = serde_json::to_string_pretty(&value)
        .map_err(|err| Error::Internal(format!("JSON serialization failed: {}", err)))?;
    super::write_output(&format!("{}\n", text), output)
}
