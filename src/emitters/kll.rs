//! Canonical KLL regeneration.
//!
//! Prints the merged context back out as a single `.kll` file: one
//! statement per line, canonical id and schedule forms, sections
//! ordered by kind and keys alphanumerically within each section.
//! Reparsing the output and emitting again yields identical text.

use crate::context::{MappingEntry, Value};
use crate::error::Error;
use crate::merge::MergeContext;
use crate::types::{maybe_quote, TriggerMode};
use std::path::Path;

fn canonical_mode(entry: &MappingEntry) -> TriggerMode {
    let mode = entry.mapping.1;
    if entry.isolated {
        if mode.is_indicator() {
            TriggerMode::IndicatorIsolate
        } else {
            TriggerMode::Isolate
        }
    } else if mode.is_add() || mode.is_remove() {
        mode
    } else if mode.is_indicator() {
        TriggerMode::IndicatorReplace
    } else {
        TriggerMode::Replace
    }
}

pub fn render(mc: &MergeContext) -> String {
    let mut out = String::new();
    let state = &mc.globals;

    let mut defines: Vec<_> = state.defines.iter().collect();
    defines.sort_by(|a, b| alphanumeric_sort::compare_str(a.0, b.0));
    for (name, val) in defines {
        out.push_str(&format!("{} => {};\n", name, val));
    }

    let mut variables: Vec<_> = state.variables.iter().collect();
    variables.sort_by(|a, b| alphanumeric_sort::compare_str(a.0, b.0));
    for (name, value) in variables {
        match value {
            Value::Single(val) => {
                out.push_str(&format!("{} = {};\n", maybe_quote(name), maybe_quote(val)));
            }
            Value::List(vals) => {
                out.push_str(&format!(
                    "{}[] = {};\n",
                    name,
                    vals.iter()
                        .map(|v| maybe_quote(v))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
        }
    }

    let mut capabilities: Vec<_> = state.capabilities.iter().collect();
    capabilities.sort_by(|a, b| alphanumeric_sort::compare_str(a.0, b.0));
    for (name, cap) in capabilities {
        out.push_str(&format!("{} => {};\n", name, cap));
    }

    let mut positions: Vec<_> = state.positions.iter().collect();
    positions.sort_by_key(|(code, _)| **code);
    for (code, pos) in positions {
        let text = pos.to_string();
        if !text.is_empty() {
            out.push_str(&format!("S0x{:02X} <= {};\n", code, text));
        }
    }

    let mut pixel_positions: Vec<_> = state.pixel_positions.iter().collect();
    pixel_positions.sort_by_key(|(index, _)| **index);
    for (index, pos) in pixel_positions {
        let text = pos.to_string();
        if !text.is_empty() {
            out.push_str(&format!("P[{}] <= {};\n", index, text));
        }
    }

    let mut pixelmap: Vec<_> = state.pixelmap.iter().collect();
    pixelmap.sort_by_key(|(index, _)| **index);
    for (index, def) in pixelmap {
        out.push_str(&format!(
            "P[{}]({}) : {};\n",
            index,
            def.channels_string(),
            def.scancode
                .map(|s| format!("S0x{:02X}", s))
                .unwrap_or_else(|| "None".to_string())
        ));
    }

    let mut animations: Vec<_> = state.animations.iter().collect();
    animations.sort_by(|a, b| alphanumeric_sort::compare_str(a.0, b.0));
    for (name, anim) in animations {
        if !anim.modifiers.is_empty() {
            out.push_str(&format!("A[{}] <= {};\n", name, anim.modifiers_string()));
        }
        for (index, frame) in anim.frames.iter().enumerate() {
            if frame.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "A[{}, {}] <= {};\n",
                name,
                index,
                frame
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    let mut mappings: Vec<_> = state.keymap.iter().collect();
    mappings.sort_by(|a, b| alphanumeric_sort::compare_str(a.0, b.0));
    for (key, entry) in mappings {
        out.push_str(&format!(
            "{} {} {};\n",
            key,
            canonical_mode(entry),
            entry.mapping.2
        ));
    }

    out
}

pub fn write(mc: &MergeContext, output: Option<&Path>) -> Result<(), Error> {
    super::write_output(&render(mc), output)
}
