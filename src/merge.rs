//! Cross-context merge.
//!
//! Contexts fold in fixed precedence order: Generic, Configuration,
//! BaseMap, DefaultMap, then each PartialMap in declaration order,
//! then the explicit Merge context. Layer 0 is the fold of the
//! non-partial contexts; each PartialMap projects to its own layer and
//! carries only its own entries (missing triggers fall through to
//! layer 0 in the firmware).

use crate::context::{apply_mapping, Keymap, KllState, Value};
use crate::error::{Diagnostics, Error};
use crate::KllGroups;

/// Owned result of the merge; emitters never see the per-file stores.
#[derive(Debug, Default, Clone)]
pub struct MergeContext<'a> {
    pub globals: KllState<'a>,
    pub partials: Vec<Keymap<'a>>,
}

/// Fold `src` into `dst` under the cross-context store rules.
pub fn merge_state_into<'a>(
    dst: &mut KllState<'a>,
    src: &KllState<'a>,
    diag: &mut Diagnostics,
) {
    merge_stores_into(dst, src, diag);
    for entry in src.keymap.values() {
        apply_mapping(
            &mut dst.keymap,
            entry.mapping.clone(),
            entry.line,
            &entry.file,
            false,
            diag,
        );
    }
}

/// Everything except the keymap: used both by the ordinary fold and by
/// partial contexts, whose mappings project to their own layer while
/// their variables, capabilities, positions and animations apply
/// globally.
fn merge_stores_into<'a>(dst: &mut KllState<'a>, src: &KllState<'a>, diag: &mut Diagnostics) {
    for (name, val) in &src.defines {
        dst.defines.insert(*name, *val);
    }

    for (name, value) in &src.variables {
        if let (Some(Value::List(dst_list)), Value::List(src_list)) =
            (dst.variables.get_mut(name), value)
        {
            // Element-wise patch; empty slots are unset placeholders
            if dst_list.len() < src_list.len() {
                dst_list.resize(src_list.len(), "");
            }
            for (index, val) in src_list.iter().enumerate() {
                if !val.is_empty() {
                    dst_list[index] = val;
                }
            }
            continue;
        }
        dst.variables.insert(*name, value.clone());
    }

    for (name, cap) in &src.capabilities {
        if let Some(existing) = dst.capabilities.get(name) {
            if existing != cap {
                diag.error(Error::Merge(format!(
                    "capability '{}' declared with conflicting signatures: {} vs {}",
                    name, existing, cap
                )));
                continue;
            }
        }
        dst.capabilities.insert(*name, cap.clone());
    }

    for (code, pos) in &src.positions {
        dst.positions
            .entry(*code)
            .and_modify(|p| p.merge(pos))
            .or_insert_with(|| pos.clone());
    }

    for (index, pos) in &src.pixel_positions {
        dst.pixel_positions
            .entry(*index)
            .and_modify(|p| p.merge(pos))
            .or_insert_with(|| pos.clone());
    }

    for (index, def) in &src.pixelmap {
        dst.pixelmap.insert(*index, def.clone());
    }

    for (name, anim) in &src.animations {
        let entry = dst.animations.entry(*name).or_default();
        entry.modifiers.extend(anim.modifiers.iter().map(|(k, v)| (*k, *v)));
        if !anim.frames.is_empty() {
            if anim.append_mode() {
                entry.frames.extend(anim.frames.iter().cloned());
            } else {
                entry.frames = anim.frames.clone();
            }
        }
    }
}

/// Project one partial context's mappings to its own layer. Isolated
/// layer-0 entries survive plain overrides (the layer then carries the
/// isolated mapping); `:+`/`:-` accumulate onto a copy of the layer-0
/// entry.
fn project_partial<'a>(
    layer0: &Keymap<'a>,
    own: Keymap<'a>,
    diag: &mut Diagnostics,
) -> Keymap<'a> {
    let mut layer = Keymap::new();
    for (key, entry) in own {
        let mode = entry.mapping.1;
        let file = entry.file.clone();
        let line = entry.line;
        match layer0.get(&key) {
            Some(base) if base.isolated && !mode.is_isolate() => {
                diag.warn(
                    &file,
                    line,
                    format!(
                        "mapping for '{}' is isolated in layer 0; partial override rejected",
                        key
                    ),
                );
                layer.insert(key, base.clone());
            }
            Some(base) if mode.is_add() || mode.is_remove() => {
                layer.insert(key.clone(), base.clone());
                apply_mapping(&mut layer, entry.mapping, line, &file, false, diag);
            }
            _ => {
                apply_mapping(&mut layer, entry.mapping, line, &file, false, diag);
            }
        }
    }
    layer
}

/// Fold all contexts into a single MergeContext.
pub fn merge<'a>(groups: &KllGroups<'a>, diag: &mut Diagnostics) -> MergeContext<'a> {
    let mut globals = KllState::default();

    for state in groups
        .generic
        .iter()
        .chain(&groups.config)
        .chain(&groups.base)
        .chain(&groups.default)
    {
        merge_state_into(&mut globals, state, diag);
    }

    let mut partials = vec![];
    for group in &groups.partials {
        let mut partial = KllState::default();
        for state in group {
            merge_state_into(&mut partial, state, diag);
        }
        merge_stores_into(&mut globals, &partial, diag);
        let layer = project_partial(&globals.keymap, partial.keymap, diag);
        partials.push(layer);
    }

    for state in &groups.merge {
        merge_state_into(&mut globals, state, diag);
    }

    MergeContext { globals, partials }
}
