//! Per-context organization.
//!
//! Classifies a parsed file's statements into the context stores and
//! applies the intra-context override rules: last writer wins (with a
//! shadow warning), `:+` unions, `:-` removes and deletes on empty,
//! `::` isolates.

use crate::error::Diagnostics;
use crate::types::*;
use indexmap::IndexMap;

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Value<'a> {
    List(Vec<&'a str>),
    Single(&'a str),
}

#[derive(Debug, Clone)]
pub struct MappingEntry<'a> {
    pub mapping: Mapping<'a>,
    pub isolated: bool,
    pub file: String,
    pub line: usize,
}

pub type Keymap<'a> = IndexMap<String, MappingEntry<'a>>;

/// Stores of one context (one file, or one role's folded files).
#[derive(Debug, Default, Clone)]
pub struct KllState<'a> {
    pub defines: IndexMap<&'a str, &'a str>,
    pub variables: IndexMap<&'a str, Value<'a>>,
    pub capabilities: IndexMap<&'a str, Capability<'a>>,
    pub keymap: Keymap<'a>,
    pub positions: IndexMap<usize, Position>,
    pub pixel_positions: IndexMap<usize, Position>,
    pub pixelmap: IndexMap<usize, PixelDef>,
    pub animations: IndexMap<&'a str, Animation<'a>>,
}

/// Apply one mapping expression to a keymap under the override rules.
/// `intra` selects the same-context behavior (shadow warnings on
/// replacement); cross-context folds replace silently but still honor
/// isolation.
pub fn apply_mapping<'a>(
    keymap: &mut Keymap<'a>,
    mapping: Mapping<'a>,
    line: usize,
    file: &str,
    intra: bool,
    diag: &mut Diagnostics,
) {
    let key = mapping.trigger_key();
    let mode = mapping.1;

    if mode.is_add() {
        match keymap.get_mut(&key) {
            Some(entry) => {
                // Union: append result sequences not already present
                for combo in mapping.2 .0 {
                    if !entry.mapping.2 .0.contains(&combo) {
                        entry.mapping.2 .0.push(combo);
                    }
                }
            }
            None => {
                // No base yet; retained mode-tagged so a later fold can
                // accumulate it onto a lower-precedence mapping
                keymap.insert(
                    key,
                    MappingEntry {
                        mapping,
                        isolated: false,
                        file: file.to_string(),
                        line,
                    },
                );
            }
        }
        return;
    }

    if mode.is_remove() {
        match keymap.get_mut(&key) {
            Some(entry) => {
                entry.mapping.2 .0.retain(|combo| !mapping.2 .0.contains(combo));
                if entry.mapping.2 .0.is_empty() {
                    log::debug!("{}:{}: mapping for '{}' removed entirely", file, line, key);
                    keymap.shift_remove(&key);
                }
            }
            None => {
                keymap.insert(
                    key,
                    MappingEntry {
                        mapping,
                        isolated: false,
                        file: file.to_string(),
                        line,
                    },
                );
            }
        }
        return;
    }

    // Replace / Set / Isolate
    let isolated = mode.is_isolate();
    match keymap.get_mut(&key) {
        Some(existing) => {
            if existing.isolated && !isolated {
                diag.warn(
                    file,
                    line,
                    format!("mapping for '{}' is isolated and was not overridden", key),
                );
                return;
            }
            if existing.isolated && isolated {
                diag.warn(
                    file,
                    line,
                    format!("isolated mapping for '{}' overridden by a later isolation", key),
                );
            } else if intra {
                diag.warn(
                    file,
                    line,
                    format!("mapping for '{}' shadows an earlier assignment", key),
                );
            }
            *existing = MappingEntry {
                mapping,
                isolated,
                file: file.to_string(),
                line,
            };
        }
        None => {
            keymap.insert(
                key,
                MappingEntry {
                    mapping,
                    isolated,
                    file: file.to_string(),
                    line,
                },
            );
        }
    }
}

fn validate_schedule(
    schedule: &Schedule,
    analog_ok: bool,
    file: &str,
    line: usize,
    diag: &mut Diagnostics,
) {
    let mut seen: Vec<Option<ScheduleState>> = vec![];
    for param in &schedule.params {
        if seen.contains(&param.state) {
            match param.state {
                Some(state) => diag.semantic(
                    file,
                    line,
                    format!("schedule binds state '{}' more than once", state),
                ),
                None => diag.semantic(
                    file,
                    line,
                    "schedule binds the implicit state more than once".to_string(),
                ),
            }
            continue;
        }
        seen.push(param.state);
        if param.analog.is_some() && !analog_ok {
            diag.warn(
                file,
                line,
                "analog schedule value on a non-analog trigger".to_string(),
            );
        }
    }
}

fn validate_mapping(mapping: &Mapping, file: &str, line: usize, diag: &mut Diagnostics) {
    for trigger in mapping.0.iter() {
        if let Some(schedule) = &trigger.state {
            let analog_ok = matches!(
                &trigger.trigger,
                TriggerType::Key(group)
                    if matches!(group.first(), Some(Key::Scancode(_)))
            );
            validate_schedule(schedule, analog_ok, file, line, diag);
        }
    }
    for action in mapping.2.iter() {
        if let Some(schedule) = &action.state {
            validate_schedule(schedule, true, file, line, diag);
        }
    }
}

impl<'a> KllFile<'a> {
    /// Classify this file's statements into a fresh context store set.
    pub fn into_state(self, file: &str, diag: &mut Diagnostics) -> KllState<'a> {
        let mut kll = KllState::default();
        for (line, statement) in self.statements {
            match statement {
                Statement::Define((name, val)) => {
                    if let Some(existing) = kll.defines.get(name) {
                        if *existing != val {
                            diag.semantic(
                                file,
                                line,
                                format!(
                                    "name association '{}' redeclared with a different target",
                                    name
                                ),
                            );
                            continue;
                        }
                    }
                    kll.defines.insert(name, val);
                }
                Statement::Variable((var, vals)) => match var {
                    Variable::Scalar(name) => {
                        let val = vals.first().copied().unwrap_or("");
                        if let Some(Value::Single(existing)) = kll.variables.get(name) {
                            if *existing != val {
                                diag.warn(
                                    file,
                                    line,
                                    format!("assignment to '{}' shadows an earlier value", name),
                                );
                            }
                        }
                        kll.variables.insert(name, Value::Single(val));
                    }
                    Variable::ArrayWhole(name) => {
                        kll.variables.insert(name, Value::List(vals));
                    }
                    Variable::ArrayElement(name, index) => {
                        let val = vals.first().copied().unwrap_or("");
                        let entry = kll
                            .variables
                            .entry(name)
                            .or_insert_with(|| Value::List(vec![]));
                        if let Value::Single(_) = entry {
                            // Later form wins; the scalar becomes an array
                            *entry = Value::List(vec![]);
                        }
                        if let Value::List(list) = entry {
                            if index >= list.len() {
                                list.resize(index + 1, "");
                            }
                            list[index] = val;
                        }
                    }
                },
                Statement::Capability((name, cap)) => {
                    if let Some(existing) = kll.capabilities.get(name) {
                        if *existing != cap {
                            diag.semantic(
                                file,
                                line,
                                format!(
                                    "capability '{}' redeclared with a different signature",
                                    name
                                ),
                            );
                            continue;
                        }
                    }
                    kll.capabilities.insert(name, cap);
                }
                Statement::Keymap(mapping) => {
                    validate_mapping(&mapping, file, line, diag);
                    apply_mapping(&mut kll.keymap, mapping, line, file, true, diag);
                }
                Statement::Position((target, pos)) => match target {
                    PositionTarget::Scancode(code) => {
                        kll.positions
                            .entry(code)
                            .and_modify(|p| p.merge(&pos))
                            .or_insert(pos);
                    }
                    PositionTarget::Pixel(indices) => {
                        for (start, end) in indices {
                            for index in start..=end {
                                kll.pixel_positions
                                    .entry(index)
                                    .and_modify(|p| p.merge(&pos))
                                    .or_insert_with(|| pos.clone());
                            }
                        }
                    }
                },
                Statement::Pixelmap((indices, def)) => {
                    for (start, end) in indices {
                        for index in start..=end {
                            kll.pixelmap.insert(index, def.clone());
                        }
                    }
                }
                Statement::Animation((name, anim)) => {
                    let entry = kll.animations.entry(name).or_default();
                    entry.modifiers.extend(anim.modifiers);
                }
                Statement::Frame((name, indices, frame)) => {
                    let animation = kll.animations.entry(name).or_default();
                    let frames = &mut animation.frames;
                    for (start, end) in indices {
                        for index in start..=end {
                            if frames.len() <= index {
                                frames.resize(index + 1, vec![]);
                            }
                            frames[index] = frame.clone();
                        }
                    }
                }
            }
        }

        kll
    }
}

impl<'a> KllState<'a> {
    pub fn triggers(&self) -> impl Iterator<Item = &Trigger<'a>> + '_ {
        self.keymap
            .values()
            .flat_map(|entry| entry.mapping.0.iter())
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action<'a>> + '_ {
        self.keymap
            .values()
            .flat_map(|entry| entry.mapping.2.iter())
    }

    pub fn scancodes(&self) -> Vec<usize> {
        self.triggers()
            .filter_map(|t| match &t.trigger {
                TriggerType::Key(group) => group.first(),
                _ => None,
            })
            .filter_map(|key| match key {
                Key::Scancode(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    // Variable lookups with type coercion, for emitters and the
    // display-mapping configuration.

    pub fn variable_str(&self, name: &str) -> Option<&str> {
        match self.variables.get(name) {
            Some(Value::Single(val)) => Some(val),
            _ => None,
        }
    }

    pub fn variable_int(&self, name: &str) -> Option<i64> {
        self.variable_str(name)?.parse().ok()
    }

    pub fn variable_f32(&self, name: &str) -> Option<f32> {
        self.variable_str(name)?.parse().ok()
    }

    pub fn variable_bool(&self, name: &str) -> Option<bool> {
        match self.variable_str(name)? {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}
