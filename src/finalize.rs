//! Finalization: MergeContext -> FinalData.
//!
//! Expands symbolic ranges, assigns dense trigger/result macro
//! indices in first-appearance order, builds the per-layer scancode
//! lookup, the dense pixel map and the display-mapping grid. The
//! MergeContext is never mutated.

use crate::context::{Keymap, MappingEntry};
use crate::error::{Diagnostics, Error};
use crate::hid::{self, HidKind};
use crate::merge::MergeContext;
use crate::types::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// KLL language revision implemented by the grammar.
pub const KLL_VERSION: &str = "0.5.7";

/// Guard against runaway (or overflowing) range expressions.
const MAX_RANGE_EXPANSION: usize = 4096;

const DEFAULT_PITCH_MM: f32 = 19.05;

#[derive(Debug, Clone, Serialize)]
pub struct IdRepr {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerMacro {
    pub index: usize,
    pub text: String,
    pub combos: Vec<Vec<IdRepr>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultMacro {
    pub index: usize,
    pub text: String,
    pub combos: Vec<Vec<IdRepr>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapArg {
    pub name: String,
    pub width: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalCapability {
    pub index: usize,
    pub name: String,
    pub function: String,
    pub args: Vec<CapArg>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalLayer {
    pub index: usize,
    /// (trigger macro index, result macro index) pairs
    pub trigger_results: Vec<(usize, usize)>,
    /// Scan code -> trigger macro indices opening with it
    pub scancode_map: BTreeMap<usize, Vec<usize>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum PixelMapEntry {
    Pixel {
        index: usize,
        channels: Vec<(usize, usize)>,
        scancode: Option<usize>,
    },
    Blank {
        index: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalAnimation {
    pub index: usize,
    pub name: String,
    pub settings: Vec<(String, String)>,
    pub frames: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalPosition {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalData {
    pub layers: Vec<FinalLayer>,
    pub trigger_macros: Vec<TriggerMacro>,
    pub result_macros: Vec<ResultMacro>,
    pub capabilities: Vec<FinalCapability>,
    pub pixel_mapping: Vec<PixelMapEntry>,
    pub pixel_display_mapping: Vec<Vec<usize>>,
    pub animations: Vec<FinalAnimation>,
    pub scancode_positions: Vec<FinalPosition>,
    pub pixel_positions: Vec<FinalPosition>,
    pub kll_version: String,
    pub compiler_version: String,
}

// ----- Id representations -----

fn key_repr(key: &Key) -> IdRepr {
    match key {
        Key::Scancode(code) => IdRepr {
            kind: "ScanCode",
            code: Some(*code as u32),
            name: None,
            schedule: None,
        },
        Key::Hid(id) => IdRepr {
            kind: match id.kind {
                HidKind::Keyboard => "UsbCode",
                HidKind::Consumer => "ConsumerCode",
                HidKind::System => "SystemCode",
                HidKind::Indicator => "Indicator",
                HidKind::Locale => "Locale",
            },
            code: Some(id.code as u32),
            name: hid::name(id.kind, id.code).map(|n| n.to_string()),
            schedule: None,
        },
        Key::Char(text) => IdRepr {
            kind: "Character",
            code: None,
            name: Some(text.to_string()),
            schedule: None,
        },
        Key::Unicode(point) => IdRepr {
            kind: "UnicodeCodePoint",
            code: Some(*point),
            name: None,
            schedule: None,
        },
        Key::None => IdRepr {
            kind: "None",
            code: None,
            name: None,
            schedule: None,
        },
    }
}

fn group_repr(group: &KeyGroup) -> IdRepr {
    match group {
        KeyGroup::Single(key) => key_repr(key),
        other => IdRepr {
            kind: "Range",
            code: None,
            name: Some(other.to_string()),
            schedule: None,
        },
    }
}

fn named_repr(kind: &'static str, name: String) -> IdRepr {
    IdRepr {
        kind,
        code: None,
        name: Some(name),
        schedule: None,
    }
}

fn trigger_repr(trigger: &Trigger) -> IdRepr {
    let mut repr = match &trigger.trigger {
        TriggerType::Key(group) => group_repr(group),
        TriggerType::Layer(layer) => named_repr("Layer", layer.to_string()),
        TriggerType::Generic { .. } => named_repr("GenericTrigger", trigger.trigger.to_string()),
        TriggerType::Animation(name) => named_repr("Animation", name.to_string()),
    };
    repr.schedule = trigger.state.as_ref().map(|s| s.to_string());
    repr
}

fn action_repr(action: &Action) -> IdRepr {
    let mut repr = match &action.result {
        ResultType::Output(group) => group_repr(group),
        ResultType::Layer(layer) => named_repr("Layer", layer.to_string()),
        ResultType::Animation(anim) => named_repr("Animation", anim.to_string()),
        ResultType::Pixel(pixel) => named_repr("Pixel", pixel.to_string()),
        ResultType::PixelLayer(_) => named_repr("PixelLayer", action.result.to_string()),
        ResultType::Capability(call) => named_repr("Capability", call.to_string()),
        ResultType::Text(text) => named_repr("Text", text.to_string()),
        ResultType::UnicodeText(text) => named_repr("UnicodeText", text.to_string()),
        ResultType::NOP => IdRepr {
            kind: "None",
            code: None,
            name: None,
            schedule: None,
        },
    };
    repr.schedule = action.state.as_ref().map(|s| s.to_string());
    repr
}

fn trigger_combos_repr(list: &TriggerList) -> Vec<Vec<IdRepr>> {
    list.0
        .iter()
        .map(|combo| combo.iter().map(trigger_repr).collect())
        .collect()
}

fn result_combos_repr(list: &ResultList) -> Vec<Vec<IdRepr>> {
    list.0
        .iter()
        .map(|combo| combo.iter().map(action_repr).collect())
        .collect()
}

// ----- Range expansion -----

fn group_expands(group: &KeyGroup) -> bool {
    matches!(group, KeyGroup::Range(..) | KeyGroup::List(_))
}

fn enumerate_group<'a>(
    group: &KeyGroup<'a>,
    file: &str,
    line: usize,
) -> Result<Vec<Key<'a>>, Error> {
    let overflow = |count: usize| Error::Semantic {
        file: file.to_string(),
        line,
        message: format!(
            "range expands to {} ids, more than the {} allowed",
            count, MAX_RANGE_EXPANSION
        ),
    };
    match group {
        KeyGroup::Single(key) => Ok(vec![key.clone()]),
        KeyGroup::Range(start, end) => match (start, end) {
            (Key::Scancode(s), Key::Scancode(e)) => {
                let count = e - s + 1;
                if count > MAX_RANGE_EXPANSION {
                    return Err(overflow(count));
                }
                Ok((*s..=*e).map(Key::Scancode).collect())
            }
            (Key::Hid(a), Key::Hid(b)) if a.kind == b.kind => {
                let count = (b.code - a.code) as usize + 1;
                if count > MAX_RANGE_EXPANSION {
                    return Err(overflow(count));
                }
                Ok((a.code..=b.code)
                    .map(|code| {
                        Key::Hid(HidId {
                            kind: a.kind,
                            code,
                            symbol: None,
                        })
                    })
                    .collect())
            }
            _ => Err(Error::Semantic {
                file: file.to_string(),
                line,
                message: "range endpoints are of differing kinds".to_string(),
            }),
        },
        KeyGroup::List(groups) => {
            let mut keys = vec![];
            for group in groups {
                keys.extend(enumerate_group(group, file, line)?);
            }
            if keys.len() > MAX_RANGE_EXPANSION {
                return Err(overflow(keys.len()));
            }
            Ok(keys)
        }
    }
}

/// Positions of expanding elements: (combo index, element index).
fn trigger_expansion_points(list: &TriggerList) -> Vec<(usize, usize)> {
    let mut points = vec![];
    for (ci, combo) in list.0.iter().enumerate() {
        for (ei, trigger) in combo.iter().enumerate() {
            if let TriggerType::Key(group) = &trigger.trigger {
                if group_expands(group) {
                    points.push((ci, ei));
                }
            }
        }
    }
    points
}

fn result_expansion_points(list: &ResultList) -> Vec<(usize, usize)> {
    let mut points = vec![];
    for (ci, combo) in list.0.iter().enumerate() {
        for (ei, action) in combo.iter().enumerate() {
            if let ResultType::Output(group) = &action.result {
                if group_expands(group) {
                    points.push((ci, ei));
                }
            }
        }
    }
    points
}

/// Expand one mapping into its enumerated forms. A single trigger
/// range zips pairwise with a single result range of equal length;
/// any other result is repeated per expanded trigger.
fn expand_entry<'a>(entry: &MappingEntry<'a>) -> Result<Vec<Mapping<'a>>, Error> {
    let mapping = &entry.mapping;
    let tpoints = trigger_expansion_points(&mapping.0);
    let rpoints = result_expansion_points(&mapping.2);

    if tpoints.is_empty() {
        if !rpoints.is_empty() {
            return Err(Error::Semantic {
                file: entry.file.clone(),
                line: entry.line,
                message: "result range without a matching trigger range".to_string(),
            });
        }
        return Ok(vec![mapping.clone()]);
    }

    let expansions: Vec<Vec<Key>> = tpoints
        .iter()
        .map(|(ci, ei)| {
            let trigger = &mapping.0 .0[*ci][*ei];
            match &trigger.trigger {
                TriggerType::Key(group) => enumerate_group(group, &entry.file, entry.line),
                _ => unreachable!(),
            }
        })
        .collect::<Result<_, _>>()?;

    // Pairwise form: one trigger range, one result range, equal length
    if tpoints.len() == 1 && rpoints.len() == 1 {
        let (rci, rei) = rpoints[0];
        let raction = &mapping.2 .0[rci][rei];
        let rkeys = match &raction.result {
            ResultType::Output(group) => enumerate_group(group, &entry.file, entry.line)?,
            _ => unreachable!(),
        };
        if rkeys.len() != expansions[0].len() {
            return Err(Error::Semantic {
                file: entry.file.clone(),
                line: entry.line,
                message: format!(
                    "trigger range expands to {} ids but result range to {}",
                    expansions[0].len(),
                    rkeys.len()
                ),
            });
        }
        let (tci, tei) = tpoints[0];
        let mut out = vec![];
        for (tkey, rkey) in expansions[0].iter().zip(rkeys) {
            let mut mapping = mapping.clone();
            mapping.0 .0[tci][tei].trigger = TriggerType::Key(KeyGroup::Single(tkey.clone()));
            mapping.2 .0[rci][rei].result = ResultType::Output(KeyGroup::Single(rkey));
            out.push(mapping);
        }
        return Ok(out);
    }

    if !rpoints.is_empty() {
        return Err(Error::Semantic {
            file: entry.file.clone(),
            line: entry.line,
            message: "result ranges only pair with a single trigger range".to_string(),
        });
    }

    // Cartesian product over all trigger expansion points
    let total: usize = expansions.iter().map(|e| e.len()).product();
    if total > MAX_RANGE_EXPANSION {
        return Err(Error::Semantic {
            file: entry.file.clone(),
            line: entry.line,
            message: format!(
                "ranges expand to {} combinations, more than the {} allowed",
                total, MAX_RANGE_EXPANSION
            ),
        });
    }
    let mut out = vec![];
    let mut odometer = vec![0usize; tpoints.len()];
    loop {
        let mut mapping = mapping.clone();
        for (point, (ci, ei)) in tpoints.iter().enumerate() {
            let key = expansions[point][odometer[point]].clone();
            mapping.0 .0[*ci][*ei].trigger = TriggerType::Key(KeyGroup::Single(key));
        }
        out.push(mapping);

        let mut digit = tpoints.len();
        loop {
            if digit == 0 {
                return Ok(out);
            }
            digit -= 1;
            odometer[digit] += 1;
            if odometer[digit] < expansions[digit].len() {
                break;
            }
            odometer[digit] = 0;
        }
    }
}

/// Expand a layer's keymap. Explicit mappings win over range-generated
/// ones; two ranges generating the same trigger key are a hard error.
fn expand_layer<'a>(
    keymap: &Keymap<'a>,
    diag: &mut Diagnostics,
) -> Result<Vec<Mapping<'a>>, Error> {
    let mut explicit: HashSet<String> = HashSet::new();
    for (key, entry) in keymap {
        if !entry.mapping.1.is_remove() && trigger_expansion_points(&entry.mapping.0).is_empty() {
            explicit.insert(key.clone());
        }
    }

    let mut produced: HashMap<String, String> = HashMap::new();
    let mut out = vec![];
    for (key, entry) in keymap {
        if entry.mapping.1.is_remove() {
            diag.warn(
                &entry.file,
                entry.line,
                format!("removal from undefined mapping '{}' ignored", key),
            );
            continue;
        }
        if trigger_expansion_points(&entry.mapping.0).is_empty() {
            out.push(entry.mapping.clone());
            continue;
        }
        for mapping in expand_entry(entry)? {
            let expanded_key = mapping.0.key();
            if explicit.contains(&expanded_key) {
                continue;
            }
            if let Some(origin) = produced.get(&expanded_key) {
                return Err(Error::Semantic {
                    file: entry.file.clone(),
                    line: entry.line,
                    message: format!(
                        "range expansion for '{}' collides with the range at {}",
                        expanded_key, origin
                    ),
                });
            }
            produced.insert(expanded_key, format!("{}:{}", entry.file, entry.line));
            out.push(mapping);
        }
    }
    Ok(out)
}

fn first_trigger_scancode(list: &TriggerList) -> Option<usize> {
    let combo = list.0.first()?;
    let trigger = combo.first()?;
    match &trigger.trigger {
        TriggerType::Key(group) => match group.first() {
            Some(Key::Scancode(code)) => Some(*code),
            _ => None,
        },
        _ => None,
    }
}

// ----- Finalization driver -----

pub fn finalize(mc: &MergeContext, diag: &mut Diagnostics) -> Result<FinalData, Error> {
    let mut data = FinalData {
        kll_version: KLL_VERSION.to_string(),
        compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        ..Default::default()
    };

    // Trigger and result macro deduplication
    let mut trigger_index: HashMap<String, usize> = HashMap::new();
    let mut result_index: HashMap<String, usize> = HashMap::new();

    let layer_maps: Vec<&Keymap> = std::iter::once(&mc.globals.keymap)
        .chain(mc.partials.iter())
        .collect();

    for (layer_no, keymap) in layer_maps.into_iter().enumerate() {
        let expanded = expand_layer(keymap, diag)?;
        let mut layer = FinalLayer {
            index: layer_no,
            trigger_results: vec![],
            scancode_map: BTreeMap::new(),
        };
        for mapping in expanded {
            let tkey = mapping.0.key();
            let tpos = match trigger_index.get(&tkey) {
                Some(pos) => *pos,
                None => {
                    let pos = data.trigger_macros.len();
                    trigger_index.insert(tkey.clone(), pos);
                    data.trigger_macros.push(TriggerMacro {
                        index: pos,
                        text: tkey.clone(),
                        combos: trigger_combos_repr(&mapping.0),
                    });
                    pos
                }
            };

            let rtext = mapping.2.to_string();
            let rpos = match result_index.get(&rtext) {
                Some(pos) => *pos,
                None => {
                    let pos = data.result_macros.len();
                    result_index.insert(rtext.clone(), pos);
                    data.result_macros.push(ResultMacro {
                        index: pos,
                        text: rtext,
                        combos: result_combos_repr(&mapping.2),
                    });
                    pos
                }
            };

            layer.trigger_results.push((tpos, rpos));
            if let Some(code) = first_trigger_scancode(&mapping.0) {
                if code > 0xFFFF {
                    return Err(Error::Finalization(format!(
                        "scan code 0x{:X} out of range",
                        code
                    )));
                }
                layer.scancode_map.entry(code).or_default().push(tpos);
            }
        }
        data.layers.push(layer);
    }

    // Capabilities, in declaration order
    for (pos, (name, cap)) in mc.globals.capabilities.iter().enumerate() {
        data.capabilities.push(FinalCapability {
            index: pos,
            name: name.to_string(),
            function: cap.function.to_string(),
            args: cap
                .args
                .iter()
                .map(|(name, width)| CapArg {
                    name: name.to_string(),
                    width: *width,
                })
                .collect(),
        });
    }

    // Dense pixel map with explicit blanks
    if mc.globals.pixelmap.contains_key(&0) {
        return Err(Error::Finalization(
            "pixel index 0 out of range (pixel indices start at 1)".to_string(),
        ));
    }
    let max_pixel = mc.globals.pixelmap.keys().max().copied().unwrap_or(0);
    for index in 1..=max_pixel {
        match mc.globals.pixelmap.get(&index) {
            Some(def) => data.pixel_mapping.push(PixelMapEntry::Pixel {
                index,
                channels: def.channels.clone(),
                scancode: def.scancode,
            }),
            None => data.pixel_mapping.push(PixelMapEntry::Blank { index }),
        }
    }

    // Display mapping grid from physical pixel positions
    let pitch_x = mc
        .globals
        .variable_f32("Pixel_DisplayMapping_UnitWidth")
        .unwrap_or(DEFAULT_PITCH_MM);
    let pitch_y = mc
        .globals
        .variable_f32("Pixel_DisplayMapping_UnitHeight")
        .unwrap_or(DEFAULT_PITCH_MM);
    if pitch_x > 0.0 && pitch_y > 0.0 && !mc.globals.pixel_positions.is_empty() {
        let mut cells = vec![];
        for (index, pos) in &mc.globals.pixel_positions {
            let col = (pos.x.unwrap_or(0.0) / pitch_x).round().max(0.0) as usize;
            let row = (pos.y.unwrap_or(0.0) / pitch_y).round().max(0.0) as usize;
            cells.push((row, col, *index));
        }
        let rows = cells.iter().map(|(r, _, _)| *r).max().unwrap_or(0) + 1;
        let cols = cells.iter().map(|(_, c, _)| *c).max().unwrap_or(0) + 1;
        let mut grid = vec![vec![0usize; cols]; rows];
        for (row, col, index) in cells {
            if grid[row][col] != 0 {
                log::warn!(
                    "pixel {} displaces pixel {} in display mapping cell ({}, {})",
                    index,
                    grid[row][col],
                    row,
                    col
                );
            }
            grid[row][col] = index;
        }
        data.pixel_display_mapping = grid;
    }

    // Physical positions in ascending index order; unset axes emit 0
    let final_position = |(index, pos): (usize, &Position)| FinalPosition {
        index,
        x: pos.x.unwrap_or(0.0),
        y: pos.y.unwrap_or(0.0),
        z: pos.z.unwrap_or(0.0),
        rx: pos.rx.unwrap_or(0.0),
        ry: pos.ry.unwrap_or(0.0),
        rz: pos.rz.unwrap_or(0.0),
    };
    data.scancode_positions = mc
        .globals
        .positions
        .iter()
        .map(|(i, p)| (*i, p))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(final_position)
        .collect();
    data.pixel_positions = mc
        .globals
        .pixel_positions
        .iter()
        .map(|(i, p)| (*i, p))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(final_position)
        .collect();

    // Animations in declaration order
    for (pos, (name, anim)) in mc.globals.animations.iter().enumerate() {
        data.animations.push(FinalAnimation {
            index: pos,
            name: name.to_string(),
            settings: anim
                .modifiers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            frames: anim
                .frames
                .iter()
                .map(|frame| frame.iter().map(|p| p.to_string()).collect())
                .collect(),
        });
    }

    Ok(data)
}
