use pest::error::ErrorVariant;
use pest::Span;
use pest_consume::{match_nodes, Error, Parser};

use crate::hid::{self, HidKind};
use crate::types::*;

pub type PestError = Error<Rule>;
type Result<T> = std::result::Result<T, PestError>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

#[derive(Parser)]
#[grammar = "kll.pest"]
pub struct KLLParser;

pub fn parse_int(s: &str) -> Option<usize> {
    if let Some(hex) = s.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = s.strip_prefix("0b") {
        usize::from_str_radix(bin, 2).ok()
    } else {
        s.parse::<usize>().ok()
    }
}

fn custom_error(span: Span, message: String) -> PestError {
    PestError::new_from_span(ErrorVariant::CustomError { message }, span)
}

fn resolve_hid<'a>(span: Span, kind: HidKind, symbol: &'a str) -> Result<HidId<'a>> {
    match hid::code(kind, symbol) {
        Some(code) => Ok(HidId {
            kind,
            code,
            symbol: Some(symbol),
        }),
        None => Err(custom_error(
            span,
            format!("unknown HID {} usage '{}'", kind, symbol),
        )),
    }
}

fn numeric_hid<'a>(span: Span, kind: HidKind, code: usize) -> Result<HidId<'a>> {
    if hid::valid_code(kind, code as u32) {
        Ok(HidId {
            kind,
            code: code as u16,
            symbol: None,
        })
    } else {
        Err(custom_error(
            span,
            format!("HID {} code 0x{:X} out of range", kind, code),
        ))
    }
}

fn analog_value(span: Span, value: usize) -> Result<u8> {
    if value <= 255 {
        Ok(value as u8)
    } else {
        Err(custom_error(
            span,
            format!("analog value {} out of range 0..=255", value),
        ))
    }
}

/// A name or numeric code inside a bracketed HID group.
enum HidAtom<'a> {
    Name(&'a str),
    Code(usize),
}

impl<'a> HidAtom<'a> {
    fn resolve(&self, span: Span, kind: HidKind) -> Result<Key<'a>> {
        match self {
            HidAtom::Name(name) => Ok(Key::Hid(resolve_hid(span, kind, *name)?)),
            HidAtom::Code(code) => Ok(Key::Hid(numeric_hid(span, kind, *code)?)),
        }
    }
}

struct HidItem<'a> {
    start: HidAtom<'a>,
    end: Option<HidAtom<'a>>,
    schedule: Option<Schedule>,
}

struct ScanItem {
    start: usize,
    end: Option<usize>,
    schedule: Option<Schedule>,
}

/// Build a key group from bracketed items. A schedule is only legal
/// when the bracket holds a single element (it then binds the whole
/// trigger, `S[0x43(P,UP,UR)]` being `S0x43(P,UP,UR)`).
fn assemble_group<'a>(
    span: Span,
    groups: Vec<(KeyGroup<'a>, Option<Schedule>)>,
) -> Result<(KeyGroup<'a>, Option<Schedule>)> {
    if groups.len() == 1 {
        let (group, schedule) = groups.into_iter().next().unwrap();
        return Ok((group, schedule));
    }
    if groups.iter().any(|(_, s)| s.is_some()) {
        return Err(custom_error(
            span,
            "schedule not allowed inside a multi-element group".to_string(),
        ));
    }
    Ok((
        KeyGroup::List(groups.into_iter().map(|(g, _)| g).collect()),
        None,
    ))
}

fn hid_group<'a>(
    span: Span,
    kind: HidKind,
    items: Vec<HidItem<'a>>,
) -> Result<(KeyGroup<'a>, Option<Schedule>)> {
    let mut groups = vec![];
    for item in items {
        let start = item.start.resolve(span, kind)?;
        let group = match item.end {
            Some(end) => {
                let end = end.resolve(span, kind)?;
                if let (Key::Hid(a), Key::Hid(b)) = (&start, &end) {
                    if a.code > b.code {
                        return Err(custom_error(span, "malformed range: start exceeds end".to_string()));
                    }
                }
                KeyGroup::Range(start, end)
            }
            None => KeyGroup::Single(start),
        };
        groups.push((group, item.schedule));
    }
    assemble_group(span, groups)
}

#[pest_consume::parser]
impl KLLParser {
    fn EOI(_input: Node) -> Result<()> {
        Ok(())
    }

    fn number(input: Node) -> Result<usize> {
        parse_int(input.as_str())
            .ok_or_else(|| input.error("numeric literal out of range"))
    }

    fn name(input: Node) -> Result<&str> {
        Ok(input.as_str())
    }

    fn word(input: Node) -> Result<&str> {
        Ok(input.as_str())
    }

    fn string(input: Node) -> Result<&str> {
        Ok(input.as_str().trim_matches('"'))
    }

    fn rawstring(input: Node) -> Result<&str> {
        Ok(input.as_str().trim_matches('\''))
    }

    fn unistring(input: Node) -> Result<&str> {
        let text = input.as_str();
        Ok(&text[2..text.len() - 1])
    }

    fn codepoint(input: Node) -> Result<u32> {
        let digits = input.as_str().trim_start_matches("U+");
        u32::from_str_radix(digits, 16)
            .map_err(|_| input.error("Unicode code point out of range"))
    }

    fn none(_input: Node) -> Result<()> {
        Ok(())
    }

    fn value(input: Node) -> Result<&str> {
        Ok(match_nodes!(input.into_children();
            [string(s)] => s,
            [word(w)] => w,
        ))
    }

    fn value_list(input: Node) -> Result<Vec<&str>> {
        Ok(match_nodes!(input.into_children();
            [value(v)..] => v.collect(),
        ))
    }

    // ----- Schedules -----

    fn time_unit(input: Node) -> Result<TimeUnit> {
        Ok(TimeUnit::from_str(input.as_str()))
    }

    fn timing(input: Node) -> Result<Timing> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [number(amount), time_unit(unit)] => {
                if amount > u32::MAX as usize {
                    Err(custom_error(span, "timing amount out of range".to_string()))
                } else {
                    Ok(Timing { amount: amount as u32, unit })
                }
            }
        )
    }

    fn state_name(input: Node) -> Result<ScheduleState> {
        Ok(ScheduleState::from_str(input.as_str()))
    }

    fn sched_state(input: Node) -> Result<ScheduleParam> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [state_name(state)] => Ok(ScheduleParam { state: Some(state), ..Default::default() }),
            [state_name(state), timing(time)] => Ok(ScheduleParam {
                state: Some(state),
                analog: None,
                time: Some(time),
            }),
            [state_name(state), number(value)] => Ok(ScheduleParam {
                state: Some(state),
                analog: Some(analog_value(span, value)?),
                time: None,
            }),
        )
    }

    fn sched_param(input: Node) -> Result<ScheduleParam> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [timing(time)] => Ok(ScheduleParam { time: Some(time), ..Default::default() }),
            [sched_state(param)] => Ok(param),
            [number(value)] => Ok(ScheduleParam {
                analog: Some(analog_value(span, value)?),
                ..Default::default()
            }),
        )
    }

    fn schedule(input: Node) -> Result<Schedule> {
        Ok(match_nodes!(input.into_children();
            [sched_param(params)..] => Schedule { params: params.collect() },
        ))
    }

    // ----- Id atoms -----

    fn scancode(input: Node) -> Result<usize> {
        Ok(match_nodes!(input.into_children();
            [number(code)] => code,
        ))
    }

    fn usbcode(input: Node) -> Result<Key> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [string(name)] => resolve_hid(span, HidKind::Keyboard, name).map(Key::Hid),
            [number(code)] => numeric_hid(span, HidKind::Keyboard, code).map(Key::Hid),
        )
    }

    fn consumer(input: Node) -> Result<Key> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [string(name)] => resolve_hid(span, HidKind::Consumer, name).map(Key::Hid),
            [number(code)] => numeric_hid(span, HidKind::Consumer, code).map(Key::Hid),
        )
    }

    fn system(input: Node) -> Result<Key> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [string(name)] => resolve_hid(span, HidKind::System, name).map(Key::Hid),
            [number(code)] => numeric_hid(span, HidKind::System, code).map(Key::Hid),
        )
    }

    fn indicator(input: Node) -> Result<Key> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [string(name)] => resolve_hid(span, HidKind::Indicator, name).map(Key::Hid),
            [number(code)] => numeric_hid(span, HidKind::Indicator, code).map(Key::Hid),
        )
    }

    fn locale(input: Node) -> Result<Key> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [string(name)] => resolve_hid(span, HidKind::Locale, name).map(Key::Hid),
            [number(code)] => numeric_hid(span, HidKind::Locale, code).map(Key::Hid),
        )
    }

    fn hid_name(input: Node) -> Result<HidAtom> {
        Ok(match_nodes!(input.into_children();
            [string(name)] => HidAtom::Name(name),
            [number(code)] => HidAtom::Code(code),
        ))
    }

    fn hid_item(input: Node) -> Result<HidItem> {
        Ok(match_nodes!(input.into_children();
            [hid_name(start)] => HidItem { start, end: None, schedule: None },
            [hid_name(start), schedule(s)] => HidItem { start, end: None, schedule: Some(s) },
            [hid_name(start), hid_name(end)] => HidItem { start, end: Some(end), schedule: None },
            [hid_name(start), schedule(s), hid_name(end)] => HidItem {
                start,
                end: Some(end),
                schedule: Some(s),
            },
        ))
    }

    fn scan_item(input: Node) -> Result<ScanItem> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [number(start)] => Ok(ScanItem { start, end: None, schedule: None }),
            [number(start), schedule(s)] => Ok(ScanItem { start, end: None, schedule: Some(s) }),
            [number(start), number(end)] => {
                if start > end {
                    Err(custom_error(span, "malformed range: start exceeds end".to_string()))
                } else {
                    Ok(ScanItem { start, end: Some(end), schedule: None })
                }
            },
            [number(start), schedule(s), number(end)] => {
                if start > end {
                    Err(custom_error(span, "malformed range: start exceeds end".to_string()))
                } else {
                    Ok(ScanItem { start, end: Some(end), schedule: Some(s) })
                }
            },
        )
    }

    fn scan_group(input: Node) -> Result<(KeyGroup, Option<Schedule>)> {
        let span = input.as_span();
        let items: Vec<ScanItem> = match_nodes!(input.into_children();
            [scan_item(items)..] => items.collect(),
        );
        let groups = items
            .into_iter()
            .map(|item| {
                let group = match item.end {
                    Some(end) => {
                        KeyGroup::Range(Key::Scancode(item.start), Key::Scancode(end))
                    }
                    None => KeyGroup::Single(Key::Scancode(item.start)),
                };
                (group, item.schedule)
            })
            .collect();
        assemble_group(span, groups)
    }

    fn usb_group(input: Node) -> Result<(KeyGroup, Option<Schedule>)> {
        let span = input.as_span();
        let items = match_nodes!(input.into_children();
            [hid_item(items)..] => items.collect(),
        );
        hid_group(span, HidKind::Keyboard, items)
    }

    fn cons_group(input: Node) -> Result<(KeyGroup, Option<Schedule>)> {
        let span = input.as_span();
        let items = match_nodes!(input.into_children();
            [hid_item(items)..] => items.collect(),
        );
        hid_group(span, HidKind::Consumer, items)
    }

    fn sys_group(input: Node) -> Result<(KeyGroup, Option<Schedule>)> {
        let span = input.as_span();
        let items = match_nodes!(input.into_children();
            [hid_item(items)..] => items.collect(),
        );
        hid_group(span, HidKind::System, items)
    }

    fn ind_group(input: Node) -> Result<(KeyGroup, Option<Schedule>)> {
        let span = input.as_span();
        let items = match_nodes!(input.into_children();
            [hid_item(items)..] => items.collect(),
        );
        hid_group(span, HidKind::Indicator, items)
    }

    // ----- Structured ids -----

    fn layer_mode(input: Node) -> Result<LayerMode> {
        Ok(LayerMode::from_str(input.as_str()))
    }

    fn index_range(input: Node) -> Result<(usize, usize)> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [number(start)] => Ok((start, start)),
            [number(start), number(end)] => {
                if start > end {
                    Err(custom_error(span, "malformed range: start exceeds end".to_string()))
                } else {
                    Ok((start, end))
                }
            },
        )
    }

    fn indices(input: Node) -> Result<Indices> {
        Ok(match_nodes!(input.into_children();
            [index_range(ranges)..] => ranges.collect(),
        ))
    }

    fn layer(input: Node) -> Result<LayerRef> {
        Ok(match_nodes!(input.into_children();
            [layer_mode(mode), indices(layers)] => LayerRef { mode, layers },
        ))
    }

    fn generic(input: Node) -> Result<TriggerType> {
        Ok(match_nodes!(input.into_children();
            [number(bank), number(index)] => TriggerType::Generic { bank, index, param: None },
            [number(bank), number(index), number(param)] => TriggerType::Generic {
                bank,
                index,
                param: Some(param),
            },
        ))
    }

    fn animref(input: Node) -> Result<&str> {
        Ok(match_nodes!(input.into_children();
            [name(n)] => n,
        ))
    }

    fn animres(input: Node) -> Result<AnimationResult> {
        Ok(match_nodes!(input.into_children();
            [name(n)] => AnimationResult { name: n, args: vec![] },
            [name(n), kvmap(args)] => AnimationResult { name: n, args },
        ))
    }

    // ----- Pixels -----

    fn pixel_addr(input: Node) -> Result<PixelAddr> {
        PixelAddr::from_str(input.as_str())
            .ok_or_else(|| input.error("invalid pixel address"))
    }

    fn pixel_kv(input: Node) -> Result<(Option<&str>, PixelAddr)> {
        Ok(match_nodes!(input.into_children();
            [pixel_addr(addr)] => (None, addr),
            [name(key), pixel_addr(addr)] => (Some(key), addr),
        ))
    }

    fn pixel_pos(input: Node) -> Result<PixelRange> {
        let entries: Vec<(Option<&str>, PixelAddr)> = match_nodes!(input.into_children();
            [pixel_kv(entries)..] => entries.collect(),
        );
        let mut range = PixelRange::default();
        for (key, addr) in entries {
            match key {
                None | Some("i") => range.index = Some(addr),
                Some("r") => range.row = Some(addr),
                Some("c") => range.col = Some(addr),
                Some(_) => {}
            }
        }
        Ok(range)
    }

    fn channel(input: Node) -> Result<PixelColor> {
        PixelColor::from_str(input.as_str())
            .ok_or_else(|| input.error("invalid channel value"))
    }

    fn pixelval(input: Node) -> Result<Pixel> {
        Ok(match_nodes!(input.into_children();
            [pixel_pos(range), channel(values)..] => Pixel {
                range,
                channel_values: values.collect(),
            },
        ))
    }

    fn pixellayer(input: Node) -> Result<Pixel> {
        Ok(match_nodes!(input.into_children();
            [pixel_pos(range)] => Pixel { range, channel_values: vec![] },
            [pixel_pos(range), channel(values)..] => Pixel {
                range,
                channel_values: values.collect(),
            },
        ))
    }

    // ----- Capability invocations -----

    fn call_arg(input: Node) -> Result<&str> {
        Ok(match_nodes!(input.into_children();
            [string(s)] => s,
            [word(w)] => w,
        ))
    }

    fn call_args(input: Node) -> Result<Vec<&str>> {
        Ok(match_nodes!(input.into_children();
            [call_arg(args)..] => args.collect(),
        ))
    }

    fn capcall(input: Node) -> Result<CapabilityCall> {
        Ok(match_nodes!(input.into_children();
            [name(n)] => CapabilityCall { name: n, args: vec![] },
            [name(n), call_args(args)] => CapabilityCall { name: n, args },
        ))
    }

    // ----- Triggers -----

    fn tid(input: Node) -> Result<(TriggerType, Option<Schedule>)> {
        Ok(match_nodes!(input.into_children();
            [scan_group((group, sched))] => (TriggerType::Key(group), sched),
            [scancode(code)] => (TriggerType::Key(KeyGroup::Single(Key::Scancode(code))), None),
            [usb_group((group, sched))] => (TriggerType::Key(group), sched),
            [codepoint(point)] => (TriggerType::Key(KeyGroup::Single(Key::Unicode(point))), None),
            [usbcode(key)] => (TriggerType::Key(KeyGroup::Single(key)), None),
            [cons_group((group, sched))] => (TriggerType::Key(group), sched),
            [consumer(key)] => (TriggerType::Key(KeyGroup::Single(key)), None),
            [sys_group((group, sched))] => (TriggerType::Key(group), sched),
            [system(key)] => (TriggerType::Key(KeyGroup::Single(key)), None),
            [ind_group((group, sched))] => (TriggerType::Key(group), sched),
            [indicator(key)] => (TriggerType::Key(KeyGroup::Single(key)), None),
            [locale(key)] => (TriggerType::Key(KeyGroup::Single(key)), None),
            [layer(layer)] => (TriggerType::Layer(layer), None),
            [generic(trigger)] => (trigger, None),
            [animref(name)] => (TriggerType::Animation(name), None),
            [rawstring(text)] => (TriggerType::Key(KeyGroup::Single(Key::Char(text))), None),
            [unistring(text)] => (TriggerType::Key(KeyGroup::Single(Key::Char(text))), None),
            [none(_)] => (TriggerType::Key(KeyGroup::Single(Key::None)), None),
        ))
    }

    fn trigger(input: Node) -> Result<Trigger> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [tid((trigger, embedded))] => Ok(Trigger { trigger, state: embedded }),
            [tid((trigger, embedded)), schedule(state)] => {
                if embedded.is_some() {
                    Err(custom_error(span, "duplicate schedule on trigger".to_string()))
                } else {
                    Ok(Trigger { trigger, state: Some(state) })
                }
            },
        )
    }

    fn trigger_combo(input: Node) -> Result<Vec<Trigger>> {
        Ok(match_nodes!(input.into_children();
            [trigger(triggers)..] => triggers.collect(),
        ))
    }

    fn trigger_seq(input: Node) -> Result<TriggerList> {
        Ok(match_nodes!(input.into_children();
            [trigger_combo(combos)..] => TriggerList(combos.collect()),
        ))
    }

    // ----- Results -----

    fn rid(input: Node) -> Result<(ResultType, Option<Schedule>)> {
        Ok(match_nodes!(input.into_children();
            [scan_group((group, sched))] => (ResultType::Output(group), sched),
            [scancode(code)] => (ResultType::Output(KeyGroup::Single(Key::Scancode(code))), None),
            [usb_group((group, sched))] => (ResultType::Output(group), sched),
            [codepoint(point)] => (ResultType::Output(KeyGroup::Single(Key::Unicode(point))), None),
            [usbcode(key)] => (ResultType::Output(KeyGroup::Single(key)), None),
            [cons_group((group, sched))] => (ResultType::Output(group), sched),
            [consumer(key)] => (ResultType::Output(KeyGroup::Single(key)), None),
            [sys_group((group, sched))] => (ResultType::Output(group), sched),
            [system(key)] => (ResultType::Output(KeyGroup::Single(key)), None),
            [ind_group((group, sched))] => (ResultType::Output(group), sched),
            [indicator(key)] => (ResultType::Output(KeyGroup::Single(key)), None),
            [locale(key)] => (ResultType::Output(KeyGroup::Single(key)), None),
            [layer(layer)] => (ResultType::Layer(layer), None),
            [animres(anim)] => (ResultType::Animation(anim), None),
            [animref(name)] => (ResultType::Animation(AnimationResult { name, args: vec![] }), None),
            [pixelval(pixel)] => (ResultType::Pixel(pixel), None),
            [pixellayer(pixel)] => (ResultType::PixelLayer(pixel), None),
            [none(_)] => (ResultType::NOP, None),
            [capcall(call)] => (ResultType::Capability(call), None),
            [string(text)] => (ResultType::Text(text), None),
            [unistring(text)] => (ResultType::UnicodeText(text), None),
            [rawstring(text)] => (ResultType::Output(KeyGroup::Single(Key::Char(text))), None),
        ))
    }

    fn result(input: Node) -> Result<Action> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [rid((result, embedded))] => Ok(Action { result, state: embedded }),
            [rid((result, embedded)), schedule(state)] => {
                if embedded.is_some() {
                    Err(custom_error(span, "duplicate schedule on result".to_string()))
                } else {
                    Ok(Action { result, state: Some(state) })
                }
            },
        )
    }

    fn result_combo(input: Node) -> Result<Vec<Action>> {
        Ok(match_nodes!(input.into_children();
            [result(actions)..] => actions.collect(),
        ))
    }

    fn result_seq(input: Node) -> Result<ResultList> {
        Ok(match_nodes!(input.into_children();
            [result_combo(combos)..] => ResultList(combos.collect()),
        ))
    }

    fn binding(input: Node) -> Result<TriggerMode> {
        Ok(TriggerMode::from_str(input.as_str()))
    }

    fn mapping(input: Node) -> Result<Statement> {
        Ok(match_nodes!(input.into_children();
            [trigger_seq(triggers), binding(mode), result_seq(results)] => {
                Statement::Keymap(Mapping(triggers, mode, results))
            },
        ))
    }

    // ----- Assignments and associations -----

    fn kv(input: Node) -> Result<(&str, &str)> {
        Ok(match_nodes!(input.into_children();
            [word(k)] => (k, ""),
            [word(k), word(v)] => (k, v),
        ))
    }

    fn kvmap(input: Node) -> Result<Vec<(&str, &str)>> {
        Ok(match_nodes!(input.into_children();
            [kv(entries)..] => entries.collect(),
        ))
    }

    fn array(input: Node) -> Result<Variable> {
        Ok(match_nodes!(input.into_children();
            [name(n)] => Variable::ArrayWhole(n),
            [name(n), number(index)] => Variable::ArrayElement(n, index),
        ))
    }

    fn property(input: Node) -> Result<Statement> {
        Ok(match_nodes!(input.into_children();
            [array(var), value_list(values)] => Statement::Variable((var, values)),
            [string(name), value_list(values)] => {
                Statement::Variable((Variable::Scalar(name), values))
            },
            [name(name), value_list(values)] => {
                Statement::Variable((Variable::Scalar(name), values))
            },
        ))
    }

    fn cap_arg(input: Node) -> Result<(&str, usize)> {
        Ok(match_nodes!(input.into_children();
            [name(n), number(width)] => (n, width),
        ))
    }

    fn cap_args(input: Node) -> Result<Vec<(&str, usize)>> {
        Ok(match_nodes!(input.into_children();
            [cap_arg(args)..] => args.collect(),
        ))
    }

    fn function(input: Node) -> Result<Capability> {
        Ok(match_nodes!(input.into_children();
            [name(symbol)] => Capability { function: symbol, args: vec![] },
            [name(symbol), cap_args(args)] => Capability { function: symbol, args },
        ))
    }

    fn capability(input: Node) -> Result<Statement> {
        Ok(match_nodes!(input.into_children();
            [name(n), function(f)] => Statement::Capability((n, f)),
        ))
    }

    fn define(input: Node) -> Result<Statement> {
        Ok(match_nodes!(input.into_children();
            [name(n), value(v)] => Statement::Define((n, v)),
        ))
    }

    fn pixel_index(input: Node) -> Result<Indices> {
        Ok(match_nodes!(input.into_children();
            [indices(indices)] => indices,
        ))
    }

    fn position(input: Node) -> Result<Statement> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [pixel_index(indices), kvmap(map)] => {
                Position::from_map(&map)
                    .map(|pos| Statement::Position((PositionTarget::Pixel(indices), pos)))
                    .map_err(|msg| custom_error(span, msg))
            },
            [scancode(code), kvmap(map)] => {
                Position::from_map(&map)
                    .map(|pos| Statement::Position((PositionTarget::Scancode(code), pos)))
                    .map_err(|msg| custom_error(span, msg))
            },
        )
    }

    fn pixel_channels(input: Node) -> Result<(Indices, Vec<(usize, usize)>)> {
        let span = input.as_span();
        match_nodes!(input.into_children();
            [indices(indices), kvmap(map)] => {
                let mut channels = vec![];
                for (channel, width) in map {
                    match (parse_int(channel), parse_int(width)) {
                        (Some(c), Some(w)) => channels.push((c, w)),
                        _ => {
                            return Err(custom_error(
                                span,
                                format!("invalid pixel channel '{}:{}'", channel, width),
                            ))
                        }
                    }
                }
                Ok((indices, channels))
            },
        )
    }

    fn pixelmap(input: Node) -> Result<Statement> {
        Ok(match_nodes!(input.into_children();
            [pixel_channels((indices, channels)), scancode(code)] => Statement::Pixelmap((
                indices,
                PixelDef { channels, scancode: Some(code) },
            )),
            [pixel_channels((indices, channels)), none(_)] => Statement::Pixelmap((
                indices,
                PixelDef { channels, scancode: None },
            )),
        ))
    }

    fn animdef(input: Node) -> Result<Statement> {
        Ok(match_nodes!(input.into_children();
            [name(n), kvmap(modifiers)] => Statement::Animation((
                n,
                Animation {
                    modifiers: modifiers.into_iter().collect(),
                    frames: vec![],
                },
            )),
        ))
    }

    fn animframe(input: Node) -> Result<Statement> {
        Ok(match_nodes!(input.into_children();
            [name(n), indices(indices), pixelval(pixels)..] => {
                Statement::Frame((n, indices, pixels.collect()))
            },
        ))
    }

    fn statement(input: Node) -> Result<(usize, Statement)> {
        let line = input.as_span().start_pos().line_col().0;
        let statement = match_nodes!(input.into_children();
            [capability(s)] => s,
            [define(s)] => s,
            [position(s)] => s,
            [pixelmap(s)] => s,
            [animdef(s)] => s,
            [animframe(s)] => s,
            [mapping(s)] => s,
            [property(s)] => s,
        );
        Ok((line, statement))
    }

    pub fn file(input: Node) -> Result<Vec<(usize, Statement)>> {
        Ok(match_nodes!(input.into_children();
            [statement(statements).., _] => statements.collect(),
        ))
    }
}

impl<'a> KllFile<'a> {
    pub fn from_str(text: &str) -> Result<KllFile> {
        let inputs = KLLParser::parse(Rule::file, text)?;
        let input = inputs.single()?;

        let kll = KllFile {
            statements: KLLParser::file(input)?,
        };

        Ok(kll)
    }
}
