use crate::hid::{self, HidKind};
use indexmap::IndexMap;
use std::fmt;

/// Inclusive index ranges, e.g. `P[1,3-5]`.
pub type Indices = Vec<(usize, usize)>;

pub fn format_indices(ranges: &Indices) -> String {
    ranges
        .iter()
        .map(|(start, end)| {
            if start == end {
                format!("{}", start)
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn maybe_quote(text: &str) -> String {
    if text.contains(' ') || text.is_empty() {
        format!("\"{}\"", text)
    } else {
        text.to_string()
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct HidId<'a> {
    pub kind: HidKind,
    pub code: u16,
    /// Name as written in the source; canonical form prefers the table name.
    pub symbol: Option<&'a str>,
}

impl<'a> fmt::Display for HidId<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match hid::name(self.kind, self.code) {
            Some(name) => write!(f, "{}\"{}\"", self.kind.prefix(), name),
            None => write!(f, "{}0x{:02X}", self.kind.prefix(), self.code),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Key<'a> {
    Scancode(usize),
    Hid(HidId<'a>),
    Char(&'a str),
    Unicode(u32),
    None,
}

impl<'a> Key<'a> {
    /// Namespace prefix for bracketed (range/list) forms.
    pub fn prefix(&self) -> &'static str {
        match self {
            Key::Scancode(_) => "S",
            Key::Hid(id) => id.kind.prefix(),
            Key::Char(_) => "",
            Key::Unicode(_) => "",
            Key::None => "",
        }
    }

    /// Body without the namespace prefix, used inside brackets.
    pub fn body(&self) -> String {
        match self {
            Key::Scancode(num) => format!("0x{:02X}", num),
            Key::Hid(id) => match hid::name(id.kind, id.code) {
                Some(name) => format!("\"{}\"", name),
                None => format!("0x{:02X}", id.code),
            },
            Key::Char(text) => format!("'{}'", text),
            Key::Unicode(point) => format!("U+{:04X}", point),
            Key::None => "None".to_string(),
        }
    }
}

impl<'a> fmt::Display for Key<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Scancode(num) => write!(f, "S0x{:02X}", num),
            Key::Hid(id) => write!(f, "{}", id),
            Key::Char(text) => write!(f, "'{}'", text),
            Key::Unicode(point) => write!(f, "U+{:04X}", point),
            Key::None => write!(f, "None"),
        }
    }
}

/// A single id, a symbolic range, or a bracketed list of either.
/// Ranges survive merge untouched and expand during finalization.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum KeyGroup<'a> {
    Single(Key<'a>),
    Range(Key<'a>, Key<'a>),
    List(Vec<KeyGroup<'a>>),
}

impl<'a> KeyGroup<'a> {
    pub fn first(&self) -> Option<&Key<'a>> {
        match self {
            KeyGroup::Single(key) => Some(key),
            KeyGroup::Range(start, _) => Some(start),
            KeyGroup::List(groups) => groups.first().and_then(|g| g.first()),
        }
    }

    fn body(&self) -> String {
        match self {
            KeyGroup::Single(key) => key.body(),
            KeyGroup::Range(start, end) => format!("{}-{}", start.body(), end.body()),
            KeyGroup::List(groups) => groups
                .iter()
                .map(|g| g.body())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl<'a> fmt::Display for KeyGroup<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyGroup::Single(key) => write!(f, "{}", key),
            other => {
                let prefix = other.first().map(|k| k.prefix()).unwrap_or_default();
                write!(f, "{}[{}]", prefix, other.body())
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ScheduleState {
    Press,         // P
    Hold,          // H
    Release,       // R
    Off,           // O
    UniquePress,   // UP
    UniqueRelease, // UR
    Depress,       // D
    Activate,      // A
}

impl ScheduleState {
    pub fn from_str(s: &str) -> Self {
        match s {
            "P" => Self::Press,
            "H" => Self::Hold,
            "R" => Self::Release,
            "O" => Self::Off,
            "UP" => Self::UniquePress,
            "UR" => Self::UniqueRelease,
            "D" => Self::Depress,
            "A" => Self::Activate,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Press => write!(f, "P"),
            Self::Hold => write!(f, "H"),
            Self::Release => write!(f, "R"),
            Self::Off => write!(f, "O"),
            Self::UniquePress => write!(f, "UP"),
            Self::UniqueRelease => write!(f, "UR"),
            Self::Depress => write!(f, "D"),
            Self::Activate => write!(f, "A"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    pub fn from_str(s: &str) -> Self {
        match s {
            "s" => Self::Seconds,
            "ms" => Self::Milliseconds,
            "us" => Self::Microseconds,
            "ns" => Self::Nanoseconds,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds => write!(f, "s"),
            Self::Milliseconds => write!(f, "ms"),
            Self::Microseconds => write!(f, "us"),
            Self::Nanoseconds => write!(f, "ns"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Timing {
    pub amount: u32,
    pub unit: TimeUnit,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

/// One schedule parameter: a state with an optional analog value or
/// timing, a bare timing (implicit state), or a bare analog value.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct ScheduleParam {
    pub state: Option<ScheduleState>,
    pub analog: Option<u8>,
    pub time: Option<Timing>,
}

impl fmt::Display for ScheduleParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(state) = &self.state {
            write!(f, "{}", state)?;
            if let Some(analog) = &self.analog {
                write!(f, ":{}", analog)?;
            } else if let Some(time) = &self.time {
                write!(f, ":{}", time)?;
            }
            Ok(())
        } else if let Some(time) = &self.time {
            write!(f, "{}", time)
        } else if let Some(analog) = &self.analog {
            write!(f, "{}", analog)
        } else {
            Ok(())
        }
    }
}

/// An empty schedule (`()`) is an implicit press; an absent schedule
/// (`Option::None` on the owner) matches any activation.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct Schedule {
    pub params: Vec<ScheduleParam>,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.params
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(",")
        )
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum LayerMode {
    Normal,
    Shift,
    Latch,
    Lock,
}

impl LayerMode {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Layer" => Self::Normal,
            "LayerShift" => Self::Shift,
            "LayerLatch" => Self::Latch,
            "LayerLock" => Self::Lock,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for LayerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Layer"),
            Self::Shift => write!(f, "LayerShift"),
            Self::Latch => write!(f, "LayerLatch"),
            Self::Lock => write!(f, "LayerLock"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct LayerRef {
    pub mode: LayerMode,
    pub layers: Indices,
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.mode, format_indices(&self.layers))
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum TriggerType<'a> {
    Key(KeyGroup<'a>),
    Layer(LayerRef),
    Generic {
        bank: usize,
        index: usize,
        param: Option<usize>,
    },
    Animation(&'a str),
}

impl<'a> fmt::Display for TriggerType<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(group) => write!(f, "{}", group),
            Self::Layer(layer) => write!(f, "{}", layer),
            Self::Generic { bank, index, param } => {
                if let Some(param) = param {
                    write!(f, "T[{}, {}]({})", bank, index, param)
                } else {
                    write!(f, "T[{}, {}]", bank, index)
                }
            }
            Self::Animation(name) => write!(f, "A[{}]", name),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Trigger<'a> {
    pub trigger: TriggerType<'a>,
    pub state: Option<Schedule>,
}

impl<'a> fmt::Display for Trigger<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(state) = &self.state {
            write!(f, "{}({})", self.trigger, state)
        } else {
            write!(f, "{}", self.trigger)
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Capability<'a> {
    pub function: &'a str,
    pub args: Vec<(&'a str, usize)>,
}

impl<'a> fmt::Display for Capability<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.function,
            self.args
                .iter()
                .map(|(name, width)| format!("{}:{}", name, width))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct CapabilityCall<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

impl<'a> fmt::Display for CapabilityCall<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(", "))
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct AnimationResult<'a> {
    pub name: &'a str,
    pub args: Vec<(&'a str, &'a str)>,
}

impl<'a> fmt::Display for AnimationResult<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "A[{}]", self.name)
        } else {
            write!(
                f,
                "A[{}]({})",
                self.name,
                self.args
                    .iter()
                    .map(|(k, v)| {
                        if v.is_empty() {
                            k.to_string()
                        } else {
                            format!("{}:{}", k, v)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum PixelAddr {
    Absolute(usize),
    RelativeInt(isize),
    RelativePercent(isize),
}

impl PixelAddr {
    pub fn from_str(s: &str) -> Option<PixelAddr> {
        let (body, percent) = match s.strip_suffix('%') {
            Some(body) => (body, true),
            None => (s, false),
        };
        let relative = body.starts_with('+') || body.starts_with('-');
        if percent {
            Some(PixelAddr::RelativePercent(body.parse().ok()?))
        } else if relative {
            Some(PixelAddr::RelativeInt(body.parse().ok()?))
        } else {
            Some(PixelAddr::Absolute(body.parse().ok()?))
        }
    }
}

impl fmt::Display for PixelAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(v) => write!(f, "{}", v),
            Self::RelativeInt(v) => write!(f, "{:+}", v),
            Self::RelativePercent(v) => write!(f, "{:+}%", v),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct PixelRange {
    pub index: Option<PixelAddr>,
    pub row: Option<PixelAddr>,
    pub col: Option<PixelAddr>,
}

impl fmt::Display for PixelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![];
        if let Some(index) = &self.index {
            parts.push(index.to_string());
        }
        if let Some(row) = &self.row {
            parts.push(format!("r:{}", row));
        }
        if let Some(col) = &self.col {
            parts.push(format!("c:{}", col));
        }
        write!(f, "{}", parts.join(","))
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum PixelColor {
    Rgb(usize),
    Relative(isize),
    RelativeNoRoll(isize),
    Shift(isize),
}

impl PixelColor {
    pub fn from_str(s: &str) -> Option<PixelColor> {
        if let Some(body) = s.strip_prefix(':') {
            Some(PixelColor::RelativeNoRoll(body.parse().ok()?))
        } else if let Some(body) = s.strip_prefix('<') {
            Some(PixelColor::Shift(body.parse().ok()?))
        } else if s.starts_with('+') || s.starts_with('-') {
            Some(PixelColor::Relative(s.parse().ok()?))
        } else {
            Some(PixelColor::Rgb(s.parse().ok()?))
        }
    }
}

impl fmt::Display for PixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(v) => write!(f, "{}", v),
            Self::Relative(v) => write!(f, "{:+}", v),
            Self::RelativeNoRoll(v) => write!(f, ":{:+}", v),
            Self::Shift(v) => write!(f, "<{:+}", v),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct Pixel {
    pub range: PixelRange,
    pub channel_values: Vec<PixelColor>,
}

impl Pixel {
    pub fn channels_string(&self) -> String {
        self.channel_values
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P[{}]({})", self.range, self.channels_string())
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum ResultType<'a> {
    Output(KeyGroup<'a>),
    Layer(LayerRef),
    Animation(AnimationResult<'a>),
    Pixel(Pixel),
    PixelLayer(Pixel),
    Capability(CapabilityCall<'a>),
    Text(&'a str),
    UnicodeText(&'a str),
    NOP,
}

impl<'a> fmt::Display for ResultType<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(group) => write!(f, "{}", group),
            Self::Layer(layer) => write!(f, "{}", layer),
            Self::Animation(anim) => write!(f, "{}", anim),
            Self::Pixel(pixel) => write!(f, "{}", pixel),
            Self::PixelLayer(pixel) => {
                write!(f, "PL[{}]({})", pixel.range, pixel.channels_string())
            }
            Self::Capability(call) => write!(f, "{}", call),
            Self::Text(text) => write!(f, "\"{}\"", text),
            Self::UnicodeText(text) => write!(f, "u'{}'", text),
            Self::NOP => write!(f, "None"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Action<'a> {
    pub result: ResultType<'a>,
    pub state: Option<Schedule>,
}

impl<'a> fmt::Display for Action<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(state) = &self.state {
            write!(f, "{}({})", self.result, state)
        } else {
            write!(f, "{}", self.result)
        }
    }
}

fn canonical_combo<T: fmt::Display>(combo: &[T]) -> String {
    let mut parts: Vec<String> = combo.iter().map(|t| t.to_string()).collect();
    parts.sort_by(|a, b| alphanumeric_sort::compare_str(a, b));
    parts.join(" + ")
}

/// Sequence of combos on the trigger side of a mapping.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct TriggerList<'a>(pub Vec<Vec<Trigger<'a>>>);

impl<'a> TriggerList<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &Trigger<'a>> + '_ {
        self.0.iter().flatten()
    }

    /// Canonical trigger key; mapping collision is key equality.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl<'a> fmt::Display for TriggerList<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|combo| canonical_combo(combo))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct ResultList<'a>(pub Vec<Vec<Action<'a>>>);

impl<'a> ResultList<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &Action<'a>> + '_ {
        self.0.iter().flatten()
    }
}

impl<'a> fmt::Display for ResultList<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|combo| canonical_combo(combo))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TriggerMode {
    Replace,          // :
    Isolate,          // ::
    Add,              // :+
    Remove,           // :-
    Set,              // =
    IndicatorReplace, // i:
    IndicatorIsolate, // i::
    IndicatorAdd,     // i:+
    IndicatorRemove,  // i:-
}

impl TriggerMode {
    pub fn from_str(s: &str) -> Self {
        match s {
            ":" => Self::Replace,
            "::" => Self::Isolate,
            ":+" => Self::Add,
            ":-" => Self::Remove,
            "=" => Self::Set,
            "i:" => Self::IndicatorReplace,
            "i::" => Self::IndicatorIsolate,
            "i:+" => Self::IndicatorAdd,
            "i:-" => Self::IndicatorRemove,
            _ => unreachable!(),
        }
    }

    pub fn is_indicator(&self) -> bool {
        matches!(
            self,
            Self::IndicatorReplace | Self::IndicatorIsolate | Self::IndicatorAdd | Self::IndicatorRemove
        )
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::Add | Self::IndicatorAdd)
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove | Self::IndicatorRemove)
    }

    pub fn is_isolate(&self) -> bool {
        matches!(self, Self::Isolate | Self::IndicatorIsolate)
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, ":"),
            Self::Isolate => write!(f, "::"),
            Self::Add => write!(f, ":+"),
            Self::Remove => write!(f, ":-"),
            Self::Set => write!(f, "="),
            Self::IndicatorReplace => write!(f, "i:"),
            Self::IndicatorIsolate => write!(f, "i::"),
            Self::IndicatorAdd => write!(f, "i:+"),
            Self::IndicatorRemove => write!(f, "i:-"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Mapping<'a>(pub TriggerList<'a>, pub TriggerMode, pub ResultList<'a>);

impl<'a> Mapping<'a> {
    pub fn trigger_key(&self) -> String {
        self.0.key()
    }
}

impl<'a> fmt::Display for Mapping<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0, self.1, self.2)
    }
}

/// Physical position; axes are partial and merge per axis.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Position {
    pub x: Option<f32>,  // mm
    pub y: Option<f32>,  // mm
    pub z: Option<f32>,  // mm
    pub rx: Option<f32>, // deg
    pub ry: Option<f32>, // deg
    pub rz: Option<f32>, // deg
}

impl Position {
    pub fn from_map(map: &[(&str, &str)]) -> Result<Self, String> {
        let mut pos = Position::default();
        for (k, v) in map {
            let v = v
                .parse::<f32>()
                .map_err(|_| format!("invalid position value '{}' for axis '{}'", v, k))?;
            match *k {
                "x" => pos.x = Some(v),
                "y" => pos.y = Some(v),
                "z" => pos.z = Some(v),
                "rx" => pos.rx = Some(v),
                "ry" => pos.ry = Some(v),
                "rz" => pos.rz = Some(v),
                _ => {}
            }
        }
        Ok(pos)
    }

    /// Axis-wise merge; axes unset in `other` are retained.
    pub fn merge(&mut self, other: &Position) {
        if other.x.is_some() {
            self.x = other.x;
        }
        if other.y.is_some() {
            self.y = other.y;
        }
        if other.z.is_some() {
            self.z = other.z;
        }
        if other.rx.is_some() {
            self.rx = other.rx;
        }
        if other.ry.is_some() {
            self.ry = other.ry;
        }
        if other.rz.is_some() {
            self.rz = other.rz;
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![];
        for (axis, value) in [
            ("x", &self.x),
            ("y", &self.y),
            ("z", &self.z),
            ("rx", &self.rx),
            ("ry", &self.ry),
            ("rz", &self.rz),
        ] {
            if let Some(value) = value {
                parts.push(format!("{}:{}", axis, value));
            }
        }
        write!(f, "{}", parts.join(","))
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct PixelDef {
    pub channels: Vec<(usize, usize)>,
    pub scancode: Option<usize>,
}

impl PixelDef {
    pub fn channels_string(&self) -> String {
        self.channels
            .iter()
            .map(|(c, w)| format!("{}:{}", c, w))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Default, Clone)]
pub struct Animation<'a> {
    pub modifiers: IndexMap<&'a str, &'a str>,
    pub frames: Vec<Vec<Pixel>>,
}

impl<'a> Animation<'a> {
    pub fn modifiers_string(&self) -> String {
        self.modifiers
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.to_string()
                } else {
                    format!("{}:{}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn append_mode(&self) -> bool {
        self.modifiers.contains_key("append")
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Variable<'a> {
    Scalar(&'a str),
    ArrayElement(&'a str, usize),
    ArrayWhole(&'a str),
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum PositionTarget {
    Pixel(Indices),
    Scancode(usize),
}

#[derive(Debug, Clone)]
pub enum Statement<'a> {
    Define((&'a str, &'a str)),
    Variable((Variable<'a>, Vec<&'a str>)),
    Capability((&'a str, Capability<'a>)),
    Keymap(Mapping<'a>),
    Position((PositionTarget, Position)),
    Pixelmap((Indices, PixelDef)),
    Animation((&'a str, Animation<'a>)),
    Frame((&'a str, Indices, Vec<Pixel>)),
}

impl<'a> fmt::Display for Statement<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Define((name, val)) => write!(f, "{} => {};", name, val),
            Self::Variable((var, vals)) => match var {
                Variable::Scalar(name) => {
                    write!(f, "{} = {};", maybe_quote(name), maybe_quote(&vals.join(", ")))
                }
                Variable::ArrayElement(name, index) => write!(
                    f,
                    "{}[{}] = {};",
                    name,
                    index,
                    maybe_quote(vals.first().unwrap_or(&""))
                ),
                Variable::ArrayWhole(name) => write!(
                    f,
                    "{}[] = {};",
                    name,
                    vals.iter()
                        .map(|v| maybe_quote(v))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
            Self::Capability((name, cap)) => write!(f, "{} => {};", name, cap),
            Self::Keymap(mapping) => write!(f, "{};", mapping),
            Self::Position((target, pos)) => match target {
                PositionTarget::Pixel(indices) => {
                    write!(f, "P[{}] <= {};", format_indices(indices), pos)
                }
                PositionTarget::Scancode(code) => write!(f, "S0x{:02X} <= {};", code, pos),
            },
            Self::Pixelmap((indices, def)) => write!(
                f,
                "P[{}]({}) : {};",
                format_indices(indices),
                def.channels_string(),
                def.scancode
                    .map(|s| format!("S0x{:02X}", s))
                    .unwrap_or_else(|| "None".to_string())
            ),
            Self::Animation((name, anim)) => {
                write!(f, "A[{}] <= {};", name, anim.modifiers_string())
            }
            Self::Frame((name, indices, pixels)) => write!(
                f,
                "A[{}, {}] <= {};",
                name,
                format_indices(indices),
                pixels
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Parsed file: statements with their source lines.
#[derive(Debug, Default, Clone)]
pub struct KllFile<'a> {
    pub statements: Vec<(usize, Statement<'a>)>,
}

impl<'a> fmt::Display for KllFile<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, statement) in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}
