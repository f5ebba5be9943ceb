//! HID usage tables.
//!
//! Name/code lookup for the namespaced id kinds (`U`, `CONS`, `SYS`,
//! `I`, `LOC`). Values follow USB HID 1.12v2; keyboard usages pg 53,
//! LED usages pg 61, system controls pg 32.

use std::fmt;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum HidKind {
    Keyboard,
    Consumer,
    System,
    Indicator,
    Locale,
}

impl HidKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Keyboard => "U",
            Self::Consumer => "CONS",
            Self::System => "SYS",
            Self::Indicator => "I",
            Self::Locale => "LOC",
        }
    }
}

impl fmt::Display for HidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyboard => write!(f, "keyboard"),
            Self::Consumer => write!(f, "consumer"),
            Self::System => write!(f, "system"),
            Self::Indicator => write!(f, "indicator"),
            Self::Locale => write!(f, "locale"),
        }
    }
}

static KEYBOARD: &[(&str, u16)] = &[
    ("NoEvent", 0x00),
    ("ErrorRollOver", 0x01),
    ("PostFail", 0x02),
    ("ErrorUndefined", 0x03),
    ("A", 0x04),
    ("B", 0x05),
    ("C", 0x06),
    ("D", 0x07),
    ("E", 0x08),
    ("F", 0x09),
    ("G", 0x0A),
    ("H", 0x0B),
    ("I", 0x0C),
    ("J", 0x0D),
    ("K", 0x0E),
    ("L", 0x0F),
    ("M", 0x10),
    ("N", 0x11),
    ("O", 0x12),
    ("P", 0x13),
    ("Q", 0x14),
    ("R", 0x15),
    ("S", 0x16),
    ("T", 0x17),
    ("U", 0x18),
    ("V", 0x19),
    ("W", 0x1A),
    ("X", 0x1B),
    ("Y", 0x1C),
    ("Z", 0x1D),
    ("1", 0x1E),
    ("2", 0x1F),
    ("3", 0x20),
    ("4", 0x21),
    ("5", 0x22),
    ("6", 0x23),
    ("7", 0x24),
    ("8", 0x25),
    ("9", 0x26),
    ("0", 0x27),
    ("Enter", 0x28),
    ("Esc", 0x29),
    ("Escape", 0x29),
    ("Backspace", 0x2A),
    ("Tab", 0x2B),
    ("Space", 0x2C),
    ("Minus", 0x2D),
    ("Equal", 0x2E),
    ("LeftBracket", 0x2F),
    ("RightBracket", 0x30),
    ("Backslash", 0x31),
    ("Number", 0x32),
    ("Semicolon", 0x33),
    ("Quote", 0x34),
    ("Backtick", 0x35),
    ("Comma", 0x36),
    ("Period", 0x37),
    ("Slash", 0x38),
    ("CapsLock", 0x39),
    ("F1", 0x3A),
    ("F2", 0x3B),
    ("F3", 0x3C),
    ("F4", 0x3D),
    ("F5", 0x3E),
    ("F6", 0x3F),
    ("F7", 0x40),
    ("F8", 0x41),
    ("F9", 0x42),
    ("F10", 0x43),
    ("F11", 0x44),
    ("F12", 0x45),
    ("PrintScreen", 0x46),
    ("ScrollLock", 0x47),
    ("Pause", 0x48),
    ("Insert", 0x49),
    ("Home", 0x4A),
    ("PageUp", 0x4B),
    ("Delete", 0x4C),
    ("End", 0x4D),
    ("PageDown", 0x4E),
    ("Right", 0x4F),
    ("Left", 0x50),
    ("Down", 0x51),
    ("Up", 0x52),
    ("NumLock", 0x53),
    ("KeypadSlash", 0x54),
    ("KeypadAsterisk", 0x55),
    ("KeypadMinus", 0x56),
    ("KeypadPlus", 0x57),
    ("KeypadEnter", 0x58),
    ("Keypad1", 0x59),
    ("Keypad2", 0x5A),
    ("Keypad3", 0x5B),
    ("Keypad4", 0x5C),
    ("Keypad5", 0x5D),
    ("Keypad6", 0x5E),
    ("Keypad7", 0x5F),
    ("Keypad8", 0x60),
    ("Keypad9", 0x61),
    ("Keypad0", 0x62),
    ("KeypadPeriod", 0x63),
    ("ISOSlash", 0x64),
    ("App", 0x65),
    ("KeyboardStatus", 0x66),
    ("KeypadEqual", 0x67),
    ("F13", 0x68),
    ("F14", 0x69),
    ("F15", 0x6A),
    ("F16", 0x6B),
    ("F17", 0x6C),
    ("F18", 0x6D),
    ("F19", 0x6E),
    ("F20", 0x6F),
    ("F21", 0x70),
    ("F22", 0x71),
    ("F23", 0x72),
    ("F24", 0x73),
    ("Exec", 0x74),
    ("Help", 0x75),
    ("Menu", 0x76),
    ("Select", 0x77),
    ("Stop", 0x78),
    ("Again", 0x79),
    ("Undo", 0x7A),
    ("Cut", 0x7B),
    ("Copy", 0x7C),
    ("Paste", 0x7D),
    ("Find", 0x7E),
    ("Mute", 0x7F),
    ("VolumeUp", 0x80),
    ("VolumeDown", 0x81),
    ("LockingCapsLock", 0x82),
    ("LockingNumLock", 0x83),
    ("LockingScrollLock", 0x84),
    ("KeypadComma", 0x85),
    ("KeypadEqualAS400", 0x86),
    ("International1", 0x87),
    ("International2", 0x88),
    ("International3", 0x89),
    ("International4", 0x8A),
    ("International5", 0x8B),
    ("International6", 0x8C),
    ("International7", 0x8D),
    ("International8", 0x8E),
    ("International9", 0x8F),
    ("LANG1", 0x90),
    ("LANG2", 0x91),
    ("LANG3", 0x92),
    ("LANG4", 0x93),
    ("LANG5", 0x94),
    ("LANG6", 0x95),
    ("LANG7", 0x96),
    ("LANG8", 0x97),
    ("LANG9", 0x98),
    ("AlternateErase", 0x99),
    ("SysReq", 0x9A),
    ("Cancel", 0x9B),
    ("Clear", 0x9C),
    ("Prior", 0x9D),
    ("Return", 0x9E),
    ("Separator", 0x9F),
    ("Out", 0xA0),
    ("Oper", 0xA1),
    ("ClearAgain", 0xA2),
    ("CrSelProps", 0xA3),
    ("ExSel", 0xA4),
    ("Keypad00", 0xB0),
    ("Keypad000", 0xB1),
    ("ThousandSeparator", 0xB2),
    ("DecimalSeparator", 0xB3),
    ("CurrencyUnit", 0xB4),
    ("CurrencySubUnit", 0xB5),
    ("KeypadLeftParenthesis", 0xB6),
    ("KeypadRightParenthesis", 0xB7),
    ("KeypadLeftBrace", 0xB8),
    ("KeypadRightBrace", 0xB9),
    ("KeypadTab", 0xBA),
    ("KeypadBackspace", 0xBB),
    ("KeypadA", 0xBC),
    ("KeypadB", 0xBD),
    ("KeypadC", 0xBE),
    ("KeypadD", 0xBF),
    ("KeypadE", 0xC0),
    ("KeypadF", 0xC1),
    ("KeypadXOR", 0xC2),
    ("KeypadChevron", 0xC3),
    ("KeypadPercent", 0xC4),
    ("KeypadLessThan", 0xC5),
    ("KeypadGreaterThan", 0xC6),
    ("KeypadBITAND", 0xC7),
    ("KeypadAND", 0xC8),
    ("KeypadBITOR", 0xC9),
    ("KeypadOR", 0xCA),
    ("KeypadColon", 0xCB),
    ("KeypadNumber", 0xCC),
    ("KeypadSpace", 0xCD),
    ("KeypadAt", 0xCE),
    ("KeypadExclamation", 0xCF),
    ("KeypadMemoryStore", 0xD0),
    ("KeypadMemoryRecall", 0xD1),
    ("KeypadMemoryClear", 0xD2),
    ("KeypadMemoryAdd", 0xD3),
    ("KeypadMemorySubtract", 0xD4),
    ("KeypadMemoryMultiply", 0xD5),
    ("KeypadMemoryDivide", 0xD6),
    ("KeypadPlusMinus", 0xD7),
    ("KeypadClear", 0xD8),
    ("KeypadClearEntry", 0xD9),
    ("KeypadBinary", 0xDA),
    ("KeypadOctal", 0xDB),
    ("KeypadDecimal", 0xDC),
    ("KeypadHexidecimal", 0xDD),
    ("LeftControl", 0xE0),
    ("LeftShift", 0xE1),
    ("LeftAlt", 0xE2),
    ("LeftGUI", 0xE3),
    ("RightControl", 0xE4),
    ("RightShift", 0xE5),
    ("RightAlt", 0xE6),
    ("RightGUI", 0xE7),
];

static CONSUMER: &[(&str, u16)] = &[
    ("Power", 0x030),
    ("Reset", 0x031),
    ("Sleep", 0x032),
    ("SleepAfter", 0x033),
    ("SleepMode", 0x034),
    ("Illumination", 0x035),
    ("Menu", 0x040),
    ("MenuPick", 0x041),
    ("MenuUp", 0x042),
    ("MenuDown", 0x043),
    ("MenuLeft", 0x044),
    ("MenuRight", 0x045),
    ("MenuEscape", 0x046),
    ("MenuValueIncrease", 0x047),
    ("MenuValueDecrease", 0x048),
    ("Snapshot", 0x065),
    ("BrightnessIncrement", 0x06F),
    ("BrightnessDecrement", 0x070),
    ("BacklightToggle", 0x072),
    ("BrightnessMin", 0x073),
    ("BrightnessMax", 0x074),
    ("BrightnessAuto", 0x075),
    ("Quit", 0x094),
    ("Help", 0x095),
    ("ChannelIncrement", 0x09C),
    ("ChannelDecrement", 0x09D),
    ("Play", 0x0B0),
    ("Pause", 0x0B1),
    ("Record", 0x0B2),
    ("FastForward", 0x0B3),
    ("Rewind", 0x0B4),
    ("ScanNextTrack", 0x0B5),
    ("ScanPreviousTrack", 0x0B6),
    ("Stop", 0x0B7),
    ("Eject", 0x0B8),
    ("RandomPlay", 0x0B9),
    ("Repeat", 0x0BC),
    ("TrackNormal", 0x0BE),
    ("FrameForward", 0x0C0),
    ("FrameBack", 0x0C1),
    ("StopEject", 0x0CC),
    ("PausePlay", 0x0CD),
    ("PlaySkip", 0x0CE),
    ("Mute", 0x0E2),
    ("BassBoost", 0x0E5),
    ("Loudness", 0x0E7),
    ("VolumeUp", 0x0E9),
    ("VolumeDown", 0x0EA),
];

static SYSTEM: &[(&str, u16)] = &[
    ("PowerDown", 0x81),
    ("Sleep", 0x82),
    ("WakeUp", 0x83),
    ("ContextMenu", 0x84),
    ("MainMenu", 0x85),
    ("AppMenu", 0x86),
    ("MenuHelp", 0x87),
    ("MenuExit", 0x88),
    ("MenuSelect", 0x89),
    ("MenuRight", 0x8A),
    ("MenuLeft", 0x8B),
    ("MenuUp", 0x8C),
    ("MenuDown", 0x8D),
    ("ColdRestart", 0x8E),
    ("WarmRestart", 0x8F),
    ("DpadUp", 0x90),
    ("DpadDown", 0x91),
    ("DpadRight", 0x92),
    ("DpadLeft", 0x93),
    ("SystemFunctionShift", 0x97),
    ("SystemFunctionShiftLock", 0x98),
    ("SystemDismissNotification", 0x9A),
    ("SystemDoNotDisturb", 0x9B),
    ("Dock", 0xA0),
    ("Undock", 0xA1),
    ("Setup", 0xA2),
    ("Break", 0xA3),
    ("DebuggerBreak", 0xA4),
    ("ApplicationBreak", 0xA5),
    ("ApplicationDebuggerBreak", 0xA6),
    ("SpeakerMute", 0xA7),
    ("Hibernate", 0xA8),
    ("DisplayInvert", 0xB0),
    ("DisplayInternal", 0xB1),
    ("DisplayExternal", 0xB2),
    ("DisplayBoth", 0xB3),
    ("DisplayDual", 0xB4),
    ("DisplayToggleInternalExternal", 0xB5),
    ("DisplaySwapPrimarySecondary", 0xB6),
    ("DisplayLCDAutoscale", 0xB7),
];

static INDICATOR: &[(&str, u16)] = &[
    ("NumLock", 0x01),
    ("CapsLock", 0x02),
    ("ScrollLock", 0x03),
    ("Compose", 0x04),
    ("Kana", 0x05),
    ("Power", 0x06),
    ("Shift", 0x07),
    ("DoNotDisturb", 0x08),
    ("Mute", 0x09),
    ("ToneEnable", 0x0A),
    ("HighCutFilter", 0x0B),
    ("LowCutFilter", 0x0C),
    ("EqualizerEnable", 0x0D),
    ("SoundFieldOn", 0x0E),
    ("SurroundOn", 0x0F),
    ("Repeat", 0x10),
    ("Stereo", 0x11),
    ("SampleRateDetect", 0x12),
    ("Spinning", 0x13),
    ("CAC", 0x14),
    ("CLV", 0x15),
    ("RecordingFormatDetect", 0x16),
    ("OffHook", 0x17),
    ("Ring", 0x18),
    ("MessageWaiting", 0x19),
    ("DataMode", 0x1A),
    ("BatteryOperation", 0x1B),
    ("BatteryOK", 0x1C),
    ("BatteryLow", 0x1D),
    ("Speaker", 0x1E),
    ("HeadSet", 0x1F),
    ("Hold", 0x20),
    ("Microphone", 0x21),
    ("Coverage", 0x22),
    ("NightMode", 0x23),
    ("SendCalls", 0x24),
    ("CallPickup", 0x25),
    ("Conference", 0x26),
    ("StandBy", 0x27),
    ("CameraOn", 0x28),
    ("CameraOff", 0x29),
    ("OnLine", 0x2A),
    ("OffLine", 0x2B),
    ("Busy", 0x2C),
    ("Ready", 0x2D),
    ("PaperOut", 0x2E),
    ("PaperJam", 0x2F),
    ("Remote", 0x30),
    ("Forward", 0x31),
    ("Reverse", 0x32),
    ("Stop", 0x33),
    ("Rewind", 0x34),
    ("FastForward", 0x35),
    ("Play", 0x36),
    ("Pause", 0x37),
    ("Record", 0x38),
    ("Error", 0x39),
    ("GenericInd", 0x4B),
    ("SysSuspend", 0x4C),
    ("ExtPwrConn", 0x4D),
];

static LOCALE: &[(&str, u16)] = &[
    ("Undefined", 0),
    ("Arabic", 1),
    ("Belgian", 2),
    ("CanadianBilingual", 3),
    ("CanadianFrench", 4),
    ("CzechRepublic", 5),
    ("Danish", 6),
    ("Finnish", 7),
    ("French", 8),
    ("German", 9),
    ("Greek", 10),
    ("Hebrew", 11),
    ("Hungary", 12),
    ("InternationalISO", 13),
    ("Italian", 14),
    ("JapanKatakana", 15),
    ("Korean", 16),
    ("LatinAmerica", 17),
    ("NetherlandsDutch", 18),
    ("Norwegian", 19),
    ("PersianFarsi", 20),
    ("Poland", 21),
    ("Portuguese", 22),
    ("Russia", 23),
    ("Slovakia", 24),
    ("Spanish", 25),
    ("Swedish", 26),
    ("SwissFrench", 27),
    ("SwissGerman", 28),
    ("Switzerland", 29),
    ("Taiwan", 30),
    ("TurkishQ", 31),
    ("UK", 32),
    ("US", 33),
    ("Yugoslavia", 34),
    ("TurkishF", 35),
];

fn table(kind: HidKind) -> &'static [(&'static str, u16)] {
    match kind {
        HidKind::Keyboard => KEYBOARD,
        HidKind::Consumer => CONSUMER,
        HidKind::System => SYSTEM,
        HidKind::Indicator => INDICATOR,
        HidKind::Locale => LOCALE,
    }
}

/// Resolve a usage name to its code, case-insensitively.
pub fn code(kind: HidKind, name: &str) -> Option<u16> {
    let entries = table(kind);
    entries
        .iter()
        .find(|(n, _)| *n == name)
        .or_else(|| entries.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
        .map(|(_, c)| *c)
}

/// Canonical usage name for a code (first table entry wins).
pub fn name(kind: HidKind, code: u16) -> Option<&'static str> {
    table(kind).iter().find(|(_, c)| *c == code).map(|(n, _)| *n)
}

/// Legal code range per kind.
pub fn valid_code(kind: HidKind, code: u32) -> bool {
    match kind {
        HidKind::Keyboard => code <= 0xFF,
        HidKind::Consumer => code <= 0x3FF,
        HidKind::System => (0x81..=0xB7).contains(&code),
        HidKind::Indicator => code <= 0xFF,
        HidKind::Locale => code <= 35,
    }
}
