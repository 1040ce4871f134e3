use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::navigation::{OpenMode, OpenRequest};

/// Symbolic user input, independent of the physical key that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    MoveNext,
    MovePrev,
    PageNext,
    PagePrev,
    OpenCurrent,
    OpenCurrentNewContext,
    OpenRandom,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::MoveNext,
        Intent::MovePrev,
        Intent::PageNext,
        Intent::PagePrev,
        Intent::OpenCurrent,
        Intent::OpenCurrentNewContext,
        Intent::OpenRandom,
    ];

    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoveNext => "move-next",
            Self::MovePrev => "move-prev",
            Self::PageNext => "page-next",
            Self::PagePrev => "page-prev",
            Self::OpenCurrent => "open-current",
            Self::OpenCurrentNewContext => "open-current-new-context",
            Self::OpenRandom => "open-random",
        }
    }

    /// Dispatch table: what the session should do for this intent.
    pub fn command(self, open_mode: OpenMode) -> Command {
        match self {
            Self::MoveNext => Command::Step(1),
            Self::MovePrev => Command::Step(-1),
            Self::PageNext => Command::Page(1),
            Self::PagePrev => Command::Page(-1),
            Self::OpenCurrent => Command::OpenSelected(open_mode),
            Self::OpenCurrentNewContext => Command::OpenSelected(OpenMode::NewContext),
            Self::OpenRandom => Command::OpenRandom(open_mode),
        }
    }

    /// Bound keys would otherwise scroll the page, reload it, or bookmark it.
    pub fn suppresses_default(self) -> bool {
        match self {
            Self::MoveNext | Self::MovePrev | Self::PageNext | Self::PagePrev => true,
            Self::OpenCurrent | Self::OpenCurrentNewContext | Self::OpenRandom => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step(isize),
    Page(isize),
    OpenSelected(OpenMode),
    OpenRandom(OpenMode),
}

/// The single side effect produced by one input event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    None,
    CursorMoved { from: usize, to: usize },
    Open(OpenRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub effect: Effect,
    pub suppress_default: bool,
}

impl DispatchOutcome {
    pub fn ignored() -> Self {
        Self {
            effect: Effect::None,
            suppress_default: false,
        }
    }

    pub fn open_request(&self) -> Option<&OpenRequest> {
        match &self.effect {
            Effect::Open(request) => Some(request),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChordError {
    #[error("key chord is empty")]
    Empty,
    #[error("unsupported modifier '{0}'; use Ctrl, Alt, Shift, or Meta")]
    UnsupportedModifier(String),
    #[error("unsupported key '{0}'")]
    UnsupportedKey(String),
    #[error("function key must be between F1 and F24")]
    FunctionKeyRange,
    #[error("unknown intent '{0}'")]
    UnknownIntent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Char(char),
    Enter,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Escape,
    Tab,
    Space,
    F(u8),
}

impl Key {
    pub fn parse(input: &str) -> Result<Self, ChordError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(ChordError::Empty);
        }

        let lower = raw.to_ascii_lowercase();
        let named = match lower.as_str() {
            "enter" | "return" => Some(Self::Enter),
            "up" | "arrowup" => Some(Self::Up),
            "down" | "arrowdown" => Some(Self::Down),
            "pageup" | "pgup" => Some(Self::PageUp),
            "pagedown" | "pgdn" => Some(Self::PageDown),
            "home" => Some(Self::Home),
            "end" => Some(Self::End),
            "esc" | "escape" => Some(Self::Escape),
            "tab" => Some(Self::Tab),
            "space" => Some(Self::Space),
            _ => None,
        };
        if let Some(key) = named {
            return Ok(key);
        }

        let mut chars = raw.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_graphic() {
                return Ok(Self::Char(c.to_ascii_lowercase()));
            }
        }

        if let Some(number) = lower.strip_prefix('f') {
            if let Ok(parsed) = number.parse::<u8>() {
                if (1..=24).contains(&parsed) {
                    return Ok(Self::F(parsed));
                }
                return Err(ChordError::FunctionKeyRange);
            }
        }

        Err(ChordError::UnsupportedKey(raw.to_string()))
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            Self::Enter => write!(f, "Enter"),
            Self::Up => write!(f, "Up"),
            Self::Down => write!(f, "Down"),
            Self::PageUp => write!(f, "PageUp"),
            Self::PageDown => write!(f, "PageDown"),
            Self::Home => write!(f, "Home"),
            Self::End => write!(f, "End"),
            Self::Escape => write!(f, "Escape"),
            Self::Tab => write!(f, "Tab"),
            Self::Space => write!(f, "Space"),
            Self::F(n) => write!(f, "F{n}"),
        }
    }
}

/// A key plus modifier state, written as `Ctrl+J`, `Down`, `Ctrl+Shift+Enter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn parse(input: &str) -> Result<Self, ChordError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ChordError::Empty);
        }
        // A lone "+" is a key, not a separator.
        if trimmed == "+" {
            return Ok(Self::plain(Key::Char('+')));
        }

        let parts: Vec<&str> = trimmed
            .split('+')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        let Some((key_raw, modifier_parts)) = parts.split_last() else {
            return Err(ChordError::Empty);
        };

        let mut modifiers: BTreeSet<&'static str> = BTreeSet::new();
        for part in modifier_parts {
            modifiers.insert(normalize_modifier(part)?);
        }

        Ok(Self {
            key: Key::parse(key_raw)?,
            ctrl: modifiers.contains("Ctrl"),
            alt: modifiers.contains("Alt"),
            shift: modifiers.contains("Shift"),
            meta: modifiers.contains("Meta"),
        })
    }
}

impl Display for KeyChord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut ordered: Vec<String> = Vec::with_capacity(5);
        if self.ctrl {
            ordered.push("Ctrl".to_string());
        }
        if self.alt {
            ordered.push("Alt".to_string());
        }
        if self.shift {
            ordered.push("Shift".to_string());
        }
        if self.meta {
            ordered.push("Meta".to_string());
        }
        ordered.push(self.key.to_string());
        write!(f, "{}", ordered.join("+"))
    }
}

impl TryFrom<String> for KeyChord {
    type Error = ChordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyChord> for String {
    fn from(value: KeyChord) -> Self {
        value.to_string()
    }
}

fn normalize_modifier(input: &str) -> Result<&'static str, ChordError> {
    match input.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Ok("Ctrl"),
        "alt" | "option" => Ok("Alt"),
        "shift" => Ok("Shift"),
        "meta" | "cmd" | "command" | "super" => Ok("Meta"),
        _ => Err(ChordError::UnsupportedModifier(input.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<KeyChord, Intent>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        for (intent, chords) in default_bindings() {
            for chord in chords {
                bindings.insert(chord, intent);
            }
        }
        Self { bindings }
    }
}

fn default_bindings() -> Vec<(Intent, Vec<KeyChord>)> {
    vec![
        (
            Intent::MoveNext,
            vec![KeyChord::ctrl(Key::Char('j')), KeyChord::plain(Key::Down)],
        ),
        (
            Intent::MovePrev,
            vec![KeyChord::ctrl(Key::Char('k')), KeyChord::plain(Key::Up)],
        ),
        (Intent::PageNext, vec![KeyChord::ctrl(Key::Char('d'))]),
        (Intent::PagePrev, vec![KeyChord::ctrl(Key::Char('u'))]),
        (
            Intent::OpenCurrent,
            vec![KeyChord::ctrl(Key::Char('y')), KeyChord::plain(Key::Enter)],
        ),
        (
            Intent::OpenCurrentNewContext,
            vec![KeyChord::ctrl(Key::Enter)],
        ),
        (Intent::OpenRandom, vec![KeyChord::ctrl(Key::Char('r'))]),
    ]
}

impl Keymap {
    /// Default bindings with per-intent replacements; an intent listed in
    /// `overrides` loses all of its default chords.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Result<Self, ChordError> {
        let mut keymap = Self::default();
        for (name, chords) in overrides {
            let intent =
                Intent::parse(name).ok_or_else(|| ChordError::UnknownIntent(name.clone()))?;
            keymap.bindings.retain(|_, bound| *bound != intent);
            for chord in chords {
                keymap.bind(KeyChord::parse(chord)?, intent);
            }
        }
        Ok(keymap)
    }

    pub fn bind(&mut self, chord: KeyChord, intent: Intent) {
        self.bindings.insert(chord, intent);
    }

    pub fn resolve(&self, chord: &KeyChord) -> Option<Intent> {
        self.bindings.get(chord).copied()
    }

    pub fn chords_for(&self, intent: Intent) -> Vec<KeyChord> {
        let mut chords: Vec<KeyChord> = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == intent)
            .map(|(chord, _)| *chord)
            .collect();
        chords.sort_by_key(|chord| chord.to_string());
        chords
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{ChordError, Command, Intent, Key, KeyChord, Keymap};
    use crate::navigation::OpenMode;

    #[test]
    fn canonicalizes_chords() {
        let chord = KeyChord::parse(" shift + ctrl + enter ").unwrap();
        assert_eq!(chord.to_string(), "Ctrl+Shift+Enter");
        assert_eq!(KeyChord::parse("control+J").unwrap(), KeyChord::ctrl(Key::Char('j')));
        assert_eq!(KeyChord::parse("ArrowDown").unwrap(), KeyChord::plain(Key::Down));
    }

    #[test]
    fn rejects_unknown_modifiers_and_keys() {
        assert!(KeyChord::parse("Hyper+J").is_err());
        assert!(KeyChord::parse("Ctrl+Banana").is_err());
        assert!(KeyChord::parse("F25").is_err());
        assert!(KeyChord::parse("").is_err());
    }

    #[test]
    fn space_is_named_and_blank_is_empty() {
        assert_eq!(Key::parse("Space"), Ok(Key::Space));
        assert_eq!(Key::parse("   "), Err(ChordError::Empty));
        assert_eq!(KeyChord::parse("Ctrl+Space").unwrap().to_string(), "Ctrl+Space");
    }

    #[test]
    fn every_intent_suppresses_host_default() {
        for intent in Intent::ALL {
            assert!(intent.suppresses_default(), "{}", intent.as_str());
        }
    }

    #[test]
    fn default_keymap_covers_observed_bindings() {
        let keymap = Keymap::default();
        let cases = [
            ("Ctrl+J", Intent::MoveNext),
            ("Down", Intent::MoveNext),
            ("Ctrl+K", Intent::MovePrev),
            ("Up", Intent::MovePrev),
            ("Ctrl+D", Intent::PageNext),
            ("Ctrl+U", Intent::PagePrev),
            ("Ctrl+Y", Intent::OpenCurrent),
            ("Enter", Intent::OpenCurrent),
            ("Ctrl+Enter", Intent::OpenCurrentNewContext),
            ("Ctrl+R", Intent::OpenRandom),
        ];
        for (chord, intent) in cases {
            assert_eq!(keymap.resolve(&KeyChord::parse(chord).unwrap()), Some(intent), "{chord}");
        }
        assert_eq!(keymap.resolve(&KeyChord::plain(Key::Char('j'))), None);
    }

    #[test]
    fn overrides_replace_defaults_for_that_intent_only() {
        let mut overrides = BTreeMap::new();
        overrides.insert("page-next".to_string(), vec!["PageDown".to_string()]);
        let keymap = Keymap::with_overrides(&overrides).unwrap();

        assert_eq!(keymap.resolve(&KeyChord::ctrl(Key::Char('d'))), None);
        assert_eq!(
            keymap.resolve(&KeyChord::plain(Key::PageDown)),
            Some(Intent::PageNext)
        );
        assert_eq!(
            keymap.resolve(&KeyChord::plain(Key::Down)),
            Some(Intent::MoveNext)
        );
    }

    #[test]
    fn intents_round_trip_names_and_map_to_commands() {
        for intent in Intent::ALL {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::parse("OPEN_RANDOM"), Some(Intent::OpenRandom));
        assert_eq!(
            Intent::OpenCurrentNewContext.command(OpenMode::ReplaceCurrent),
            Command::OpenSelected(OpenMode::NewContext)
        );
        assert_eq!(Intent::PagePrev.command(OpenMode::ReplaceCurrent), Command::Page(-1));
    }

    #[test]
    fn chord_serializes_as_canonical_string() {
        let json = serde_json::to_string(&KeyChord::ctrl(Key::Char('r'))).unwrap();
        assert_eq!(json, "\"Ctrl+R\"");
        let back: KeyChord = serde_json::from_str("\"ctrl+r\"").unwrap();
        assert_eq!(back, KeyChord::ctrl(Key::Char('r')));
    }
}
