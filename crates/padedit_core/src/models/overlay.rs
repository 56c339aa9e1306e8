//! Overlay blocks and their order-preserving header fields.

use super::button::{Button, ButtonId};
use crate::constants::PORTRAIT_PREFIX;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// Opaque `key = value` line kept verbatim (modulo trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLine {
    pub key: String,
    pub value: String,
}

impl RawLine {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into().trim().to_string(),
            value: value.into().trim().to_string(),
        }
    }
}

impl fmt::Display for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)
    }
}

/// Overlay-level keys the editor interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownKey {
    /// Background image of the overlay (`overlayN_overlay`).
    Overlay,
    FullScreen,
    Normalized,
    /// Background placement as `"x,y,w,h"`.
    Rect,
    AspectRatio,
    RangeMod,
    AlphaMod,
}

impl KnownKey {
    pub const ALL: [KnownKey; 7] = [
        KnownKey::Overlay,
        KnownKey::FullScreen,
        KnownKey::Normalized,
        KnownKey::Rect,
        KnownKey::AspectRatio,
        KnownKey::RangeMod,
        KnownKey::AlphaMod,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KnownKey::Overlay => "overlay",
            KnownKey::FullScreen => "full_screen",
            KnownKey::Normalized => "normalized",
            KnownKey::Rect => "rect",
            KnownKey::AspectRatio => "aspect_ratio",
            KnownKey::RangeMod => "range_mod",
            KnownKey::AlphaMod => "alpha_mod",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.as_str() == key)
    }
}

/// One overlay header line: either a key the editor understands or an opaque one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Known(KnownKey, String),
    Raw(RawLine),
}

impl Field {
    /// Classify a `key = value` pair.
    pub fn from_pair(key: &str, value: &str) -> Self {
        let key = key.trim();
        let value = value.trim().to_string();
        match KnownKey::from_key(key) {
            Some(known) => Field::Known(known, value),
            None => Field::Raw(RawLine::new(key, value)),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Field::Known(known, _) => known.as_str(),
            Field::Raw(line) => line.key.as_str(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Field::Known(_, value) => value.as_str(),
            Field::Raw(line) => line.value.as_str(),
        }
    }
}

impl From<RawLine> for Field {
    fn from(line: RawLine) -> Self {
        Field::from_pair(&line.key, &line.value)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Field", 3)?;
        state.serialize_field("key", self.key())?;
        state.serialize_field("value", self.value())?;
        state.serialize_field("known", &matches!(self, Field::Known(..)))?;
        state.end()
    }
}

/// Returns `true` for header keys the serializer owns (`name`, `descs`, `desc<N>...`).
pub fn is_reserved_header_key(key: &str) -> bool {
    if key == "name" || key == "descs" {
        return true;
    }
    key.strip_prefix("desc")
        .map(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// One named layout of buttons for a display orientation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub name: String,
    pub header: Vec<Field>,
    pub buttons: Vec<Button>,
}

impl Overlay {
    pub fn new(name: impl Into<String>, header: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            header,
            buttons: Vec::new(),
        }
    }

    /// First value recorded for a known header key.
    pub fn known(&self, key: KnownKey) -> Option<&str> {
        self.header.iter().find_map(|field| match field {
            Field::Known(k, value) if *k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Header lines rendered back to `key = value` pairs.
    pub fn header_lines(&self) -> Vec<RawLine> {
        self.header
            .iter()
            .map(|field| RawLine::new(field.key(), field.value()))
            .collect()
    }

    /// Naming convention used by the editor to pick an orientation.
    pub fn is_portrait(&self) -> bool {
        self.name.contains(PORTRAIT_PREFIX)
    }

    pub fn position_of(&self, id: ButtonId) -> Option<usize> {
        self.buttons.iter().position(|button| button.id() == id)
    }
}
