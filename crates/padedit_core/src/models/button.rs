//! Buttons: one hit region mapped to an input command.

use super::overlay::RawLine;
use crate::constants::{NULL_COMMAND, POSITION_RANGE, SIZE_RANGE};
use crate::error::EditorError;
use crate::text::is_property_key;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Stable handle for a button, minted by its document.
///
/// Handles are never reused within a document and stay valid until the button
/// is deleted or the document is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ButtonId(pub(crate) u64);

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hit region shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Rect,
    Radial,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Rect => "rect",
            Shape::Radial => "radial",
        }
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "rect" => Ok(Shape::Rect),
            "radial" => Ok(Shape::Radial),
            other => Err(format!("unknown shape '{}'", other)),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric button field addressed by editor sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    X,
    Y,
    W,
    H,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::X, Section::Y, Section::W, Section::H];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::X => "x",
            Section::Y => "y",
            Section::W => "w",
            Section::H => "h",
        }
    }

    /// Inclusive domain accepted for this section.
    pub fn range(self) -> (f64, f64) {
        match self {
            Section::X | Section::Y => POSITION_RANGE,
            Section::W | Section::H => SIZE_RANGE,
        }
    }

    /// Reject non-finite or out-of-domain values.
    pub fn validate(self, value: f64) -> Result<f64, EditorError> {
        let (min, max) = self.range();
        if !value.is_finite() || value < min || value > max {
            return Err(EditorError::invalid(format!(
                "{} must be within [{}, {}], got {}",
                self.as_str(),
                min,
                max,
                value
            )));
        }
        Ok(value)
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }

    pub fn get(self, button: &Button) -> f64 {
        match self {
            Section::X => button.x,
            Section::Y => button.y,
            Section::W => button.w,
            Section::H => button.h,
        }
    }

    pub(crate) fn set(self, button: &mut Button, value: f64) {
        match self {
            Section::X => button.x = value,
            Section::Y => button.y = value,
            Section::W => button.w = value,
            Section::H => button.h = value,
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "x" => Ok(Section::X),
            "y" => Ok(Section::Y),
            "w" => Ok(Section::W),
            "h" => Ok(Section::H),
            other => Err(format!("unknown section '{}'", other)),
        }
    }
}

/// One button: center position and half-extents in a y-down unit square.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    id: ButtonId,
    pub command: String,
    pub shape: Shape,
    pub image: Option<String>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub extra: Vec<RawLine>,
}

impl Button {
    pub(crate) fn with_id(id: ButtonId, spec: ButtonSpec, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            id,
            command: spec.command,
            shape: spec.shape,
            image: spec.image,
            x,
            y,
            w,
            h,
            extra: spec.extra,
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub(crate) fn cloned_as(&self, id: ButtonId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    pub fn left(&self) -> f64 {
        self.x - self.w
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn top(&self) -> f64 {
        self.y - self.h
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// First value of an extra line.
    pub fn extra_value(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|line| line.key == key)
            .map(|line| line.value.as_str())
    }

    /// Editable parameters, as shown by the button dialog.
    pub fn spec(&self) -> ButtonSpec {
        ButtonSpec {
            command: self.command.clone(),
            shape: self.shape,
            image: self.image.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Non-geometric button parameters supplied by create/edit dialogs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ButtonSpec {
    pub command: String,
    pub shape: Shape,
    pub image: Option<String>,
    pub extra: Vec<RawLine>,
}

impl ButtonSpec {
    pub fn new(command: impl Into<String>, shape: Shape) -> Self {
        Self {
            command: command.into(),
            shape,
            image: None,
            extra: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_extra(mut self, extra: Vec<RawLine>) -> Self {
        self.extra = extra;
        self
    }

    /// Trim and validate the spec.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] for commands containing whitespace
    /// or commas, images containing commas or line breaks, and extra lines
    /// with empty, spaced or reserved keys.
    pub fn normalized(self) -> Result<Self, EditorError> {
        Ok(Self {
            command: normalize_command(&self.command)?,
            shape: self.shape,
            image: normalize_image(self.image.as_deref())?,
            extra: normalize_extra(self.extra)?,
        })
    }
}

pub(crate) fn normalize_command(command: &str) -> Result<String, EditorError> {
    let command = command.trim();
    if command.is_empty() {
        return Ok(NULL_COMMAND.to_string());
    }
    if command.chars().any(char::is_whitespace) {
        return Err(EditorError::invalid(
            "button command should not contain spaces",
        ));
    }
    if command.contains(',') || command.contains('"') {
        return Err(EditorError::invalid(format!(
            "button command '{}' contains a reserved character",
            command
        )));
    }
    Ok(command.to_string())
}

pub(crate) fn normalize_image(image: Option<&str>) -> Result<Option<String>, EditorError> {
    let Some(image) = image.map(str::trim).filter(|image| !image.is_empty()) else {
        return Ok(None);
    };
    if image.contains(['\n', '\r', ',', '"']) {
        return Err(EditorError::invalid(format!(
            "image name '{}' contains a reserved character",
            image
        )));
    }
    Ok(Some(image.to_string()))
}

fn normalize_extra(extra: Vec<RawLine>) -> Result<Vec<RawLine>, EditorError> {
    extra
        .into_iter()
        .map(|line| {
            let line = RawLine::new(line.key, line.value);
            if !is_property_key(&line.key) {
                return Err(EditorError::invalid(format!(
                    "invalid property key '{}'",
                    line.key
                )));
            }
            if line.key == "overlay" {
                return Err(EditorError::invalid(
                    "button image must be set through the image field",
                ));
            }
            if line.value.contains(['\n', '\r']) {
                return Err(EditorError::invalid(format!(
                    "property '{}' spans multiple lines",
                    line.key
                )));
            }
            Ok(line)
        })
        .collect()
}
