//! In-memory overlay config document: queries and all-or-nothing mutators.

mod parse;
mod serialize;


use crate::constants::{NEW_BUTTON_CENTER, NEW_BUTTON_EXTENT};
use crate::error::EditorError;
use crate::models::{
    button::{normalize_command, normalize_image},
    is_reserved_header_key, Button, ButtonId, ButtonSpec, Field, KnownKey, Overlay, RawLine,
    Section, Shape,
};
use crate::text::{is_property_key, quote, strip_quotes};
use serde::Serialize;
use tracing::debug;

/// Key of the button extra that links a button to another overlay by name.
pub const NEXT_TARGET_KEY: &str = "next_target";

/// Display aspect declared by an overlay (`aspect_ratio`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectRatio {
    pub w: f64,
    pub h: f64,
}

impl AspectRatio {
    /// Parse `1.7778`, `16:9`, `16x9` or `16/9`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = strip_quotes(value);
        let parts = value
            .split_once([':', 'x', '/'])
            .map(|(w, h)| (w.trim().parse::<f64>().ok(), h.trim().parse::<f64>().ok()));
        let (w, h) = match parts {
            Some((Some(w), Some(h))) => (w, h),
            Some(_) => return None,
            None => (value.parse::<f64>().ok()?, 1.0),
        };
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return None;
        }
        Some(Self { w, h })
    }

    pub fn ratio(&self) -> f64 {
        self.w / self.h
    }
}

/// Background placement in normalized coordinates (`rect = "x,y,w,h"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackgroundRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BackgroundRect {
    fn parse(value: &str) -> Option<Self> {
        let parts: Vec<f64> = strip_quotes(value)
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [x, y, w, h] => Some(Self {
                x: *x,
                y: *y,
                w: *w,
                h: *h,
            }),
            _ => None,
        }
    }
}

/// Background parameters of the current overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Background {
    pub image: Option<String>,
    pub rect: Option<BackgroundRect>,
    pub full_screen: bool,
}

/// Ordered overlays plus the current-overlay pointer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigDocument {
    overlays: Vec<Overlay>,
    current: Option<usize>,
    #[serde(skip)]
    next_id: u64,
}

impl ConfigDocument {
    /// Create an empty document with no overlays.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mint_id(&mut self) -> ButtonId {
        let id = ButtonId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay(&self, index: usize) -> Option<&Overlay> {
        self.overlays.get(index)
    }

    /// Overlay names in document order.
    pub fn overlay_names(&self) -> Vec<&str> {
        self.overlays
            .iter()
            .map(|overlay| overlay.name.as_str())
            .collect()
    }

    pub fn overlay_index(&self, name: &str) -> Option<usize> {
        self.overlays.iter().position(|overlay| overlay.name == name)
    }

    /// Case-sensitive name lookup.
    pub fn is_overlay_name_exist(&self, name: &str) -> bool {
        self.overlay_index(name).is_some()
    }

    pub fn current_overlay_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_overlay(&self) -> Option<&Overlay> {
        self.current.and_then(|index| self.overlays.get(index))
    }

    pub(crate) fn current_overlay_mut(&mut self) -> Option<&mut Overlay> {
        self.current.and_then(|index| self.overlays.get_mut(index))
    }

    /// Buttons of the current overlay, empty when there is none.
    pub fn current_buttons(&self) -> &[Button] {
        self.current_overlay()
            .map(|overlay| overlay.buttons.as_slice())
            .unwrap_or(&[])
    }

    /// Select the overlay edited by overlay-scoped operations.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] when `index` is out of range.
    pub fn set_current_overlay(&mut self, index: usize) -> Result<(), EditorError> {
        if index >= self.overlays.len() {
            return Err(EditorError::not_found(format!("overlay #{}", index)));
        }
        self.current = Some(index);
        Ok(())
    }

    /// Restore a saved overlay index, clamping it into range.
    pub(crate) fn restore_current_overlay(&mut self, index: Option<usize>) {
        self.current = match (index, self.overlays.len()) {
            (_, 0) => None,
            (Some(index), len) => Some(index.min(len - 1)),
            (None, _) => Some(0),
        };
    }

    /// Documents are portrait when their first overlay is named that way.
    pub fn is_portrait(&self) -> bool {
        self.overlays
            .first()
            .map(Overlay::is_portrait)
            .unwrap_or(false)
    }

    /// Aspect ratio declared by the current overlay.
    pub fn overlay_aspect_ratio(&self) -> Option<AspectRatio> {
        self.current_overlay()?
            .known(KnownKey::AspectRatio)
            .and_then(AspectRatio::parse)
    }

    /// Background image and placement of the current overlay.
    pub fn current_overlay_background(&self) -> Option<Background> {
        let overlay = self.current_overlay()?;
        Some(Background {
            image: overlay
                .known(KnownKey::Overlay)
                .map(strip_quotes)
                .filter(|image| !image.is_empty())
                .map(str::to_string),
            rect: overlay.known(KnownKey::Rect).and_then(BackgroundRect::parse),
            full_screen: overlay
                .known(KnownKey::FullScreen)
                .map(|value| strip_quotes(value).eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Overlay and button position of a handle.
    pub fn locate(&self, id: ButtonId) -> Option<(usize, usize)> {
        self.overlays
            .iter()
            .enumerate()
            .find_map(|(overlay_index, overlay)| {
                overlay
                    .position_of(id)
                    .map(|button_index| (overlay_index, button_index))
            })
    }

    pub fn button(&self, id: ButtonId) -> Option<&Button> {
        let (overlay, button) = self.locate(id)?;
        self.overlays.get(overlay)?.buttons.get(button)
    }

    pub(crate) fn button_mut(&mut self, id: ButtonId) -> Option<&mut Button> {
        let (overlay, button) = self.locate(id)?;
        self.overlays.get_mut(overlay)?.buttons.get_mut(button)
    }

    fn require_button_mut(&mut self, id: ButtonId) -> Result<&mut Button, EditorError> {
        self.button_mut(id)
            .ok_or_else(|| EditorError::not_found(format!("button {}", id)))
    }

    /// Total number of buttons across overlays.
    pub fn button_count(&self) -> usize {
        self.overlays.iter().map(|overlay| overlay.buttons.len()).sum()
    }

    /// Append an overlay and make it current.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] for empty or duplicate names and
    /// reserved or malformed header keys.
    pub fn create_overlay(&mut self, name: &str, lines: Vec<RawLine>) -> Result<(), EditorError> {
        let name = self.validate_new_overlay_name(name, None)?;
        let header = header_fields(lines)?;
        debug!(overlay = name.as_str(), "create overlay");
        self.overlays.push(Overlay::new(name, header));
        self.current = Some(self.overlays.len() - 1);
        Ok(())
    }

    /// Append a copy of the current overlay's buttons under a new name.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] without a current overlay, or the
    /// validation errors of [`ConfigDocument::create_overlay`].
    pub fn duplicate_overlay(&mut self, name: &str, lines: Vec<RawLine>) -> Result<(), EditorError> {
        let source = self
            .current_overlay()
            .ok_or_else(|| EditorError::not_found("current overlay"))?
            .buttons
            .clone();
        let name = self.validate_new_overlay_name(name, None)?;
        let header = header_fields(lines)?;
        let mut overlay = Overlay::new(name, header);
        for button in &source {
            let id = self.mint_id();
            overlay.buttons.push(button.cloned_as(id));
        }
        debug!(overlay = overlay.name.as_str(), buttons = source.len(), "duplicate overlay");
        self.overlays.push(overlay);
        self.current = Some(self.overlays.len() - 1);
        Ok(())
    }

    /// Rename the current overlay and replace its header lines.
    ///
    /// Buttons whose `next_target` pointed at the old name follow the rename.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] without a current overlay and
    /// [`EditorError::Validation`] for invalid names or header lines.
    pub fn edit_overlay(&mut self, name: &str, lines: Vec<RawLine>) -> Result<(), EditorError> {
        let index = self
            .current
            .ok_or_else(|| EditorError::not_found("current overlay"))?;
        let name = self.validate_new_overlay_name(name, Some(index))?;
        let header = header_fields(lines)?;
        let old_name = std::mem::replace(&mut self.overlays[index].name, name.clone());
        self.overlays[index].header = header;
        if old_name != name {
            self.retarget_next_target(&old_name, &name);
        }
        debug!(from = old_name.as_str(), to = name.as_str(), "edit overlay");
        Ok(())
    }

    fn retarget_next_target(&mut self, old_name: &str, new_name: &str) {
        let lines = self
            .overlays
            .iter_mut()
            .flat_map(|overlay| overlay.buttons.iter_mut())
            .flat_map(|button| button.extra.iter_mut())
            .filter(|line| line.key == NEXT_TARGET_KEY && strip_quotes(&line.value) == old_name);
        for line in lines {
            line.value = if line.value.starts_with('"') {
                quote(new_name)
            } else {
                new_name.to_string()
            };
        }
    }

    /// Remove the current overlay.
    ///
    /// # Returns
    /// The removed overlay.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] when no overlay is current.
    pub fn delete_overlay(&mut self) -> Result<Overlay, EditorError> {
        let index = self
            .current
            .filter(|index| *index < self.overlays.len())
            .ok_or_else(|| EditorError::not_found("current overlay"))?;
        let removed = self.overlays.remove(index);
        self.current = if self.overlays.is_empty() { None } else { Some(0) };
        debug!(overlay = removed.name.as_str(), "delete overlay");
        Ok(removed)
    }

    /// Append a button to the current overlay at the default position.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] without a current overlay or
    /// [`EditorError::Validation`] for an invalid spec.
    pub fn create_button(&mut self, spec: ButtonSpec) -> Result<ButtonId, EditorError> {
        let spec = spec.normalized()?;
        if self.current_overlay().is_none() {
            return Err(EditorError::not_found("current overlay"));
        }
        let id = self.mint_id();
        let button = Button::with_id(
            id,
            spec,
            NEW_BUTTON_CENTER,
            NEW_BUTTON_CENTER,
            NEW_BUTTON_EXTENT,
            NEW_BUTTON_EXTENT,
        );
        debug!(button = %id, command = button.command.as_str(), "create button");
        if let Some(overlay) = self.current_overlay_mut() {
            overlay.buttons.push(button);
        }
        Ok(id)
    }

    pub(crate) fn insert_button_after(&mut self, source: ButtonId, button: Button) -> bool {
        let Some((overlay, index)) = self.locate(source) else {
            return false;
        };
        self.overlays[overlay].buttons.insert(index + 1, button);
        true
    }

    /// Replace the command, shape, image and extra lines of a button.
    ///
    /// Geometry is left untouched.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] for an invalid spec and
    /// [`EditorError::NotFound`] for an unknown handle.
    pub fn update_button(&mut self, id: ButtonId, spec: ButtonSpec) -> Result<(), EditorError> {
        let spec = spec.normalized()?;
        let button = self.require_button_mut(id)?;
        button.command = spec.command;
        button.shape = spec.shape;
        button.image = spec.image;
        button.extra = spec.extra;
        debug!(button = %id, "update button");
        Ok(())
    }

    /// Remove a button.
    ///
    /// # Returns
    /// `false` when the handle does not address a button.
    pub fn delete_button(&mut self, id: ButtonId) -> bool {
        let Some((overlay, index)) = self.locate(id) else {
            return false;
        };
        self.overlays[overlay].buttons.remove(index);
        debug!(button = %id, "delete button");
        true
    }

    /// Write one validated numeric field.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] for out-of-domain values and
    /// [`EditorError::NotFound`] for an unknown handle.
    pub fn set_section_value(
        &mut self,
        id: ButtonId,
        section: Section,
        value: f64,
    ) -> Result<(), EditorError> {
        let value = section.validate(value)?;
        let button = self.require_button_mut(id)?;
        section.set(button, value);
        Ok(())
    }

    /// # Errors
    /// Returns [`EditorError::Validation`] or [`EditorError::NotFound`].
    pub fn set_command(&mut self, id: ButtonId, command: &str) -> Result<(), EditorError> {
        let command = normalize_command(command)?;
        self.require_button_mut(id)?.command = command;
        Ok(())
    }

    /// # Errors
    /// Returns [`EditorError::Validation`] or [`EditorError::NotFound`].
    pub fn set_image(&mut self, id: ButtonId, image: Option<&str>) -> Result<(), EditorError> {
        let image = normalize_image(image)?;
        self.require_button_mut(id)?.image = image;
        Ok(())
    }

    /// # Errors
    /// Returns [`EditorError::NotFound`] for an unknown handle.
    pub fn set_shape(&mut self, id: ButtonId, shape: Shape) -> Result<(), EditorError> {
        self.require_button_mut(id)?.shape = shape;
        Ok(())
    }

    fn validate_new_overlay_name(
        &self,
        name: &str,
        editing: Option<usize>,
    ) -> Result<String, EditorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::invalid("overlay name is empty"));
        }
        if name.contains(['"', '\n', '\r']) {
            return Err(EditorError::invalid(format!(
                "overlay name '{}' contains a reserved character",
                name
            )));
        }
        match self.overlay_index(name) {
            Some(existing) if Some(existing) != editing => Err(EditorError::invalid(format!(
                "overlay '{}' already exists",
                name
            ))),
            _ => Ok(name.to_string()),
        }
    }
}

fn header_fields(lines: Vec<RawLine>) -> Result<Vec<Field>, EditorError> {
    lines
        .into_iter()
        .map(|line| {
            let line = RawLine::new(line.key, line.value);
            if !is_property_key(&line.key) {
                return Err(EditorError::invalid(format!(
                    "invalid overlay property key '{}'",
                    line.key
                )));
            }
            if is_reserved_header_key(&line.key) {
                return Err(EditorError::invalid(format!(
                    "overlay property '{}' is managed by the editor",
                    line.key
                )));
            }
            if line.value.contains(['\n', '\r']) {
                return Err(EditorError::invalid(format!(
                    "overlay property '{}' spans multiple lines",
                    line.key
                )));
            }
            Ok(Field::from(line))
        })
        .collect()
}
