//! Editor session: one document, its selection and its undo history.
//!
//! Every logical edit goes through the session so the pre-edit state is
//! snapshotted exactly once and only when the edit succeeds. Continuous
//! gestures (drags, resizes, slider scrubs) share one snapshot between
//! [`EditorSession::begin_gesture`] calls.

#[cfg(test)]
mod tests;

use crate::config::EditorSettings;
use crate::document::ConfigDocument;
use crate::error::EditorError;
use crate::geometry::{self, AlignMode, Axis, ButtonGeometry, ResizeHandle};
use crate::history::{HistoryManager, HistorySnapshot};
use crate::models::{ButtonId, ButtonSpec, RawLine, Section, Shape};
use crate::naming::{default_overlay_params, generate_overlay_name};
use crate::pad::{build_pad, PadButton};
use crate::screen::ScreenSize;
use crate::selection::{Selection, SelectionDimensions, SelectionRect};
use tracing::{debug, info, warn};

/// Movement below this many normalized units does not start a drag.
const DRAG_THRESHOLD: f64 = 0.001;

/// Fields changed together by the button dialog when a group is selected.
///
/// `None` leaves the field alone; `image: Some(None)` clears images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchEdit {
    pub command: Option<String>,
    pub image: Option<Option<String>>,
    pub shape: Option<Shape>,
}

#[derive(Debug, Clone)]
enum GestureKind {
    Drag(Vec<(ButtonId, ButtonGeometry)>),
    Resize {
        id: ButtonId,
        handle: ResizeHandle,
        start: ButtonGeometry,
    },
}

/// Owns the editable state of one open config.
#[derive(Debug)]
pub struct EditorSession {
    document: ConfigDocument,
    selection: Selection,
    history: HistoryManager,
    settings: EditorSettings,
    screen: ScreenSize,
    screen_set_by_user: bool,
    gesture_pushed: bool,
    gesture: Option<GestureKind>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl EditorSession {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            document: ConfigDocument::new(),
            selection: Selection::new(),
            history: HistoryManager::new(settings.history_limit),
            screen: ScreenSize {
                width: settings.screen_width,
                height: settings.screen_height,
                is_portrait: false,
            },
            settings,
            screen_set_by_user: false,
            gesture_pushed: false,
            gesture: None,
        }
    }

    /// Parse `text` and start a fresh session on it.
    ///
    /// History and selection are cleared. On a parse error the session is
    /// left exactly as it was.
    ///
    /// # Errors
    /// Returns [`EditorError::Parse`] for malformed config text.
    pub fn load(&mut self, text: &str) -> Result<(), EditorError> {
        let document = ConfigDocument::parse(text)?;
        info!(
            overlays = document.overlays().len(),
            buttons = document.button_count(),
            "loaded config"
        );
        self.document = document;
        self.selection.clear();
        self.history.clear();
        self.gesture = None;
        self.refresh_screen(Some(self.document.is_portrait()));
        Ok(())
    }

    /// Drop everything and start from an empty document.
    pub fn reset(&mut self) {
        self.document = ConfigDocument::new();
        self.selection.clear();
        self.history.clear();
        self.gesture = None;
        info!("session reset");
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    pub fn serialize(&self) -> String {
        self.document.serialize()
    }

    /// Fix the preview size; later overlay switches keep it.
    pub fn set_screen_size(&mut self, width: f64, height: f64) -> Result<(), EditorError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(EditorError::invalid(format!(
                "screen size must be positive, got {}x{}",
                width, height
            )));
        }
        self.screen.width = width;
        self.screen.height = height;
        self.screen_set_by_user = true;
        Ok(())
    }

    pub fn set_orientation(&mut self, is_portrait: bool) {
        self.refresh_screen(Some(is_portrait));
    }

    fn refresh_screen(&mut self, is_portrait: Option<bool>) {
        let is_portrait = is_portrait.unwrap_or(self.screen.is_portrait);
        if self.screen_set_by_user {
            self.screen.is_portrait = is_portrait;
            return;
        }
        self.screen = ScreenSize::for_aspect(self.document.overlay_aspect_ratio(), is_portrait);
    }

    fn snapshot(&self, description: &str) -> HistorySnapshot {
        HistorySnapshot {
            text: self.document.serialize(),
            current_overlay: self.document.current_overlay_index(),
            description: description.to_string(),
        }
    }

    /// Record the current state as an undo point.
    pub fn push_state(&mut self, description: &str) {
        let snapshot = self.snapshot(description);
        self.history.push(snapshot);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Revert the last edit.
    ///
    /// A snapshot that no longer parses leaves the session and both stacks
    /// untouched.
    ///
    /// # Returns
    /// `false` when there was nothing to undo or the snapshot is unusable.
    pub fn undo(&mut self) -> bool {
        let Some(document) = self.history.peek_undo().and_then(parse_snapshot) else {
            return false;
        };
        let current = self.snapshot("");
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        info!(edit = previous.description.as_str(), "undo");
        self.install(document);
        true
    }

    /// Re-apply the last undone edit.
    ///
    /// # Returns
    /// `false` when there was nothing to redo or the snapshot is unusable.
    pub fn redo(&mut self) -> bool {
        let Some(document) = self.history.peek_redo().and_then(parse_snapshot) else {
            return false;
        };
        let current = self.snapshot("");
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        info!(edit = next.description.as_str(), "redo");
        self.install(document);
        true
    }

    fn install(&mut self, document: ConfigDocument) {
        self.document = document;
        self.selection.clear();
        self.gesture = None;
    }

    /// Start a continuous gesture; its first successful step records undo.
    pub fn begin_gesture(&mut self) {
        self.gesture_pushed = false;
        self.gesture = None;
    }

    /// Record undo for the running gesture unless already recorded.
    ///
    /// # Returns
    /// `true` when a snapshot was pushed.
    pub fn gesture_step(&mut self, description: &str) -> bool {
        if self.gesture_pushed {
            return false;
        }
        self.push_state(description);
        self.gesture_pushed = true;
        true
    }

    pub fn end_gesture(&mut self) {
        self.gesture = None;
    }

    fn edit<T, F>(&mut self, description: &str, action: F) -> Result<T, EditorError>
    where
        F: FnOnce(&mut Self) -> Result<T, EditorError>,
    {
        let before = self.snapshot(description);
        let value = action(self)?;
        self.history.push(before);
        self.selection.prune(&self.document);
        debug!(edit = description, "recorded edit");
        Ok(value)
    }

    fn gesture_edit<T, F>(&mut self, description: &str, action: F) -> Result<T, EditorError>
    where
        F: FnOnce(&mut Self) -> Result<T, EditorError>,
    {
        let before = (!self.gesture_pushed).then(|| self.snapshot(description));
        let value = action(self)?;
        if let Some(before) = before {
            self.history.push(before);
            self.gesture_pushed = true;
        }
        Ok(value)
    }

    /// Make another overlay current; the selection is dropped.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] for an out-of-range index.
    pub fn select_overlay(&mut self, index: usize) -> Result<(), EditorError> {
        self.document.set_current_overlay(index)?;
        self.selection.clear();
        self.refresh_screen(None);
        Ok(())
    }

    /// Name the next generated overlay would get.
    pub fn suggest_overlay_name(&self, is_portrait: bool) -> String {
        generate_overlay_name(&self.document, is_portrait)
    }

    /// # Errors
    /// See [`ConfigDocument::create_overlay`].
    pub fn create_overlay(&mut self, name: &str, lines: Vec<RawLine>) -> Result<(), EditorError> {
        self.edit("Add overlay", |session| {
            session.document.create_overlay(name, lines)?;
            session.selection.clear();
            Ok(())
        })
    }

    /// # Errors
    /// See [`ConfigDocument::duplicate_overlay`].
    pub fn duplicate_overlay(&mut self, name: &str, lines: Vec<RawLine>) -> Result<(), EditorError> {
        self.edit("Duplicate overlay", |session| {
            session.document.duplicate_overlay(name, lines)?;
            session.selection.clear();
            Ok(())
        })
    }

    /// Add an overlay with a generated name and the default parameters,
    /// optionally copying the current overlay's buttons.
    ///
    /// # Returns
    /// The generated name.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] when duplicating without a current
    /// overlay.
    pub fn add_generated_overlay(
        &mut self,
        is_portrait: bool,
        duplicate: bool,
    ) -> Result<String, EditorError> {
        let name = self.suggest_overlay_name(is_portrait);
        let params = default_overlay_params();
        if duplicate {
            self.duplicate_overlay(&name, params)?;
        } else {
            self.create_overlay(&name, params)?;
        }
        Ok(name)
    }

    /// # Errors
    /// See [`ConfigDocument::edit_overlay`].
    pub fn edit_overlay(&mut self, name: &str, lines: Vec<RawLine>) -> Result<(), EditorError> {
        self.edit("Edit overlay", |session| {
            session.document.edit_overlay(name, lines)?;
            session.refresh_screen(None);
            Ok(())
        })
    }

    /// # Errors
    /// Returns [`EditorError::NotFound`] without a current overlay.
    pub fn delete_overlay(&mut self) -> Result<String, EditorError> {
        self.edit("Delete overlay", |session| {
            let removed = session.document.delete_overlay()?;
            session.selection.clear();
            Ok(removed.name)
        })
    }

    /// Add a button to the current overlay and select it.
    ///
    /// # Errors
    /// See [`ConfigDocument::create_button`].
    pub fn create_button(&mut self, spec: ButtonSpec) -> Result<ButtonId, EditorError> {
        self.edit("Add button", |session| {
            let id = session.document.create_button(spec)?;
            session.selection.reset_group_selection();
            session.selection.set_current(Some(id));
            Ok(id)
        })
    }

    /// # Errors
    /// See [`ConfigDocument::update_button`].
    pub fn update_button(&mut self, id: ButtonId, spec: ButtonSpec) -> Result<(), EditorError> {
        self.edit("Edit button", |session| session.document.update_button(id, spec))
    }

    /// Apply dialog fields to every selection target.
    ///
    /// Every field is validated before any button changes.
    ///
    /// # Returns
    /// Number of buttons updated.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] for an invalid command or image and
    /// [`EditorError::NotFound`] when nothing is selected.
    pub fn apply_batch_edit(&mut self, batch: BatchEdit) -> Result<usize, EditorError> {
        if self.selection.targets().is_empty() {
            return Err(EditorError::not_found("selected buttons"));
        }
        let mut probe = ButtonSpec::new(batch.command.clone().unwrap_or_default(), Shape::Rect);
        probe.image = batch.image.clone().flatten();
        probe.normalized()?;

        self.edit("Edit buttons", |session| {
            let selection = &session.selection;
            let document = &mut session.document;
            let mut touched = selection.targets().len();
            if let Some(command) = &batch.command {
                touched = selection.set_selection_command(document, command)?;
            }
            if let Some(image) = &batch.image {
                touched = selection.set_selection_image(document, image.as_deref())?;
            }
            if let Some(shape) = batch.shape {
                touched = selection.set_selection_shape(document, shape);
            }
            Ok(touched)
        })
    }

    /// Delete a single button.
    ///
    /// # Returns
    /// `false` when the handle does not resolve; nothing is recorded then.
    pub fn delete_button(&mut self, id: ButtonId) -> bool {
        self.edit("Delete button", |session| {
            if session.document.delete_button(id) {
                Ok(())
            } else {
                Err(EditorError::not_found(format!("button {}", id)))
            }
        })
        .is_ok()
    }

    /// Delete every selection target.
    ///
    /// # Returns
    /// Number of buttons removed.
    pub fn delete_selected(&mut self) -> usize {
        let targets = self.selection.targets();
        if targets.is_empty() {
            return 0;
        }
        self.edit("Delete buttons", |session| {
            let removed = targets
                .iter()
                .filter(|id| session.document.delete_button(**id))
                .count();
            session.selection.clear();
            Ok(removed)
        })
        .unwrap_or(0)
    }

    /// Make `id` the single selection; `None` deselects everything.
    pub fn select_button(&mut self, id: Option<ButtonId>) {
        self.selection.reset_group_selection();
        self.selection
            .set_current(id.filter(|id| self.document.button(*id).is_some()));
    }

    /// Rubber-band select; a single hit becomes the current line.
    pub fn select_in_bounds(&mut self, rect: SelectionRect) -> Vec<ButtonId> {
        let hits = self.selection.select_buttons_in_bounds(&self.document, rect);
        self.selection.collapse_single();
        hits
    }

    pub fn select_all(&mut self) -> Vec<ButtonId> {
        self.selection
            .select_buttons_in_bounds(&self.document, SelectionRect::FULL)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection_dimensions(&self) -> Option<SelectionDimensions> {
        self.selection.selection_dimensions(&self.document)
    }

    fn current_target(&self) -> Result<ButtonId, EditorError> {
        self.selection
            .current()
            .filter(|id| self.document.button(*id).is_some())
            .ok_or_else(|| EditorError::not_found("current button"))
    }

    fn snap_section(&self, section: Section, value: f64) -> f64 {
        match section {
            Section::X | Section::Y => self.settings.grid().snap(value),
            Section::W | Section::H => value,
        }
    }

    /// Set one numeric field on the selection targets, snapping x/y when
    /// grid snap is on.
    ///
    /// # Returns
    /// Number of buttons updated.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] for out-of-domain values and
    /// [`EditorError::NotFound`] when nothing is selected.
    pub fn apply_section_value(&mut self, section: Section, value: f64) -> Result<usize, EditorError> {
        let value = self.snap_section(section, value);
        self.edit("Edit value", |session| session.write_section(section, value))
    }

    /// Like [`EditorSession::apply_section_value`] but records undo once per
    /// gesture, for slider scrubbing.
    pub fn scrub_section_value(&mut self, section: Section, value: f64) -> Result<usize, EditorError> {
        let value = self.snap_section(section, value);
        self.gesture_edit("Edit value", |session| session.write_section(section, value))
    }

    fn write_section(&mut self, section: Section, value: f64) -> Result<usize, EditorError> {
        if self.selection.is_group_selected() {
            return self
                .selection
                .set_selection_section_value(&mut self.document, section, value);
        }
        let id = self.current_target()?;
        self.document.set_section_value(id, section, value)?;
        Ok(1)
    }

    /// Mirror the current button horizontally.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] without a current button.
    pub fn flip_x(&mut self) -> Result<f64, EditorError> {
        let id = self.current_target()?;
        self.edit("Flip X", |session| {
            geometry::flip_x(&mut session.document, id)
                .ok_or_else(|| EditorError::not_found(format!("button {}", id)))
        })
    }

    /// Square the current button by adjusting its width.
    pub fn normalize_width(&mut self) -> Result<f64, EditorError> {
        let id = self.current_target()?;
        let ScreenSize { width, height, .. } = self.screen;
        self.edit("Make Square", |session| {
            geometry::normalize_width(&mut session.document, id, width, height)
        })
    }

    /// Square the current button by adjusting its height.
    pub fn normalize_height(&mut self) -> Result<f64, EditorError> {
        let id = self.current_target()?;
        let ScreenSize { width, height, .. } = self.screen;
        self.edit("Make Square", |session| {
            geometry::normalize_height(&mut session.document, id, width, height)
        })
    }

    /// Re-target the current overlay to a new display aspect.
    ///
    /// Target sizes that look like a resolution (at least 96x64) also become
    /// the preview size. The selection is cleared.
    pub fn fix_aspect(
        &mut self,
        old: (f64, f64),
        new: (f64, f64),
        keep_relative: bool,
    ) -> Result<usize, EditorError> {
        let is_portrait = self.screen.is_portrait;
        let count = self.edit("Fix Aspect Ratio", |session| {
            geometry::fix_aspect(&mut session.document, old, new, is_portrait, keep_relative)
        })?;
        if new.0 >= 96.0 && new.1 >= 64.0 {
            self.screen.width = new.0;
            self.screen.height = new.1;
        }
        self.selection.clear();
        Ok(count)
    }

    /// Duplicate the selection targets by the configured offset.
    pub fn duplicate_selection(&mut self) -> Result<Vec<ButtonId>, EditorError> {
        if self.selection.targets().is_empty() {
            return Err(EditorError::not_found("selected buttons"));
        }
        let offset = self.settings.duplicate_offset;
        self.edit("Duplicate", |session| {
            Ok(geometry::duplicate_selected_buttons(
                &mut session.document,
                &mut session.selection,
                offset,
                offset,
            ))
        })
    }

    /// Align the group. Without a group nothing happens and nothing is recorded.
    pub fn align(&mut self, mode: AlignMode) -> usize {
        if !self.selection.is_group_selected() {
            return 0;
        }
        self.edit("Align", |session| {
            Ok(geometry::align_selection(&mut session.document, &session.selection, mode))
        })
        .unwrap_or(0)
    }

    pub fn distribute(&mut self, axis: Axis) -> usize {
        if !self.selection.is_group_selected() {
            return 0;
        }
        self.edit("Distribute", |session| {
            Ok(geometry::distribute_selection(
                &mut session.document,
                &session.selection,
                axis,
            ))
        })
        .unwrap_or(0)
    }

    pub fn nudge(&mut self, dx: f64, dy: f64) -> usize {
        let targets = self.selection.targets();
        if targets.is_empty() {
            return 0;
        }
        self.edit("Nudge", |session| {
            Ok(geometry::nudge(&mut session.document, &targets, dx, dy))
        })
        .unwrap_or(0)
    }

    /// Snap the selection targets' centers to the grid.
    pub fn snap_selection(&mut self) -> usize {
        let targets = self.selection.targets();
        if targets.is_empty() {
            return 0;
        }
        let size = self.settings.grid_size;
        self.edit("Snap", |session| {
            Ok(geometry::snap_to_grid(&mut session.document, &targets, size))
        })
        .unwrap_or(0)
    }

    /// Grab a button for dragging.
    ///
    /// A button inside the group drags the whole group; any other button
    /// becomes the single selection and drags alone.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] for an unknown handle.
    pub fn begin_drag(&mut self, id: ButtonId) -> Result<(), EditorError> {
        if self.document.button(id).is_none() {
            return Err(EditorError::not_found(format!("button {}", id)));
        }
        self.begin_gesture();
        let ids = if self.selection.selected().contains(&id) {
            self.selection.selected().to_vec()
        } else {
            self.select_button(Some(id));
            vec![id]
        };
        let starts = ids
            .into_iter()
            .filter_map(|id| {
                self.document
                    .button(id)
                    .map(|button| (id, ButtonGeometry::from(button)))
            })
            .collect();
        self.gesture = Some(GestureKind::Drag(starts));
        Ok(())
    }

    /// Grab a resize handle of a button, making it the single selection.
    ///
    /// # Errors
    /// Returns [`EditorError::NotFound`] for an unknown handle.
    pub fn begin_resize(&mut self, id: ButtonId, handle: ResizeHandle) -> Result<(), EditorError> {
        let start = self
            .document
            .button(id)
            .map(ButtonGeometry::from)
            .ok_or_else(|| EditorError::not_found(format!("button {}", id)))?;
        self.begin_gesture();
        self.select_button(Some(id));
        self.gesture = Some(GestureKind::Resize { id, handle, start });
        Ok(())
    }

    /// Move the running drag or resize to a pointer offset from its start.
    ///
    /// # Returns
    /// Number of buttons changed; 0 when no gesture runs or the pointer has
    /// not moved past the drag threshold yet.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> Result<usize, EditorError> {
        let Some(gesture) = self.gesture.clone() else {
            return Ok(0);
        };
        if !self.gesture_pushed && dx.abs() <= DRAG_THRESHOLD && dy.abs() <= DRAG_THRESHOLD {
            return Ok(0);
        }
        let grid = self.settings.grid();
        self.gesture_edit("Move/Resize", |session| match gesture {
            GestureKind::Drag(starts) => Ok(geometry::drag(
                &mut session.document,
                &starts,
                dx,
                dy,
                grid,
            )),
            GestureKind::Resize { id, handle, start } => {
                geometry::resize(&mut session.document, id, handle, start, dx, dy, grid)
                    .map(|_| 1)
            }
        })
    }

    /// Render view of the current overlay.
    pub fn build_pad(&self) -> Vec<PadButton> {
        build_pad(&self.document, &self.selection)
    }
}

fn parse_snapshot(snapshot: &HistorySnapshot) -> Option<ConfigDocument> {
    match ConfigDocument::parse(&snapshot.text) {
        Ok(mut document) => {
            document.restore_current_overlay(snapshot.current_overlay);
            Some(document)
        }
        Err(err) => {
            warn!(
                error = %err,
                edit = snapshot.description.as_str(),
                "history snapshot failed to parse"
            );
            None
        }
    }
}
