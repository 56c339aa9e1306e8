//! Current-line pointer, rectangular group selection and batch setters.

use crate::document::ConfigDocument;
use crate::error::EditorError;
use crate::models::{button::normalize_command, button::normalize_image, ButtonId, Section, Shape};
use serde::Serialize;

/// Query rectangle in normalized coordinates, given by its absolute edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl SelectionRect {
    /// The whole unit square.
    pub const FULL: SelectionRect = SelectionRect {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
    };

    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from a rubber band whose `right`/`bottom` are distances from the
    /// far edges, as laid out by the editor view.
    ///
    /// The result covers `[left, 1 - right] x [top, 1 - bottom]`.
    pub fn from_edge_insets(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right: 1.0 - right,
            bottom: 1.0 - bottom,
        }
    }

    /// Rectangle spanned by two drag points in any order.
    pub fn from_points(start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            left: start.0.min(end.0),
            top: start.1.min(end.1),
            right: start.0.max(end.0),
            bottom: start.1.max(end.1),
        }
    }

    /// Whether the box `[x-w, x+w] x [y-h, y+h]` touches this rectangle.
    pub fn intersects_box(&self, x: f64, y: f64, w: f64, h: f64) -> bool {
        x - w <= self.right && x + w >= self.left && y - h <= self.bottom && y + h >= self.top
    }
}

/// Aggregate geometry used to seed editor sliders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionDimensions {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl SelectionDimensions {
    pub fn get(&self, section: Section) -> f64 {
        match section {
            Section::X => self.x,
            Section::Y => self.y,
            Section::W => self.w,
            Section::H => self.h,
        }
    }
}

/// Selection state: `none`, `single` (current line) or `group`.
///
/// The current line and the group are independent; batch operations target
/// the group when it is non-empty and the current line otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<ButtonId>,
    group: Vec<ButtonId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the single selection at a button, or clear it with `None`.
    ///
    /// The group selection is left as is.
    pub fn set_current(&mut self, id: Option<ButtonId>) {
        self.current = id;
    }

    pub fn current(&self) -> Option<ButtonId> {
        self.current
    }

    pub fn is_group_selected(&self) -> bool {
        !self.group.is_empty()
    }

    pub fn reset_group_selection(&mut self) {
        self.group.clear();
    }

    /// Drop both the current line and the group.
    pub fn clear(&mut self) {
        self.current = None;
        self.group.clear();
    }

    /// Group members in document order.
    pub fn selected(&self) -> &[ButtonId] {
        &self.group
    }

    pub fn is_selected(&self, id: ButtonId) -> bool {
        self.group.contains(&id) || (self.group.is_empty() && self.current == Some(id))
    }

    /// Buttons a batch operation applies to.
    pub fn targets(&self) -> Vec<ButtonId> {
        if self.group.is_empty() {
            self.current.into_iter().collect()
        } else {
            self.group.clone()
        }
    }

    /// Replace the group, keeping document order and dropping duplicates.
    pub fn set_group(&mut self, doc: &ConfigDocument, ids: &[ButtonId]) {
        self.group = doc
            .overlays()
            .iter()
            .flat_map(|overlay| overlay.buttons.iter().map(|button| button.id()))
            .filter(|id| ids.contains(id))
            .collect();
    }

    /// Select every button of the current overlay whose box touches `rect`.
    ///
    /// # Returns
    /// Matching handles in document order; the group is set to the same list
    /// (an empty result clears the group).
    pub fn select_buttons_in_bounds(
        &mut self,
        doc: &ConfigDocument,
        rect: SelectionRect,
    ) -> Vec<ButtonId> {
        self.group = doc
            .current_buttons()
            .iter()
            .filter(|button| rect.intersects_box(button.x, button.y, button.w, button.h))
            .map(|button| button.id())
            .collect();
        self.group.clone()
    }

    /// Collapse a one-button group into a single selection.
    ///
    /// # Returns
    /// `true` when the group was collapsed.
    pub fn collapse_single(&mut self) -> bool {
        if self.group.len() != 1 {
            return false;
        }
        self.current = self.group.pop();
        true
    }

    /// Forget handles that no longer resolve in `doc`.
    pub fn prune(&mut self, doc: &ConfigDocument) {
        self.group.retain(|id| doc.button(*id).is_some());
        if self.current.is_some_and(|id| doc.button(id).is_none()) {
            self.current = None;
        }
    }

    /// Aggregate slider values for the targets: minimum x/y, maximum w/h.
    ///
    /// # Returns
    /// `None` when nothing is selected.
    pub fn selection_dimensions(&self, doc: &ConfigDocument) -> Option<SelectionDimensions> {
        let mut buttons = self.targets().into_iter().filter_map(|id| doc.button(id));
        let first = buttons.next()?;
        let seed = SelectionDimensions {
            x: first.x,
            y: first.y,
            w: first.w,
            h: first.h,
        };
        Some(buttons.fold(seed, |acc, button| SelectionDimensions {
            x: acc.x.min(button.x),
            y: acc.y.min(button.y),
            w: acc.w.max(button.w),
            h: acc.h.max(button.h),
        }))
    }

    /// Write one numeric field on every target.
    ///
    /// # Returns
    /// Number of buttons updated.
    ///
    /// # Errors
    /// Returns [`EditorError::Validation`] before touching any button when the
    /// value is out of domain.
    pub fn set_selection_section_value(
        &self,
        doc: &mut ConfigDocument,
        section: Section,
        value: f64,
    ) -> Result<usize, EditorError> {
        let value = section.validate(value)?;
        Ok(self.apply(doc, |doc, id| doc.set_section_value(id, section, value)))
    }

    /// # Errors
    /// Returns [`EditorError::Validation`] for an invalid command.
    pub fn set_selection_command(
        &self,
        doc: &mut ConfigDocument,
        command: &str,
    ) -> Result<usize, EditorError> {
        let command = normalize_command(command)?;
        Ok(self.apply(doc, |doc, id| doc.set_command(id, &command)))
    }

    /// # Errors
    /// Returns [`EditorError::Validation`] for an invalid image name.
    pub fn set_selection_image(
        &self,
        doc: &mut ConfigDocument,
        image: Option<&str>,
    ) -> Result<usize, EditorError> {
        let image = normalize_image(image)?;
        Ok(self.apply(doc, |doc, id| doc.set_image(id, image.as_deref())))
    }

    pub fn set_selection_shape(&self, doc: &mut ConfigDocument, shape: Shape) -> usize {
        self.apply(doc, |doc, id| doc.set_shape(id, shape))
    }

    fn apply<F>(&self, doc: &mut ConfigDocument, mut write: F) -> usize
    where
        F: FnMut(&mut ConfigDocument, ButtonId) -> Result<(), EditorError>,
    {
        self.targets()
            .into_iter()
            .filter(|id| write(doc, *id).is_ok())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = r#"
overlay0_name = "landscape-1"
overlay0_desc0 = "a,0.1,0.1,rect,0.05,0.05"
overlay0_desc1 = "b,0.5,0.5,radial,0.05,0.05"
overlay0_desc2 = "c,0.9,0.9,rect,0.05,0.05"
overlay0_desc3 = "off,1.3,0.5,rect,0.05,0.05"
overlay1_name = "portrait-1"
overlay1_desc0 = "p,0.5,0.5,rect,0.05,0.05"
"#;

    fn doc() -> ConfigDocument {
        ConfigDocument::parse(GRID).expect("fixture")
    }

    fn ids(doc: &ConfigDocument) -> Vec<ButtonId> {
        doc.current_buttons().iter().map(|b| b.id()).collect()
    }

    #[test]
    fn full_rect_selects_every_on_screen_button() {
        let doc = doc();
        let mut selection = Selection::new();
        let hits = selection.select_buttons_in_bounds(&doc, SelectionRect::FULL);
        let all = ids(&doc);
        assert_eq!(hits, all[..3].to_vec());
        assert_eq!(selection.selected(), &all[..3]);
        assert!(selection.is_group_selected());
    }

    #[test]
    fn edge_insets_measure_from_far_edges() {
        let doc = doc();
        let all = ids(&doc);
        let mut selection = Selection::new();

        // Band over the top-left corner: 0.75 in from the right and the bottom.
        let rect = SelectionRect::from_edge_insets(0.0, 0.0, 0.75, 0.75);
        assert_eq!(rect, SelectionRect::new(0.0, 0.0, 0.25, 0.25));
        assert_eq!(selection.select_buttons_in_bounds(&doc, rect), vec![all[0]]);

        // Band over the bottom-right corner.
        let rect = SelectionRect::from_edge_insets(0.8, 0.8, 0.0, 0.0);
        assert_eq!(selection.select_buttons_in_bounds(&doc, rect), vec![all[2]]);

        // Zero insets cover the whole square.
        let rect = SelectionRect::from_edge_insets(0.0, 0.0, 0.0, 0.0);
        assert_eq!(rect, SelectionRect::FULL);
    }

    #[test]
    fn partial_overlap_counts_as_hit() {
        let doc = doc();
        let all = ids(&doc);
        let mut selection = Selection::new();
        // Only the right half-extent of the first button reaches x = 0.14.
        let rect = SelectionRect::from_points((0.3, 0.3), (0.14, 0.0));
        assert_eq!(selection.select_buttons_in_bounds(&doc, rect), vec![all[0]]);
    }

    #[test]
    fn empty_hit_clears_group_but_keeps_current() {
        let doc = doc();
        let all = ids(&doc);
        let mut selection = Selection::new();
        selection.set_current(Some(all[1]));
        selection.select_buttons_in_bounds(&doc, SelectionRect::FULL);
        let hits = selection.select_buttons_in_bounds(&doc, SelectionRect::new(0.3, 0.0, 0.35, 0.05));
        assert!(hits.is_empty());
        assert!(!selection.is_group_selected());
        assert_eq!(selection.current(), Some(all[1]));
        assert_eq!(selection.targets(), vec![all[1]]);
    }

    #[test]
    fn single_hit_collapses_to_current_line() {
        let doc = doc();
        let all = ids(&doc);
        let mut selection = Selection::new();
        selection.select_buttons_in_bounds(&doc, SelectionRect::new(0.45, 0.45, 0.55, 0.55));
        assert!(selection.collapse_single());
        assert!(!selection.is_group_selected());
        assert_eq!(selection.current(), Some(all[1]));
        assert!(!selection.collapse_single());
    }

    #[test]
    fn dimensions_aggregate_group_and_fall_back_to_current() {
        let mut doc = doc();
        let all = ids(&doc);
        doc.set_section_value(all[2], Section::W, 0.2).expect("widen");
        let mut selection = Selection::new();
        assert_eq!(selection.selection_dimensions(&doc), None);

        selection.select_buttons_in_bounds(&doc, SelectionRect::FULL);
        let dims = selection.selection_dimensions(&doc).expect("dimensions");
        assert_eq!((dims.x, dims.y, dims.w, dims.h), (0.1, 0.1, 0.2, 0.05));

        selection.reset_group_selection();
        selection.set_current(Some(all[1]));
        let dims = selection.selection_dimensions(&doc).expect("single");
        assert_eq!(dims.get(Section::X), 0.5);
    }

    #[test]
    fn batch_setters_apply_to_group_and_validate_first() {
        let mut doc = doc();
        let mut selection = Selection::new();
        selection.select_buttons_in_bounds(&doc, SelectionRect::FULL);
        let before = doc.serialize();

        assert!(selection
            .set_selection_section_value(&mut doc, Section::H, 0.9)
            .is_err());
        assert!(selection.set_selection_command(&mut doc, "a b").is_err());
        assert_eq!(doc.serialize(), before);

        assert_eq!(
            selection
                .set_selection_section_value(&mut doc, Section::H, 0.1)
                .expect("valid height"),
            3
        );
        selection
            .set_selection_command(&mut doc, "turbo")
            .expect("command");
        selection
            .set_selection_image(&mut doc, Some("turbo.png"))
            .expect("image");
        assert_eq!(selection.set_selection_shape(&mut doc, Shape::Radial), 3);
        for id in selection.selected() {
            let button = doc.button(*id).expect("button");
            assert_eq!(button.h, 0.1);
            assert_eq!(button.command, "turbo");
            assert_eq!(button.image.as_deref(), Some("turbo.png"));
            assert_eq!(button.shape, Shape::Radial);
        }
        let off = doc.current_buttons()[3].clone();
        assert_eq!(off.command, "off");
    }

    #[test]
    fn prune_drops_deleted_handles() {
        let mut doc = doc();
        let all = ids(&doc);
        let mut selection = Selection::new();
        selection.select_buttons_in_bounds(&doc, SelectionRect::FULL);
        selection.set_current(Some(all[0]));
        assert!(doc.delete_button(all[0]));
        selection.prune(&doc);
        assert_eq!(selection.selected(), &all[1..3]);
        assert_eq!(selection.current(), None);
    }

    #[test]
    fn set_group_orders_by_document_position() {
        let doc = doc();
        let all = ids(&doc);
        let mut selection = Selection::new();
        selection.set_group(&doc, &[all[2], all[0], all[2]]);
        assert_eq!(selection.selected(), &[all[0], all[2]]);
        assert!(selection.is_selected(all[0]));
        assert!(!selection.is_selected(all[1]));
    }
}
