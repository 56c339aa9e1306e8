//! Geometry transforms over buttons: flips, squaring, aspect fixes,
//! duplication, alignment, distribution, nudging and handle resizes.
//!
//! Every computed coordinate is clamped into its section domain and rounded to
//! [`COORD_DECIMALS`] places before it is stored.


use crate::constants::{COORD_DECIMALS, DEFAULT_GRID_SIZE, MIN_RESIZE_EXTENT};
use crate::document::ConfigDocument;
use crate::error::EditorError;
use crate::models::{Button, ButtonId, Section};
use crate::selection::Selection;
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// Round a computed coordinate to the stored precision.
pub fn round_coord(value: f64) -> f64 {
    let factor = 10f64.powi(COORD_DECIMALS);
    (value * factor).round() / factor
}

/// Snap grid for positions and extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub size: f64,
    pub snap: bool,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            snap: false,
        }
    }
}

impl Grid {
    pub fn new(size: f64, snap: bool) -> Self {
        Self { size, snap }
    }

    /// Round `value` to the nearest grid multiple when snapping is on.
    pub fn snap(&self, value: f64) -> f64 {
        if !self.snap || self.size.is_nan() || self.size <= 0.0 {
            return value;
        }
        round_coord((value / self.size).round() * self.size)
    }
}

/// Center and half-extents of a button.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ButtonGeometry {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<&Button> for ButtonGeometry {
    fn from(button: &Button) -> Self {
        Self {
            x: button.x,
            y: button.y,
            w: button.w,
            h: button.h,
        }
    }
}

/// Alignment target for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignMode {
    Left,
    Right,
    Top,
    Bottom,
    CenterH,
    CenterV,
}

impl FromStr for AlignMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "left" => Ok(AlignMode::Left),
            "right" => Ok(AlignMode::Right),
            "top" => Ok(AlignMode::Top),
            "bottom" => Ok(AlignMode::Bottom),
            "center-h" => Ok(AlignMode::CenterH),
            "center-v" => Ok(AlignMode::CenterV),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            other => Err(format!("unknown axis '{}'", other)),
        }
    }
}

/// Compass handle grabbed on a button's outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl ResizeHandle {
    fn code(self) -> &'static str {
        match self {
            ResizeHandle::N => "n",
            ResizeHandle::NE => "ne",
            ResizeHandle::E => "e",
            ResizeHandle::SE => "se",
            ResizeHandle::S => "s",
            ResizeHandle::SW => "sw",
            ResizeHandle::W => "w",
            ResizeHandle::NW => "nw",
        }
    }

    fn has(self, side: char) -> bool {
        self.code().contains(side)
    }
}

impl FromStr for ResizeHandle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "n" => Ok(ResizeHandle::N),
            "ne" => Ok(ResizeHandle::NE),
            "e" => Ok(ResizeHandle::E),
            "se" => Ok(ResizeHandle::SE),
            "s" => Ok(ResizeHandle::S),
            "sw" => Ok(ResizeHandle::SW),
            "w" => Ok(ResizeHandle::W),
            "nw" => Ok(ResizeHandle::NW),
            other => Err(format!("unknown resize handle '{}'", other)),
        }
    }
}

fn store(doc: &mut ConfigDocument, id: ButtonId, section: Section, value: f64) -> Option<f64> {
    let value = section.clamp(round_coord(value));
    let button = doc.button_mut(id)?;
    section.set(button, value);
    Some(value)
}

fn store_geometry(doc: &mut ConfigDocument, id: ButtonId, geometry: ButtonGeometry) -> bool {
    let Some(button) = doc.button_mut(id) else {
        return false;
    };
    for (section, value) in [
        (Section::X, geometry.x),
        (Section::Y, geometry.y),
        (Section::W, geometry.w),
        (Section::H, geometry.h),
    ] {
        section.set(button, section.clamp(round_coord(value)));
    }
    true
}

/// Mirror a button horizontally: `x' = 1 - x`.
///
/// # Returns
/// The new x, or `None` when the handle does not resolve.
pub fn flip_x(doc: &mut ConfigDocument, id: ButtonId) -> Option<f64> {
    let x = doc.button(id)?.x;
    store(doc, id, Section::X, 1.0 - x)
}

fn check_screen(screen_w: f64, screen_h: f64) -> Result<(), EditorError> {
    if !(screen_w.is_finite() && screen_h.is_finite()) || screen_w <= 0.0 || screen_h <= 0.0 {
        return Err(EditorError::invalid(format!(
            "screen dimensions must be positive, got {}x{}",
            screen_w, screen_h
        )));
    }
    Ok(())
}

/// Make a button square on screen by recomputing its width from its height.
///
/// # Errors
/// Returns [`EditorError::Validation`] for non-positive screen dimensions and
/// [`EditorError::NotFound`] for an unknown handle.
pub fn normalize_width(
    doc: &mut ConfigDocument,
    id: ButtonId,
    screen_w: f64,
    screen_h: f64,
) -> Result<f64, EditorError> {
    check_screen(screen_w, screen_h)?;
    let h = doc
        .button(id)
        .ok_or_else(|| EditorError::not_found(format!("button {}", id)))?
        .h;
    store(doc, id, Section::W, h * screen_h / screen_w)
        .ok_or_else(|| EditorError::not_found(format!("button {}", id)))
}

/// Make a button square on screen by recomputing its height from its width.
///
/// # Errors
/// Same as [`normalize_width`].
pub fn normalize_height(
    doc: &mut ConfigDocument,
    id: ButtonId,
    screen_w: f64,
    screen_h: f64,
) -> Result<f64, EditorError> {
    check_screen(screen_w, screen_h)?;
    let w = doc
        .button(id)
        .ok_or_else(|| EditorError::not_found(format!("button {}", id)))?
        .w;
    store(doc, id, Section::H, w * screen_w / screen_h)
        .ok_or_else(|| EditorError::not_found(format!("button {}", id)))
}

/// Re-target the current overlay from one display aspect to another.
///
/// With `r = (long/short)_old / (long/short)_new`, landscape layouts scale x
/// around the center (`x' = 0.5 + (x - 0.5) * r`) and portrait layouts scale
/// y. Extents along the same axis scale by `r` unless `keep_relative`.
///
/// # Returns
/// Number of buttons rescaled.
///
/// # Errors
/// Returns [`EditorError::Validation`] for non-positive dimensions and
/// [`EditorError::NotFound`] without a current overlay.
pub fn fix_aspect(
    doc: &mut ConfigDocument,
    old: (f64, f64),
    new: (f64, f64),
    is_portrait: bool,
    keep_relative: bool,
) -> Result<usize, EditorError> {
    for (w, h) in [old, new] {
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(EditorError::invalid(format!(
                "aspect dimensions must be positive, got {}x{}",
                w, h
            )));
        }
    }
    let long_short = |(w, h): (f64, f64)| w.max(h) / w.min(h);
    let ratio = long_short(old) / long_short(new);
    let (position, extent) = if is_portrait {
        (Section::Y, Section::H)
    } else {
        (Section::X, Section::W)
    };

    let overlay = doc
        .current_overlay_mut()
        .ok_or_else(|| EditorError::not_found("current overlay"))?;
    for button in &mut overlay.buttons {
        let moved = 0.5 + (position.get(button) - 0.5) * ratio;
        position.set(button, position.clamp(round_coord(moved)));
        if !keep_relative {
            let scaled = extent.get(button) * ratio;
            extent.set(button, extent.clamp(round_coord(scaled)));
        }
    }
    debug!(ratio, portrait = is_portrait, keep_relative, "fix aspect");
    Ok(overlay.buttons.len())
}

fn clone_offset(doc: &mut ConfigDocument, source: ButtonId, dx: f64, dy: f64) -> Option<ButtonId> {
    let original = doc.button(source)?.clone();
    let id = doc.mint_id();
    let mut copy = original.cloned_as(id);
    copy.x = Section::X.clamp(round_coord(copy.x + dx));
    copy.y = Section::Y.clamp(round_coord(copy.y + dy));
    doc.insert_button_after(source, copy).then_some(id)
}

/// Clone one button right after itself, offset by `(dx, dy)`, and make the
/// clone the single selection.
pub fn duplicate_button(
    doc: &mut ConfigDocument,
    selection: &mut Selection,
    id: ButtonId,
    dx: f64,
    dy: f64,
) -> Option<ButtonId> {
    let copy = clone_offset(doc, id, dx, dy)?;
    selection.reset_group_selection();
    selection.set_current(Some(copy));
    debug!(source = %id, copy = %copy, "duplicate button");
    Some(copy)
}

/// Clone every selection target; clones replace the selection.
///
/// A group selection stays a group of the clones; a single selection moves to
/// its clone.
pub fn duplicate_selected_buttons(
    doc: &mut ConfigDocument,
    selection: &mut Selection,
    dx: f64,
    dy: f64,
) -> Vec<ButtonId> {
    let grouped = selection.is_group_selected();
    let copies: Vec<ButtonId> = selection
        .targets()
        .into_iter()
        .filter_map(|id| clone_offset(doc, id, dx, dy))
        .collect();
    if copies.is_empty() {
        return copies;
    }
    if grouped {
        selection.set_group(doc, &copies);
    } else {
        selection.set_current(copies.first().copied());
    }
    debug!(count = copies.len(), "duplicate selection");
    copies
}

fn target_geometry(doc: &ConfigDocument, selection: &Selection) -> Vec<(ButtonId, ButtonGeometry)> {
    selection
        .targets()
        .into_iter()
        .filter_map(|id| doc.button(id).map(|button| (id, ButtonGeometry::from(button))))
        .collect()
}

/// Line the selected buttons up against the group's bounding box.
///
/// # Returns
/// Number of buttons moved; groups of fewer than two are left alone.
pub fn align_selection(doc: &mut ConfigDocument, selection: &Selection, mode: AlignMode) -> usize {
    let items = target_geometry(doc, selection);
    if items.len() < 2 {
        return 0;
    }
    let min_of = |f: fn(&ButtonGeometry) -> f64| {
        items.iter().map(|(_, g)| f(g)).fold(f64::INFINITY, f64::min)
    };
    let max_of = |f: fn(&ButtonGeometry) -> f64| {
        items
            .iter()
            .map(|(_, g)| f(g))
            .fold(f64::NEG_INFINITY, f64::max)
    };
    let left = min_of(|g| g.x - g.w);
    let right = max_of(|g| g.x + g.w);
    let top = min_of(|g| g.y - g.h);
    let bottom = max_of(|g| g.y + g.h);

    for (id, geometry) in &items {
        let (section, value) = match mode {
            AlignMode::Left => (Section::X, left + geometry.w),
            AlignMode::Right => (Section::X, right - geometry.w),
            AlignMode::CenterH => (Section::X, (left + right) / 2.0),
            AlignMode::Top => (Section::Y, top + geometry.h),
            AlignMode::Bottom => (Section::Y, bottom - geometry.h),
            AlignMode::CenterV => (Section::Y, (top + bottom) / 2.0),
        };
        store(doc, *id, section, value);
    }
    debug!(?mode, count = items.len(), "align selection");
    items.len()
}

/// Space three or more selected buttons evenly along `axis`.
///
/// The outermost centers stay put.
///
/// # Returns
/// Number of buttons considered; fewer than three is a no-op returning 0.
pub fn distribute_selection(doc: &mut ConfigDocument, selection: &Selection, axis: Axis) -> usize {
    let section = match axis {
        Axis::X => Section::X,
        Axis::Y => Section::Y,
    };
    let mut items: Vec<(ButtonId, f64)> = target_geometry(doc, selection)
        .into_iter()
        .map(|(id, geometry)| {
            let value = match axis {
                Axis::X => geometry.x,
                Axis::Y => geometry.y,
            };
            (id, value)
        })
        .collect();
    if items.len() < 3 {
        return 0;
    }
    items.sort_by(|a, b| a.1.total_cmp(&b.1));
    let first = items[0].1;
    let last = items[items.len() - 1].1;
    let step = (last - first) / (items.len() - 1) as f64;
    let inner = items.len() - 1;
    for (index, (id, _)) in items.iter().enumerate().take(inner).skip(1) {
        store(doc, *id, section, first + step * index as f64);
    }
    debug!(?axis, count = items.len(), "distribute selection");
    items.len()
}

/// Move buttons by a fixed offset.
///
/// # Returns
/// Number of handles that resolved.
pub fn nudge(doc: &mut ConfigDocument, ids: &[ButtonId], dx: f64, dy: f64) -> usize {
    ids.iter()
        .filter(|id| match doc.button(**id).map(ButtonGeometry::from) {
            Some(start) => store_geometry(
                doc,
                **id,
                ButtonGeometry {
                    x: start.x + dx,
                    y: start.y + dy,
                    ..start
                },
            ),
            None => false,
        })
        .count()
}

/// Move buttons from their gesture start positions, snapping each center.
///
/// # Returns
/// Number of handles that resolved.
pub fn drag(
    doc: &mut ConfigDocument,
    starts: &[(ButtonId, ButtonGeometry)],
    dx: f64,
    dy: f64,
    grid: Grid,
) -> usize {
    starts
        .iter()
        .filter(|(id, start)| {
            store_geometry(
                doc,
                *id,
                ButtonGeometry {
                    x: grid.snap(start.x + dx),
                    y: grid.snap(start.y + dy),
                    ..*start
                },
            )
        })
        .count()
}

/// Snap button centers onto the grid regardless of its `snap` toggle.
pub fn snap_to_grid(doc: &mut ConfigDocument, ids: &[ButtonId], size: f64) -> usize {
    let grid = Grid::new(size, true);
    let starts: Vec<(ButtonId, ButtonGeometry)> = ids
        .iter()
        .filter_map(|id| doc.button(*id).map(|button| (*id, ButtonGeometry::from(button))))
        .collect();
    drag(doc, &starts, 0.0, 0.0, grid)
}

/// Resize a button by dragging one of its handles.
///
/// Edges follow the pointer, so the center moves by half the delta on the
/// grabbed side and the half-extent changes by the same amount. Extents never
/// shrink below [`MIN_RESIZE_EXTENT`] before snapping.
///
/// # Errors
/// Returns [`EditorError::NotFound`] for an unknown handle.
pub fn resize(
    doc: &mut ConfigDocument,
    id: ButtonId,
    handle: ResizeHandle,
    start: ButtonGeometry,
    dx: f64,
    dy: f64,
    grid: Grid,
) -> Result<ButtonGeometry, EditorError> {
    let mut next = start;
    if handle.has('e') {
        next.w = start.w + dx / 2.0;
    }
    if handle.has('w') {
        next.w = start.w - dx / 2.0;
        next.x = start.x + dx / 2.0;
    }
    if handle.has('s') {
        next.h = start.h + dy / 2.0;
    }
    if handle.has('n') {
        next.h = start.h - dy / 2.0;
        next.y = start.y + dy / 2.0;
    }
    next.w = next.w.max(MIN_RESIZE_EXTENT);
    next.h = next.h.max(MIN_RESIZE_EXTENT);
    let next = ButtonGeometry {
        x: grid.snap(next.x),
        y: grid.snap(next.y),
        w: grid.snap(next.w),
        h: grid.snap(next.h),
    };
    if !store_geometry(doc, id, next) {
        return Err(EditorError::not_found(format!("button {}", id)));
    }
    doc.button(id)
        .map(ButtonGeometry::from)
        .ok_or_else(|| EditorError::not_found(format!("button {}", id)))
}
