//! Render-ready view of the current overlay.

use crate::document::ConfigDocument;
use crate::models::{ButtonId, Shape};
use crate::selection::Selection;
use crate::text::strip_quotes;
use serde::Serialize;

/// Extra key holding a thumbstick's saturation radius.
pub const SATURATE_PCT_KEY: &str = "saturate_pct";

/// One button as a renderer draws it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PadButton {
    pub id: ButtonId,
    pub command: String,
    pub shape: Shape,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub image: Option<String>,
    pub saturate_pct: Option<f64>,
    pub selected: bool,
}

/// Axis-aligned box in percent of the screen, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PadButton {
    pub fn percent_box(&self) -> PercentBox {
        let width = 100.0 * self.w * 2.0;
        let height = 100.0 * self.h * 2.0;
        PercentBox {
            left: 100.0 * self.x - width / 2.0,
            top: 100.0 * self.y - height / 2.0,
            width,
            height,
        }
    }
}

/// Snapshot the current overlay for drawing.
pub fn build_pad(doc: &ConfigDocument, selection: &Selection) -> Vec<PadButton> {
    doc.current_buttons()
        .iter()
        .map(|button| PadButton {
            id: button.id(),
            command: button.command.clone(),
            shape: button.shape,
            x: button.x,
            y: button.y,
            w: button.w,
            h: button.h,
            image: button.image.clone(),
            saturate_pct: button
                .extra_value(SATURATE_PCT_KEY)
                .and_then(|value| strip_quotes(value).parse::<f64>().ok())
                .filter(|pct| pct.is_finite() && *pct > 0.0),
            selected: selection.is_selected(button.id()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STICK: &str = r#"
overlay0_name = "landscape-1"
overlay0_desc0 = "analog_left,0.15,0.7,radial,0.1,0.1"
overlay0_desc0_overlay = stick.png
overlay0_desc0_movable = true
overlay0_desc0_saturate_pct = 0.65
overlay0_desc1 = "a,0.9,0.8,radial,0.05,0.05"
overlay0_desc1_saturate_pct = lots
"#;

    #[test]
    fn pad_reflects_buttons_and_selection() {
        let doc = ConfigDocument::parse(STICK).expect("doc");
        let ids: Vec<ButtonId> = doc.current_buttons().iter().map(|b| b.id()).collect();
        let mut selection = Selection::new();
        selection.set_current(Some(ids[1]));

        let pad = build_pad(&doc, &selection);
        assert_eq!(pad.len(), 2);
        assert_eq!(pad[0].image.as_deref(), Some("stick.png"));
        assert_eq!(pad[0].saturate_pct, Some(0.65));
        assert!(!pad[0].selected);
        assert_eq!(pad[1].saturate_pct, None);
        assert!(pad[1].selected);
    }

    #[test]
    fn percent_box_is_centered_on_button() {
        let doc = ConfigDocument::parse(STICK).expect("doc");
        let pad = build_pad(&doc, &Selection::new());
        let rect = pad[0].percent_box();
        assert!((rect.width - 20.0).abs() < 1e-9);
        assert!((rect.left - 5.0).abs() < 1e-9);
        assert!((rect.top - 60.0).abs() < 1e-9);
    }

    #[test]
    fn empty_document_draws_nothing() {
        assert!(build_pad(&ConfigDocument::new(), &Selection::new()).is_empty());
    }
}
