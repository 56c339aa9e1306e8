//! Screen dimensions used to preview an overlay and square its buttons.

use crate::constants::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
use crate::document::{AspectRatio, ConfigDocument};
use serde::Serialize;

const FALLBACK_RATIO: f64 = 16.0 / 9.0;

/// Preview screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
    pub is_portrait: bool,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
            is_portrait: false,
        }
    }
}

impl ScreenSize {
    /// Size derived from an overlay's declared aspect.
    ///
    /// The short side is fixed at the default height. A ratio that disagrees
    /// with the orientation is inverted; a missing ratio means 16:9.
    pub fn for_aspect(aspect: Option<AspectRatio>, is_portrait: bool) -> Self {
        let mut ratio = aspect.map(|a| a.ratio()).unwrap_or(FALLBACK_RATIO);
        if (is_portrait && ratio > 1.0) || (!is_portrait && ratio < 1.0) {
            ratio = 1.0 / ratio;
        }
        let short = DEFAULT_SCREEN_HEIGHT;
        if is_portrait {
            Self {
                width: short,
                height: (short / ratio).round(),
                is_portrait,
            }
        } else {
            Self {
                width: (short * ratio).round(),
                height: short,
                is_portrait,
            }
        }
    }

    /// Size for the current overlay of `doc`.
    pub fn for_document(doc: &ConfigDocument) -> Self {
        Self::for_aspect(doc.overlay_aspect_ratio(), doc.is_portrait())
    }

    /// Scale that fits the screen into a viewport of the given width.
    ///
    /// Narrow viewports fit the short side, wider ones a share of the long side.
    pub fn fit_scale(&self, viewport_width: f64) -> f64 {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        if viewport_width < 600.0 {
            viewport_width * 0.85 / short
        } else {
            let share = if viewport_width <= 1280.0 { 0.7 } else { 0.55 };
            viewport_width * share / long
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_aspect_defaults_to_widescreen() {
        assert_eq!(
            ScreenSize::for_aspect(None, false),
            ScreenSize {
                width: 800.0,
                height: 450.0,
                is_portrait: false
            }
        );
        let portrait = ScreenSize::for_aspect(None, true);
        assert_eq!((portrait.width, portrait.height), (450.0, 800.0));
    }

    #[test]
    fn mismatched_ratio_is_inverted() {
        let tall = AspectRatio::parse("9:16");
        let landscape = ScreenSize::for_aspect(tall, false);
        assert_eq!((landscape.width, landscape.height), (800.0, 450.0));

        let four_three = AspectRatio::parse("4:3");
        let portrait = ScreenSize::for_aspect(four_three, true);
        assert_eq!((portrait.width, portrait.height), (450.0, 600.0));
    }

    #[test]
    fn document_orientation_comes_from_first_overlay() {
        let doc = ConfigDocument::parse(
            "overlay0_name = \"portrait-1\"\noverlay0_aspect_ratio = 0.5\n",
        )
        .expect("doc");
        let size = ScreenSize::for_document(&doc);
        assert!(size.is_portrait);
        assert_eq!((size.width, size.height), (450.0, 900.0));
    }

    #[test]
    fn fit_scale_depends_on_viewport() {
        let size = ScreenSize::default();
        assert!((size.fit_scale(500.0) - 500.0 * 0.85 / 450.0).abs() < 1e-12);
        assert!((size.fit_scale(1000.0) - 700.0 / 800.0).abs() < 1e-12);
        assert!((size.fit_scale(1600.0) - 1.1).abs() < 1e-12);
    }
}
