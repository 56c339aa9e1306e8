//! Shared constants used across padedit crates.

/// Default editor screen width in pixels (16:9, matches the bundled overlays).
pub const DEFAULT_SCREEN_WIDTH: f64 = 800.0;
/// Default editor screen height in pixels.
pub const DEFAULT_SCREEN_HEIGHT: f64 = 450.0;

/// Default grid size used for snapping normalized coordinates.
pub const DEFAULT_GRID_SIZE: f64 = 0.02;

/// Maximum number of undo snapshots kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default offset applied to duplicated buttons on both axes.
pub const DEFAULT_DUPLICATE_OFFSET: f64 = 0.02;

/// Allowed range for button centers (permits off-screen placement).
pub const POSITION_RANGE: (f64, f64) = (-0.5, 1.5);
/// Allowed range for button half-extents.
pub const SIZE_RANGE: (f64, f64) = (0.001, 0.5);

/// Smallest half-extent a resize handle can shrink a button to.
pub const MIN_RESIZE_EXTENT: f64 = 0.005;

/// Decimal places kept when storing computed coordinates.
pub const COORD_DECIMALS: i32 = 10;

/// Center and half-extent given to freshly created buttons.
pub const NEW_BUTTON_CENTER: f64 = 0.5;
/// Half-extent given to freshly created buttons.
pub const NEW_BUTTON_EXTENT: f64 = 0.05;

/// Command stored when a button is created with an empty command.
pub const NULL_COMMAND: &str = "null";

/// Header lines suggested for a brand new overlay.
pub const DEFAULT_OVERLAY_PARAMS: &str =
    "full_screen = true\nnormalized = true\nrange_mod = 1.5\nalpha_mod = 2.0";

/// Name prefix for generated landscape overlays.
pub const LANDSCAPE_PREFIX: &str = "landscape";
/// Name prefix for generated portrait overlays.
pub const PORTRAIT_PREFIX: &str = "portrait";
