//! Overlay config data models.

/// Buttons, shapes, numeric sections and button specs.
pub mod button;
/// Overlays, header fields and raw lines.
pub mod overlay;


pub use button::{Button, ButtonId, ButtonSpec, Section, Shape};
pub use overlay::{is_reserved_header_key, Field, KnownKey, Overlay, RawLine};
