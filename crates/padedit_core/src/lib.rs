//! Core model for the gamepad overlay editor (parse, select, transform, undo).

/// Asset catalog collaborator and background loader.
pub mod catalog;
/// Editor settings loaded from the environment.
pub mod config;
/// Shared defaults and numeric domains.
pub mod constants;
/// Config document parsing, queries, mutation and serialization.
pub mod document;
/// Error types for parsing and editing.
pub mod error;
/// Geometry transforms applied to buttons.
pub mod geometry;
/// Snapshot undo/redo history.
pub mod history;
/// Overlay, button and field models.
pub mod models;
/// Overlay name generation.
pub mod naming;
/// Screen-ready button view for renderers.
pub mod pad;
/// Screen and preview dimension helpers.
pub mod screen;
/// Current-line and group selection.
pub mod selection;
/// Editor session tying document, selection and history together.
pub mod session;
/// Raw property parsing and value helpers.
pub mod text;

pub use config::EditorSettings;
pub use constants::{DEFAULT_GRID_SIZE, DEFAULT_HISTORY_LIMIT};
pub use document::ConfigDocument;
pub use error::{EditorError, ParseError};
pub use models::{Button, ButtonId, ButtonSpec, Field, KnownKey, Overlay, RawLine, Section, Shape};
pub use selection::{Selection, SelectionRect};
pub use session::EditorSession;
