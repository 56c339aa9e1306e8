//! Utilities for generating overlay names and default overlay parameters.

use crate::constants::{DEFAULT_OVERLAY_PARAMS, LANDSCAPE_PREFIX, PORTRAIT_PREFIX};
use crate::document::ConfigDocument;
use crate::models::RawLine;
use crate::text::split_key_value;

/// Generate a `prefix-N` name that does not collide.
///
/// Counting starts at `start` and walks upward until `exists_check` rejects
/// nothing.
///
/// # Returns
/// The first free name.
pub fn generate_unique_name<F>(prefix: &str, start: usize, exists_check: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut index = start;
    loop {
        let name = format!("{}-{}", prefix, index);
        if !exists_check(&name) {
            return name;
        }
        index += 1;
    }
}

/// Suggest a name for a new overlay: `landscape-N` or `portrait-N`, starting
/// from one past the current overlay count.
pub fn generate_overlay_name(doc: &ConfigDocument, is_portrait: bool) -> String {
    let prefix = if is_portrait {
        PORTRAIT_PREFIX
    } else {
        LANDSCAPE_PREFIX
    };
    generate_unique_name(prefix, doc.overlays().len() + 1, |name| {
        doc.is_overlay_name_exist(name)
    })
}

/// Header lines offered for a brand new overlay.
pub fn default_overlay_params() -> Vec<RawLine> {
    DEFAULT_OVERLAY_PARAMS
        .lines()
        .filter_map(split_key_value)
        .map(|(key, value)| RawLine::new(key, value))
        .collect()
}
