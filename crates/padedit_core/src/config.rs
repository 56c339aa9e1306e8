//! Editor settings loaded from environment variables.

use crate::constants::{
    DEFAULT_DUPLICATE_OFFSET, DEFAULT_GRID_SIZE, DEFAULT_HISTORY_LIMIT, DEFAULT_SCREEN_HEIGHT,
    DEFAULT_SCREEN_WIDTH,
};
use crate::geometry::Grid;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Runtime settings for an editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub grid_size: f64,
    pub grid_snap: bool,
    pub history_limit: usize,
    pub screen_width: f64,
    pub screen_height: f64,
    pub duplicate_offset: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            grid_snap: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            duplicate_offset: DEFAULT_DUPLICATE_OFFSET,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn positive_f64(name: &str, raw: Option<String>, default: f64) -> f64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => {
            warn!(variable = name, value = raw.as_str(), "ignoring invalid setting");
            default
        }
    }
}

impl EditorSettings {
    /// Load settings from `PADEDIT_*` environment variables.
    ///
    /// # Returns
    /// Populated [`EditorSettings`] with defaults applied when env vars are
    /// missing or invalid.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let grid_snap = match lookup("PADEDIT_GRID_SNAP") {
            Some(raw) => parse_env_flag(&raw).unwrap_or_else(|| {
                warn!(value = raw.as_str(), "ignoring invalid PADEDIT_GRID_SNAP");
                false
            }),
            None => defaults.grid_snap,
        };
        let history_limit = match lookup("PADEDIT_HISTORY_LIMIT") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    warn!(value = raw.as_str(), "ignoring invalid PADEDIT_HISTORY_LIMIT");
                    defaults.history_limit
                }
            },
            None => defaults.history_limit,
        };
        Self {
            grid_size: positive_f64(
                "PADEDIT_GRID_SIZE",
                lookup("PADEDIT_GRID_SIZE"),
                defaults.grid_size,
            ),
            grid_snap,
            history_limit,
            screen_width: positive_f64(
                "PADEDIT_SCREEN_WIDTH",
                lookup("PADEDIT_SCREEN_WIDTH"),
                defaults.screen_width,
            ),
            screen_height: positive_f64(
                "PADEDIT_SCREEN_HEIGHT",
                lookup("PADEDIT_SCREEN_HEIGHT"),
                defaults.screen_height,
            ),
            duplicate_offset: positive_f64(
                "PADEDIT_DUPLICATE_OFFSET",
                lookup("PADEDIT_DUPLICATE_OFFSET"),
                defaults.duplicate_offset,
            ),
        }
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_size, self.grid_snap)
    }
}
