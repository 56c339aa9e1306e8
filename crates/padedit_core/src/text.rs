//! Shared text helpers for config values and raw property blocks.

use crate::error::EditorError;
use crate::models::RawLine;

/// Whether `key` can be written after an `overlayN_` prefix and read back
/// unchanged: non-empty, no whitespace, no `=`.
pub fn is_property_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('=') && !key.chars().any(char::is_whitespace)
}

/// Split a `key = value` line at the first `=`.
///
/// # Returns
/// Trimmed key and value, or `None` when there is no `=` or the key is empty.
pub fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Remove one pair of surrounding double quotes, if present.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

/// Wrap a value in double quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Parse a free-form property block typed into an editor dialog.
///
/// Blank lines and `#` comments are skipped; every other line must be
/// `key = value`.
///
/// # Errors
/// Returns [`EditorError::Validation`] naming the first line that is not a
/// `key = value` pair.
pub fn parse_raw_properties(block: &str) -> Result<Vec<RawLine>, EditorError> {
    let mut lines = Vec::new();
    for (index, line) in block.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = split_key_value(trimmed) else {
            return Err(EditorError::invalid(format!(
                "property line {} is not 'key = value': '{}'",
                index + 1,
                trimmed
            )));
        };
        lines.push(RawLine::new(key, value));
    }
    Ok(lines)
}

/// Render a raw line list back into a property block.
pub fn format_raw_properties(lines: &[RawLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a float using the shortest representation that parses back exactly.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_keys_reject_separators() {
        assert!(is_property_key("next_target"));
        for bad in ["", "a b", "name=x", "=", "tab\tkey"] {
            assert!(!is_property_key(bad), "key: {:?}", bad);
        }
    }

    #[test]
    fn split_key_value_uses_first_equals() {
        assert_eq!(split_key_value("a = b = c"), Some(("a", "b = c")));
        assert_eq!(split_key_value(" = value"), None);
        assert_eq!(split_key_value("no separator"), None);
    }

    #[test]
    fn strip_quotes_only_removes_matching_pair() {
        assert_eq!(strip_quotes("\"landscape-1\""), "landscape-1");
        assert_eq!(strip_quotes("\"half"), "\"half");
        assert_eq!(strip_quotes(" plain "), "plain");
    }

    #[test]
    fn parse_raw_properties_skips_blank_and_comments() {
        let lines = parse_raw_properties("full_screen = true\n\n# note\nrange_mod=1.5\n")
            .expect("block should parse");
        assert_eq!(
            lines,
            vec![
                RawLine::new("full_screen", "true"),
                RawLine::new("range_mod", "1.5")
            ]
        );
        assert_eq!(
            format_raw_properties(&lines),
            "full_screen = true\nrange_mod = 1.5"
        );
    }

    #[test]
    fn parse_raw_properties_rejects_bare_words() {
        let err = parse_raw_properties("ok = 1\nbroken").expect_err("bare word is invalid");
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn format_number_round_trips() {
        for value in [0.92, 0.85, 1.0 / 3.0, -0.25, 0.0, 1e-7] {
            let text = format_number(value);
            assert_eq!(text.parse::<f64>().expect("number"), value, "text: {}", text);
        }
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
    }
}
