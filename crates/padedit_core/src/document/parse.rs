//! Line-oriented parser for libretro-style overlay configs.

use super::ConfigDocument;
use crate::error::ParseError;
use crate::models::{Button, ButtonSpec, Field, Overlay, RawLine, Shape};
use crate::text::{split_key_value, strip_quotes};
use std::collections::BTreeMap;
use tracing::debug;

const OVERLAY_COUNT_KEY: &str = "overlays";
const OVERLAY_PREFIX: &str = "overlay";
const DESC_PREFIX: &str = "desc";
const IMAGE_SUFFIX: &str = "overlay";

/// What an `overlay<N>_<rest>` key addresses.
#[derive(Debug, PartialEq, Eq)]
enum OverlayKey<'a> {
    Name,
    DescCount,
    Marker(usize),
    Image(usize),
    Extra(usize, &'a str),
    Header(&'a str),
}

#[derive(Debug)]
struct Marker {
    command: String,
    shape: Shape,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(Debug, Default)]
struct DescDraft {
    marker: Option<Marker>,
    image: Option<String>,
    extra: Vec<RawLine>,
    first_line: usize,
}

#[derive(Debug, Default)]
struct OverlayDraft {
    name: Option<String>,
    header: Vec<Field>,
    declared_descs: Option<(usize, usize)>,
    descs: BTreeMap<usize, DescDraft>,
    first_line: usize,
}

impl ConfigDocument {
    /// Parse config text into a fresh document.
    ///
    /// Blank lines and `#`/`;` comments are dropped. The first overlay becomes
    /// current when the document is not empty.
    ///
    /// # Errors
    /// Returns [`ParseError`] for lines that are not `key = value`, keys
    /// outside any overlay section, malformed button markers, and overlay or
    /// button indices that do not form a contiguous sequence.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut declared_overlays: Option<(usize, usize)> = None;
        let mut drafts: BTreeMap<usize, OverlayDraft> = BTreeMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            let Some((key, value)) = split_key_value(line) else {
                return Err(ParseError::at(line_no, "expected 'key = value'"));
            };

            if key == OVERLAY_COUNT_KEY {
                if declared_overlays.is_some() {
                    return Err(ParseError::at(line_no, "duplicate 'overlays' count"));
                }
                let count = parse_count(value)
                    .ok_or_else(|| ParseError::at(line_no, "overlay count must be an integer"))?;
                declared_overlays = Some((count, line_no));
                continue;
            }

            let Some((overlay_index, rest)) = split_overlay_key(key) else {
                return Err(ParseError::at(
                    line_no,
                    format!("'{}' is outside any overlay section", key),
                ));
            };
            let draft = drafts.entry(overlay_index).or_insert_with(|| OverlayDraft {
                first_line: line_no,
                ..OverlayDraft::default()
            });

            match classify(rest).ok_or_else(|| {
                ParseError::at(line_no, format!("malformed button key '{}'", key))
            })? {
                OverlayKey::Name => {
                    if draft.name.is_some() {
                        return Err(ParseError::at(
                            line_no,
                            format!("overlay {} is named twice", overlay_index),
                        ));
                    }
                    draft.name = Some(strip_quotes(value).to_string());
                }
                OverlayKey::DescCount => {
                    if draft.declared_descs.is_some() {
                        return Err(ParseError::at(line_no, "duplicate button count"));
                    }
                    let count = parse_count(value).ok_or_else(|| {
                        ParseError::at(line_no, "button count must be an integer")
                    })?;
                    draft.declared_descs = Some((count, line_no));
                }
                OverlayKey::Marker(desc) => {
                    let desc_draft = desc_entry(draft, desc, line_no);
                    if desc_draft.marker.is_some() {
                        return Err(ParseError::at(
                            line_no,
                            format!("button {} of overlay {} is defined twice", desc, overlay_index),
                        ));
                    }
                    desc_draft.marker = Some(parse_marker(value, line_no)?);
                }
                OverlayKey::Image(desc) => {
                    let desc_draft = desc_entry(draft, desc, line_no);
                    if desc_draft.image.is_some() {
                        return Err(ParseError::at(
                            line_no,
                            format!("button {} of overlay {} has two images", desc, overlay_index),
                        ));
                    }
                    let image = strip_quotes(value);
                    desc_draft.image = (!image.is_empty()).then(|| image.to_string());
                }
                OverlayKey::Extra(desc, extra_key) => {
                    desc_entry(draft, desc, line_no)
                        .extra
                        .push(RawLine::new(extra_key, value));
                }
                OverlayKey::Header(header_key) => {
                    draft.header.push(Field::from_pair(header_key, value));
                }
            }
        }

        let mut document = ConfigDocument::new();
        let expected = match declared_overlays {
            Some((count, line_no)) => {
                if let Some((&index, draft)) = drafts.range(count..).next() {
                    return Err(ParseError::at(
                        draft.first_line,
                        format!(
                            "overlay {} exceeds the declared count of {} (line {})",
                            index, count, line_no
                        ),
                    ));
                }
                count
            }
            None => drafts.keys().next_back().map(|last| last + 1).unwrap_or(0),
        };

        for index in 0..expected {
            let draft = drafts
                .remove(&index)
                .ok_or_else(|| ParseError::document(format!("overlay {} is missing", index)))?;
            let overlay = build_overlay(&mut document, index, draft)?;
            if document.is_overlay_name_exist(&overlay.name) {
                return Err(ParseError::document(format!(
                    "overlay name '{}' is used twice",
                    overlay.name
                )));
            }
            document.overlays.push(overlay);
        }

        document.current = if document.overlays.is_empty() {
            None
        } else {
            Some(0)
        };
        debug!(
            overlays = document.overlays.len(),
            buttons = document.button_count(),
            "parsed overlay config"
        );
        Ok(document)
    }
}

fn desc_entry(draft: &mut OverlayDraft, desc: usize, line_no: usize) -> &mut DescDraft {
    draft.descs.entry(desc).or_insert_with(|| DescDraft {
        first_line: line_no,
        ..DescDraft::default()
    })
}

fn build_overlay(
    document: &mut ConfigDocument,
    index: usize,
    draft: OverlayDraft,
) -> Result<Overlay, ParseError> {
    let name = draft
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            ParseError::at(draft.first_line, format!("overlay {} has no name", index))
        })?;

    let expected = match draft.declared_descs {
        Some((count, line_no)) => {
            if let Some((&desc, desc_draft)) = draft.descs.range(count..).next() {
                return Err(ParseError::at(
                    desc_draft.first_line,
                    format!(
                        "button {} of overlay {} exceeds the declared count of {} (line {})",
                        desc, index, count, line_no
                    ),
                ));
            }
            count
        }
        None => draft.descs.keys().next_back().map(|last| last + 1).unwrap_or(0),
    };

    let mut descs = draft.descs;
    let mut overlay = Overlay::new(name, draft.header);
    for desc in 0..expected {
        let desc_draft = descs.remove(&desc).ok_or_else(|| {
            ParseError::document(format!("button {} of overlay {} is missing", desc, index))
        })?;
        let marker = desc_draft.marker.ok_or_else(|| {
            ParseError::at(
                desc_draft.first_line,
                format!(
                    "button {} of overlay {} has properties but no definition",
                    desc, index
                ),
            )
        })?;
        let spec = ButtonSpec {
            command: marker.command,
            shape: marker.shape,
            image: desc_draft.image,
            extra: desc_draft.extra,
        };
        let id = document.mint_id();
        overlay
            .buttons
            .push(Button::with_id(id, spec, marker.x, marker.y, marker.w, marker.h));
    }
    Ok(overlay)
}

fn parse_count(value: &str) -> Option<usize> {
    strip_quotes(value).parse::<usize>().ok()
}

/// Split `overlay<N>_<rest>` into its index and remainder.
fn split_overlay_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix(OVERLAY_PREFIX)?;
    let (index, rest) = split_index(rest)?;
    let rest = rest.strip_prefix('_')?;
    if rest.is_empty() {
        return None;
    }
    Some((index, rest))
}

fn split_index(value: &str) -> Option<(usize, &str)> {
    let digits = value.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let index = value[..digits].parse::<usize>().ok()?;
    Some((index, &value[digits..]))
}

/// Classify the part of an overlay key after `overlay<N>_`.
///
/// Returns `None` for keys that look like button keys but are malformed.
fn classify(rest: &str) -> Option<OverlayKey<'_>> {
    match rest {
        "name" => return Some(OverlayKey::Name),
        "descs" => return Some(OverlayKey::DescCount),
        _ => {}
    }
    let Some(after_desc) = rest.strip_prefix(DESC_PREFIX) else {
        return Some(OverlayKey::Header(rest));
    };
    let Some((desc, tail)) = split_index(after_desc) else {
        return Some(OverlayKey::Header(rest));
    };
    if tail.is_empty() {
        return Some(OverlayKey::Marker(desc));
    }
    let suffix = tail.strip_prefix('_').filter(|suffix| !suffix.is_empty())?;
    if suffix == IMAGE_SUFFIX {
        Some(OverlayKey::Image(desc))
    } else {
        Some(OverlayKey::Extra(desc, suffix))
    }
}

/// Parse `"command,x,y,shape,w,h"`.
fn parse_marker(value: &str, line_no: usize) -> Result<Marker, ParseError> {
    let fields: Vec<&str> = strip_quotes(value).split(',').map(str::trim).collect();
    let [command, x, y, shape, w, h] = fields.as_slice() else {
        return Err(ParseError::at(
            line_no,
            format!(
                "button definition needs 'command,x,y,shape,w,h', got {} field(s)",
                fields.len()
            ),
        ));
    };
    if command.is_empty() {
        return Err(ParseError::at(line_no, "button command is empty"));
    }
    let shape = shape
        .parse::<Shape>()
        .map_err(|message| ParseError::at(line_no, message))?;
    let number = |name: &str, raw: &str| -> Result<f64, ParseError> {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ParseError::at(line_no, format!("{} is not a number: '{}'", name, raw)))
    };
    Ok(Marker {
        command: command.to_string(),
        shape,
        x: number("x", *x)?,
        y: number("y", *y)?,
        w: number("w", *w)?,
        h: number("h", *h)?,
    })
}
