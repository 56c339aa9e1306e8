//! Canonical text emitter for overlay documents.

use super::ConfigDocument;
use crate::models::{Button, Overlay};
use crate::text::{format_number, quote};

impl ConfigDocument {
    /// Render the document as config text.
    ///
    /// Overlays are emitted in order, each preceded by a blank line. Known
    /// button fields use the fixed `command,x,y,shape,w,h` marker followed by
    /// the image and extra lines in their stored order.
    pub fn serialize(&self) -> String {
        let mut out = format!("overlays = {}\n", self.overlays.len());
        for (index, overlay) in self.overlays.iter().enumerate() {
            out.push('\n');
            write_overlay(&mut out, index, overlay);
        }
        out
    }
}

fn write_overlay(out: &mut String, index: usize, overlay: &Overlay) {
    let prefix = format!("overlay{}", index);
    push_line(out, &format!("{}_name", prefix), &quote(&overlay.name));
    for field in &overlay.header {
        push_line(out, &format!("{}_{}", prefix, field.key()), field.value());
    }
    push_line(
        out,
        &format!("{}_descs", prefix),
        &overlay.buttons.len().to_string(),
    );
    for (desc, button) in overlay.buttons.iter().enumerate() {
        write_button(out, &format!("{}_desc{}", prefix, desc), button);
    }
}

fn write_button(out: &mut String, prefix: &str, button: &Button) {
    let marker = format!(
        "{},{},{},{},{},{}",
        button.command,
        format_number(button.x),
        format_number(button.y),
        button.shape,
        format_number(button.w),
        format_number(button.h)
    );
    push_line(out, prefix, &quote(&marker));
    if let Some(image) = &button.image {
        push_line(out, &format!("{}_overlay", prefix), image);
    }
    for line in &button.extra {
        push_line(out, &format!("{}_{}", prefix, line.key), &line.value);
    }
}

fn push_line(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(" = ");
    out.push_str(value);
    out.push('\n');
}
