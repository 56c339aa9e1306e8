//! Command-line front end for editing gamepad overlay configs.

use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use padedit_core::catalog::{AssetLoader, AssetState, DirectorySource};
use padedit_core::geometry::{AlignMode, Axis};
use padedit_core::pad::PadButton;
use padedit_core::{
    ConfigDocument, EditorError, EditorSession, EditorSettings, KnownKey, ParseError, SelectionRect,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const ASSET_WAIT: Duration = Duration::from_secs(5);

/// Used when `RUST_LOG` is unset. The binary's own target is `padedit`.
const DEFAULT_LOG_FILTER: &str = "padedit=warn,padedit_core=warn";

#[derive(Parser)]
#[command(
    name = "padedit",
    about = "Edit libretro gamepad overlay configs",
    version
)]
struct Cli {
    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Summarize overlays and buttons
    Parse {
        /// Config file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Check that a config parses
    Validate { file: Option<PathBuf> },
    /// Re-emit a config in canonical form
    Serialize {
        file: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a geometry operation to one overlay
    Transform {
        file: Option<PathBuf>,
        /// Overlay to edit (the first one by default)
        #[arg(long)]
        overlay: Option<String>,
        /// Selection rectangle as LEFT,TOP,RIGHT,BOTTOM edges
        #[arg(long, value_parser = parse_rect_values)]
        select: Option<[f64; 4]>,
        /// Read RIGHT and BOTTOM of --select as distances from the far edges
        #[arg(long, requires = "select")]
        insets: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(subcommand)]
        op: TransformOp,
    },
    /// Add an overlay with a generated name
    NewOverlay {
        file: Option<PathBuf>,
        #[arg(long)]
        portrait: bool,
        /// Copy the buttons of the current overlay
        #[arg(long)]
        duplicate: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the render view of one overlay
    Pad {
        file: Option<PathBuf>,
        #[arg(long)]
        overlay: Option<String>,
        /// Directory holding button images
        #[arg(long)]
        images: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum TransformOp {
    /// Mirror each selected button horizontally
    FlipX,
    /// Square each selected button by changing its width
    NormalizeWidth,
    /// Square each selected button by changing its height
    NormalizeHeight,
    /// Re-target the overlay from one display size to another
    FixAspect {
        /// New display size, e.g. 1920x1080
        #[arg(value_parser = parse_size)]
        to: (f64, f64),
        /// Previous display size (the session screen by default)
        #[arg(long, value_parser = parse_size)]
        from: Option<(f64, f64)>,
        /// Keep button sizes untouched
        #[arg(long)]
        keep_relative: bool,
    },
    /// Copy the selection, offset by the configured duplicate offset
    Duplicate,
    /// Align the selection: left, right, top, bottom, center-h, center-v
    Align { mode: AlignMode },
    /// Space the selection evenly along x or y
    Distribute { axis: Axis },
    /// Move the selection
    Nudge {
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },
    /// Snap selected centers to the grid
    Snap,
}

impl TransformOp {
    fn label(&self) -> &'static str {
        match self {
            TransformOp::FlipX => "flip-x",
            TransformOp::NormalizeWidth => "normalize-width",
            TransformOp::NormalizeHeight => "normalize-height",
            TransformOp::FixAspect { .. } => "fix-aspect",
            TransformOp::Duplicate => "duplicate",
            TransformOp::Align { .. } => "align",
            TransformOp::Distribute { .. } => "distribute",
            TransformOp::Nudge { .. } => "nudge",
            TransformOp::Snap => "snap",
        }
    }
}

fn parse_rect_values(value: &str) -> Result<[f64; 4], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!(
            "expected LEFT,TOP,RIGHT,BOTTOM, got {} value(s)",
            parts.len()
        ));
    }
    let mut edges = [0.0; 4];
    for (slot, part) in edges.iter_mut().zip(parts) {
        *slot = part
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{}' is not a number", part))?;
    }
    Ok(edges)
}

fn parse_size(value: &str) -> Result<(f64, f64), String> {
    let (w, h) = value
        .split_once(['x', 'X', ':'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("'{}' is not a positive number", part.trim()))
    };
    Ok((parse(w)?, parse(h)?))
}

fn selection_rect(select: Option<[f64; 4]>, insets: bool) -> SelectionRect {
    match select {
        Some([l, t, r, b]) if insets => SelectionRect::from_edge_insets(l, t, r, b),
        Some([l, t, r, b]) => SelectionRect::new(l, t, r, b),
        None => SelectionRect::FULL,
    }
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn load_session(text: &str) -> anyhow::Result<EditorSession> {
    let mut session = EditorSession::new(EditorSettings::from_env());
    session.load(text)?;
    Ok(session)
}

fn select_overlay(session: &mut EditorSession, name: Option<&str>) -> anyhow::Result<()> {
    let Some(name) = name else {
        return Ok(());
    };
    let index = session
        .document()
        .overlay_index(name)
        .ok_or_else(|| anyhow!("overlay '{}' not found", name))?;
    session.select_overlay(index)?;
    Ok(())
}

/// Run one transform over the selection inside `rect`.
///
/// # Returns
/// Number of buttons changed or created.
fn apply_transform(
    session: &mut EditorSession,
    rect: SelectionRect,
    op: &TransformOp,
) -> Result<usize, EditorError> {
    let hits = session.select_in_bounds(rect);
    debug!(op = op.label(), hits = hits.len(), "transform selection");
    match op {
        TransformOp::FlipX | TransformOp::NormalizeWidth | TransformOp::NormalizeHeight => {
            for id in &hits {
                session.select_button(Some(*id));
                match op {
                    TransformOp::FlipX => session.flip_x()?,
                    TransformOp::NormalizeWidth => session.normalize_width()?,
                    _ => session.normalize_height()?,
                };
            }
            Ok(hits.len())
        }
        TransformOp::FixAspect {
            to,
            from,
            keep_relative,
        } => {
            let screen = session.screen();
            let from = from.unwrap_or((screen.width, screen.height));
            session.fix_aspect(from, *to, *keep_relative)
        }
        TransformOp::Duplicate => {
            if hits.is_empty() {
                return Ok(0);
            }
            session.duplicate_selection().map(|ids| ids.len())
        }
        TransformOp::Align { mode } => Ok(session.align(*mode)),
        TransformOp::Distribute { axis } => Ok(session.distribute(*axis)),
        TransformOp::Nudge { dx, dy } => Ok(session.nudge(*dx, *dy)),
        TransformOp::Snap => Ok(session.snap_selection()),
    }
}

fn format_parse_output(doc: &ConfigDocument, json: bool) -> Result<String, String> {
    if json {
        return serde_json::to_string_pretty(doc)
            .map_err(|err| format!("document encoding error: {}", err));
    }

    let mut rows = Vec::with_capacity(doc.overlays().len());
    for overlay in doc.overlays() {
        let aspect = overlay
            .known(KnownKey::AspectRatio)
            .unwrap_or("-");
        rows.push(format!(
            "{:<24} {:>4} buttons  aspect {}",
            overlay.name,
            overlay.buttons.len(),
            aspect
        ));
    }
    rows.push(format!(
        "{} overlay(s), {} button(s)",
        doc.overlays().len(),
        doc.button_count()
    ));
    Ok(rows.join("\n"))
}

fn format_validate_output(result: &Result<ConfigDocument, ParseError>, json: bool) -> String {
    let result = result.as_ref().map_err(|err| EditorError::from(err.clone()));
    match (&result, json) {
        (Ok(doc), true) => serde_json::json!({
            "ok": true,
            "overlays": doc.overlays().len(),
            "buttons": doc.button_count(),
        })
        .to_string(),
        (Ok(_), false) => "ok".to_string(),
        (Err(EditorError::Parse(err)), true) => serde_json::json!({
            "ok": false,
            "line": err.line,
            "message": err.message,
        })
        .to_string(),
        (Err(err), true) => serde_json::json!({ "ok": false, "message": err.to_string() })
            .to_string(),
        (Err(err), false) => err.to_string(),
    }
}

fn format_transform_report(
    op: &TransformOp,
    overlay: Option<&str>,
    changed: usize,
    json: bool,
) -> String {
    if json {
        return serde_json::json!({
            "op": op.label(),
            "overlay": overlay,
            "changed": changed,
        })
        .to_string();
    }
    format!("{}: {} button(s) changed", op.label(), changed)
}

fn asset_label(state: Option<&AssetState>) -> &'static str {
    match state {
        Some(AssetState::Ready(_)) => "ready",
        Some(AssetState::Unavailable) => "missing",
        Some(AssetState::Pending) | None => "pending",
    }
}

/// Resolve every distinct pad image through a directory catalog.
fn resolve_images(pad: &[PadButton], dir: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let mut loader = AssetLoader::spawn(Arc::new(DirectorySource::new(dir)))?;
    let mut names: Vec<&str> = pad.iter().filter_map(|b| b.image.as_deref()).collect();
    names.sort_unstable();
    names.dedup();
    for name in &names {
        loader.request(name)?;
    }
    let mut resolved = BTreeMap::new();
    for name in names {
        let label = asset_label(loader.wait_for(name, ASSET_WAIT));
        resolved.insert(name.to_string(), label.to_string());
    }
    Ok(resolved)
}

fn format_pad_output(
    pad: &[PadButton],
    assets: Option<&BTreeMap<String, String>>,
    json: bool,
) -> Result<String, String> {
    let asset_of = |button: &PadButton| {
        let image = button.image.as_deref()?;
        assets.and_then(|assets| assets.get(image)).cloned()
    };

    if json {
        let mut items = Vec::with_capacity(pad.len());
        for button in pad {
            let mut value = serde_json::to_value(button)
                .map_err(|err| format!("pad encoding error: {}", err))?;
            if let Some(status) = asset_of(button) {
                value["asset"] = Value::from(status);
            }
            items.push(value);
        }
        return serde_json::to_string_pretty(&items)
            .map_err(|err| format!("pad encoding error: {}", err));
    }

    let rows: Vec<String> = pad
        .iter()
        .map(|button| {
            let rect = button.percent_box();
            let image = match (button.image.as_deref(), asset_of(button)) {
                (Some(image), Some(status)) => format!("{} ({})", image, status),
                (Some(image), None) => image.to_string(),
                (None, _) => "-".to_string(),
            };
            format!(
                "{:<20} {:<6} {:>7.2}% {:>7.2}% {:>7.2}% {:>7.2}%  {}",
                button.command,
                button.shape.as_str(),
                rect.left,
                rect.top,
                rect.width,
                rect.height,
                image
            )
        })
        .collect();
    Ok(rows.join("\n"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli { json, command } = cli;

    match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        Commands::Parse { file } => {
            let text = read_input(file.as_deref())?;
            let doc = ConfigDocument::parse(&text)?;
            let output = format_parse_output(&doc, json).map_err(|message| anyhow!(message))?;
            println!("{}", output);
        }
        Commands::Validate { file } => {
            let text = read_input(file.as_deref())?;
            let result = ConfigDocument::parse(&text);
            let output = format_validate_output(&result, json);
            if let Err(err) = result {
                if json {
                    println!("{}", output);
                }
                return Err(anyhow::Error::new(err).context("validation failed"));
            }
            println!("{}", output);
        }
        Commands::Serialize { file, output } => {
            let text = read_input(file.as_deref())?;
            let doc = ConfigDocument::parse(&text)?;
            write_output(output.as_deref(), &doc.serialize())?;
        }
        Commands::Transform {
            file,
            overlay,
            select,
            insets,
            output,
            op,
        } => {
            let text = read_input(file.as_deref())?;
            let mut session = load_session(&text)?;
            select_overlay(&mut session, overlay.as_deref())?;
            let changed = apply_transform(&mut session, selection_rect(select, insets), &op)?;
            let current = session
                .document()
                .current_overlay()
                .map(|o| o.name.clone());
            write_output(output.as_deref(), &session.serialize())?;
            if output.is_some() {
                println!(
                    "{}",
                    format_transform_report(&op, current.as_deref(), changed, json)
                );
            }
        }
        Commands::NewOverlay {
            file,
            portrait,
            duplicate,
            output,
        } => {
            let text = read_input(file.as_deref())?;
            let mut session = load_session(&text)?;
            let name = session.add_generated_overlay(portrait, duplicate)?;
            write_output(output.as_deref(), &session.serialize())?;
            if output.is_some() {
                if json {
                    println!("{}", serde_json::json!({ "name": name }));
                } else {
                    println!("Added overlay: {}", name);
                }
            }
        }
        Commands::Pad {
            file,
            overlay,
            images,
        } => {
            let text = read_input(file.as_deref())?;
            let mut session = load_session(&text)?;
            select_overlay(&mut session, overlay.as_deref())?;
            let pad = session.build_pad();
            let assets = match images {
                Some(dir) => Some(resolve_images(&pad, &dir)?),
                None => None,
            };
            let output = format_pad_output(&pad, assets.as_ref(), json)
                .map_err(|message| anyhow!(message))?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }

    Ok(())
}

fn main() {
    init_tracing();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
