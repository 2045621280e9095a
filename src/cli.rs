// ============================================================================
// ModWeave CLI: headless access to the pattern, liquify and modifier engines
// ============================================================================
//
// Usage examples:
//   modweave pattern --state dots.json --output dots.svg
//   modweave pattern --state dots.json --mask fade.png --output dots.txt --data-uri
//   modweave liquify -i photo.png -o warped.png --mode twirl --brush-size 80
//   modweave liquify -i "shots/*.jpg" --output-dir warped/ --mode bloat --seed 7
//   modweave liquify -i face.png -o out.png --mode pinch --at 120,80 --at 200,80
//   modweave preview --document doc.json --layer 0 --input photo.png --output look.png
//   modweave apply-actions --document doc.json --actions reply.json --output doc.json

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::components::history::HistoryManager;
use crate::document::Document;
use crate::io;
use crate::modifier::{Modifier, ModifierType};
use crate::ops::actions;
use crate::ops::filters::apply_preview_style;
use crate::ops::liquify::{self, BrushMode, DEFAULT_RESOLUTION, LiquifyParams, LiquifyRenderer};
use crate::ops::pattern;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// ModWeave headless processor.
#[derive(Parser, Debug)]
#[command(
    name = "modweave",
    version,
    about = "Procedural patterns, mesh liquify and modifier previews from the command line"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Mirror the session log to stderr and print per-file timing.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a pattern generator state to SVG.
    Pattern(PatternArgs),
    /// Warp image(s) with liquify brush dabs.
    Liquify(LiquifyArgs),
    /// Print a layer's CSS preview and optionally rasterize it.
    Preview(PreviewArgs),
    /// Apply assistant actions to the selected layer of a document.
    ApplyActions(ApplyActionsArgs),
}

#[derive(Args, Debug)]
pub struct PatternArgs {
    /// Generator state JSON.
    #[arg(long, value_name = "STATE.json")]
    pub state: PathBuf,

    /// Image whose luminance drives the mask attributes.
    #[arg(long, value_name = "IMAGE")]
    pub mask: Option<PathBuf>,

    /// Output file; prints to stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Emit a base64 `data:image/svg+xml` URI instead of raw markup.
    #[arg(long)]
    pub data_uri: bool,
}

#[derive(Args, Debug)]
pub struct LiquifyArgs {
    /// Input image(s). Glob patterns accepted (e.g. "*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// push, pull, twirl, bloat or pinch.
    #[arg(short, long, default_value = "push")]
    pub mode: BrushMode,

    #[arg(long, default_value_t = 100.0)]
    pub brush_size: f64,

    /// Brush strength (0–1).
    #[arg(long, default_value_t = 0.5)]
    pub pressure: f64,

    /// Number of random dab centres (ignored when --at is given).
    #[arg(long, default_value_t = 5)]
    pub points: u32,

    /// Seed for the dab centres.
    #[arg(long, default_value_t = 0)]
    pub seed: u32,

    /// Mesh cells per axis.
    #[arg(long, default_value_t = DEFAULT_RESOLUTION)]
    pub resolution: usize,

    /// Explicit dab centre `x,y` in pixels. Repeatable.
    #[arg(long = "at", value_name = "X,Y", value_parser = parse_point)]
    pub at: Vec<(f64, f64)>,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Document (.json or .mwv).
    #[arg(short, long)]
    pub document: PathBuf,

    /// Layer id or zero-based index; defaults to the selected layer.
    #[arg(short, long)]
    pub layer: Option<String>,

    /// Image to rasterize the preview onto; defaults to the layer's image content.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Where to write the rasterized preview.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ApplyActionsArgs {
    /// Document (.json or .mwv).
    #[arg(short, long)]
    pub document: PathBuf,

    /// JSON file holding one action object or an array of them.
    #[arg(short, long)]
    pub actions: PathBuf,

    /// Layer to target (id or index); defaults to the document's selection.
    #[arg(short, long)]
    pub layer: Option<String>,

    /// Output document; overwrites --document when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the selected command and return an OS exit code.
/// `0` = success, `1` = any failure.
pub fn run(args: CliArgs) -> ExitCode {
    crate::logger::set_echo(args.verbose);
    let verbose = args.verbose;

    let result = match args.command {
        Command::Pattern(a) => run_pattern(&a),
        Command::Liquify(a) => return run_liquify(&a, verbose),
        Command::Preview(a) => run_preview(&a),
        Command::ApplyActions(a) => run_apply_actions(&a),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            crate::log_err!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// pattern
// ============================================================================

fn run_pattern(args: &PatternArgs) -> Result<(), String> {
    let state = io::load_generator_state(&args.state)
        .map_err(|e| format!("could not load '{}': {}", args.state.display(), e))?;
    let mask = match &args.mask {
        Some(path) => Some(
            io::load_mask(path).map_err(|e| format!("could not load mask '{}': {}", path.display(), e))?,
        ),
        None => None,
    };

    let render = pattern::render(&state, mask.as_ref());
    for skip in &render.skipped {
        eprintln!("warning: cell ({}, {}) skipped: {:?}", skip.col, skip.row, skip.reason);
    }

    let text = if args.data_uri {
        pattern::to_data_uri(&render.svg)
    } else {
        render.svg
    };
    match &args.output {
        Some(path) => std::fs::write(path, text)
            .map_err(|e| format!("could not write '{}': {}", path.display(), e))?,
        None => println!("{}", text),
    }
    Ok(())
}

// ============================================================================
// liquify (batch, per-file pipeline)
// ============================================================================

fn run_liquify(args: &LiquifyArgs, verbose: bool) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let modifier = Modifier::new(ModifierType::Liquify)
        .with_param("mode", args.mode.label())
        .with_param("brushSize", args.brush_size)
        .with_param("pressure", args.pressure)
        .with_param("points", args.points as f64)
        .with_param("seed", args.seed as f64);
    let Some(params) = LiquifyParams::from_modifier(&modifier) else {
        return ExitCode::FAILURE;
    };
    let params = LiquifyParams { resolution: args.resolution, ..params };

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) = build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref())
        else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match liquify_one(input_path, &output_path, &params, &args.at) {
            Ok(()) => {
                if verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                crate::log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn liquify_one(input: &Path, output: &Path, params: &LiquifyParams, at: &[(f64, f64)]) -> Result<(), String> {
    let image = io::load_image(input).map_err(|e| format!("load failed: {}", e))?;

    let result = if at.is_empty() {
        liquify::render_liquify_effect(&image, params)
    } else {
        let mut renderer = LiquifyRenderer::new(params.resolution);
        renderer.set_source_image(image);
        for &center in at {
            renderer.apply_brush(center, params.brush_size, params.pressure, params.mode);
            let stats = renderer.last_stats();
            if stats.degenerate_skipped > 0 {
                crate::log_warn!("{} degenerate triangle(s) skipped", stats.degenerate_skipped);
            }
        }
        renderer.into_canvas()
    };

    io::save_image(&result, output).map_err(|e| format!("save failed: {}", e))
}

// ============================================================================
// preview
// ============================================================================

fn run_preview(args: &PreviewArgs) -> Result<(), String> {
    let doc = load_doc(&args.document)?;
    let layer_id = resolve_layer(&doc, args.layer.as_deref())?;
    let layer = doc.layer(layer_id).map_err(|e| e.to_string())?;
    let style = layer.preview_style();

    println!("filter: {}", style.to_css_filter());
    println!("transform: {}", style.to_css_transform());
    println!("opacity: {}", style.opacity);
    if let Some(mode) = &style.blend_mode {
        println!("mix-blend-mode: {}", mode);
    }
    if !style.is_exact() {
        let names: Vec<String> = style.unapproximated.iter().map(|k| k.key()).collect();
        println!("not previewed: {}", names.join(", "));
    }

    let Some(output) = &args.output else {
        return Ok(());
    };
    let source = match (&args.input, &layer.content) {
        (Some(path), _) => io::load_image(path).map_err(|e| format!("load failed: {}", e))?,
        (None, Some(uri)) => io::decode_image_data_uri(uri).map_err(|e| format!("layer content: {}", e))?,
        (None, None) => return Err("--output needs --input or a layer with image content".into()),
    };
    let rendered = apply_preview_style(&source, &style);
    io::save_image(&rendered, output).map_err(|e| format!("save failed: {}", e))
}

// ============================================================================
// apply-actions
// ============================================================================

fn run_apply_actions(args: &ApplyActionsArgs) -> Result<(), String> {
    let mut doc = load_doc(&args.document)?;
    if let Some(sel) = args.layer.as_deref() {
        let id = resolve_layer(&doc, Some(sel))?;
        doc.select(id).map_err(|e| e.to_string())?;
    }

    let json = std::fs::read_to_string(&args.actions)
        .map_err(|e| format!("could not read '{}': {}", args.actions.display(), e))?;
    let parsed = actions::parse_actions(&json).map_err(|e| e.to_string())?;

    let mut history = HistoryManager::default();
    let report = actions::apply_actions(&mut doc, &mut history, &parsed).map_err(|e| e.to_string())?;
    println!(
        "applied {} action(s), skipped {} duplicate connection(s)",
        report.applied, report.skipped_duplicates
    );
    for id in &report.added_modifiers {
        println!("  added modifier {}", id);
    }

    let output = args.output.as_deref().unwrap_or(&args.document);
    io::save_document(&doc, output).map_err(|e| format!("could not write '{}': {}", output.display(), e))
}

// ============================================================================
// Helpers
// ============================================================================

fn load_doc(path: &Path) -> Result<Document, String> {
    io::load_document(path).map_err(|e| format!("could not load '{}': {}", path.display(), e))
}

/// Resolve a layer argument: a UUID, a zero-based index, or the selection.
fn resolve_layer(doc: &Document, arg: Option<&str>) -> Result<Uuid, String> {
    match arg {
        None => doc.selected_id().map_err(|e| e.to_string()),
        Some(s) => {
            if let Ok(id) = Uuid::parse_str(s) {
                doc.layer(id).map(|l| l.id).map_err(|e| e.to_string())
            } else if let Ok(index) = s.parse::<usize>() {
                doc.layers
                    .get(index)
                    .map(|l| l.id)
                    .ok_or_else(|| format!("layer index {} out of range ({} layers)", index, doc.layers.len()))
            } else {
                Err(format!("'{}' is neither a layer id nor an index", s))
            }
        }
    }
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("bad x coordinate in '{}'", s))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("bad y coordinate in '{}'", s))?;
    Ok((x, y))
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, single-file input)
/// 2. `--output-dir` (keeps the input's file name)
/// 3. Next to the input as `<stem>_liquify.<ext>`
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let file_name = input.file_name()?;
    if let Some(dir) = output_dir {
        return Some(dir.join(file_name));
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let ext = input.extension().map_or("png".into(), |e| e.to_string_lossy().into_owned());
    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_liquify.{}", stem, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Layer, LayerKind};

    #[test]
    fn parses_subcommands() {
        let args = CliArgs::try_parse_from([
            "modweave", "liquify", "-i", "a.png", "-o", "b.png", "--mode", "Twirl", "--at", "10,20", "--at", "5.5, 6",
        ])
        .unwrap();
        match args.command {
            Command::Liquify(l) => {
                assert_eq!(l.mode, BrushMode::Twirl);
                assert_eq!(l.at, vec![(10.0, 20.0), (5.5, 6.0)]);
                assert_eq!(l.resolution, DEFAULT_RESOLUTION);
                assert_eq!(l.points, 5);
            }
            other => panic!("unexpected {other:?}"),
        }

        let args = CliArgs::try_parse_from(["modweave", "pattern", "--state", "s.json", "--data-uri", "-v"]).unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Pattern(PatternArgs { data_uri: true, .. })));

        assert!(CliArgs::try_parse_from(["modweave", "liquify", "-i", "a.png", "--mode", "smudge"]).is_err());
    }

    #[test]
    fn point_parser() {
        assert_eq!(parse_point("1,2"), Ok((1.0, 2.0)));
        assert!(parse_point("1;2").is_err());
        assert!(parse_point("x,2").is_err());
    }

    #[test]
    fn layer_resolution() {
        let mut doc = Document::new(10, 10);
        let a = doc.add_layer(Layer::new("a", LayerKind::Image, 1.0, 1.0));
        let b = doc.add_layer(Layer::new("b", LayerKind::Text, 1.0, 1.0));
        assert_eq!(resolve_layer(&doc, None), Ok(b));
        assert_eq!(resolve_layer(&doc, Some("0")), Ok(a));
        assert_eq!(resolve_layer(&doc, Some(&a.to_string())), Ok(a));
        assert!(resolve_layer(&doc, Some("7")).is_err());
        assert!(resolve_layer(&doc, Some("top")).is_err());
    }

    #[test]
    fn output_paths() {
        let input = Path::new("shots/cat.jpg");
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out"))),
            Some(PathBuf::from("out/cat.jpg"))
        );
        assert_eq!(build_output_path(input, None, None), Some(PathBuf::from("shots/cat_liquify.jpg")));
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), None),
            Some(PathBuf::from("x.png"))
        );
    }
}
