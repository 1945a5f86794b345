use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::{json, Value};
use sketchframe_vision::config::{device_canvas, VisionConfig, DEVICE_CANVAS_SIZES};
use sketchframe_vision::decode::{decode_base64_bytes, decode_image_bytes};
use sketchframe_vision::pipeline::{
    analyze_image, analyze_sketch, analyze_sketch_simple, AnalyzeOptions, SketchAnalysis,
};
use sketchframe_vision::synth::{render_sketch, sketch_boxes};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SKETCHFRAME_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "sketchframe",
    version,
    about = "Turn photos of hand-drawn UI sketches into wireframe layout JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print supported commands in JSON
    Commands,
    /// Detect and classify UI components in a sketch photo
    Analyze(AnalyzeArgs),
    /// Render the synthetic test sketch to a PNG
    Synth(SynthArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input image path (PNG/JPEG/GIF)
    image: Option<PathBuf>,
    /// Read a base64 payload (optionally a data URI) from a file, or - for stdin
    #[arg(long, conflicts_with = "image")]
    base64: Option<String>,
    /// Path to write the analysis JSON
    #[arg(long)]
    json_out: Option<PathBuf>,
    /// Path to write the debug overlay PNG
    #[arg(long)]
    debug_out: Option<PathBuf>,
    /// Path to write the edge map PNG
    #[arg(long)]
    edges_out: Option<PathBuf>,
    /// Target device preset (macbook, iphone)
    #[arg(long)]
    device: Option<String>,
    /// Target canvas width in px (overrides --device)
    #[arg(long)]
    canvas_width: Option<u32>,
    /// Target canvas height in px (overrides --device)
    #[arg(long)]
    canvas_height: Option<u32>,
    /// Wireframe name stored in the layout
    #[arg(long)]
    name: Option<String>,
    /// JSON config file with pipeline tuning values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print only the layout JSON
    #[arg(long, action = ArgAction::SetTrue)]
    simple: bool,
}

#[derive(Args, Debug)]
struct SynthArgs {
    /// Output PNG path
    out: PathBuf,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Commands => print_commands(),
        Commands::Analyze(args) => command_analyze(args),
        Commands::Synth(args) => command_synth(args),
    }
}

fn print_commands() -> Result<()> {
    let devices: Vec<&str> = DEVICE_CANVAS_SIZES.iter().map(|(name, _, _)| *name).collect();
    let rows = vec![
        json!({
            "name": "analyze",
            "description": "Detect, classify and place UI components from a sketch photo.",
            "devices": devices
        }),
        json!({
            "name": "synth",
            "description": "Render the synthetic navbar/hero/cards/footer test sketch."
        }),
    ];

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "commands": rows }))?
    );
    Ok(())
}

fn command_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let canvas = resolve_canvas(
        args.device.as_deref(),
        args.canvas_width,
        args.canvas_height,
        &config,
    );

    if args.simple && args.debug_out.is_none() && args.edges_out.is_none() {
        if let (Some(source), None) = (args.base64.as_deref(), canvas) {
            let mut layout = analyze_sketch_simple(&read_text_source(source)?, &config)?;
            if let (Some(name), Some(obj)) = (args.name.as_deref(), layout.as_object_mut()) {
                obj.insert("name".to_string(), json!(name));
            }
            return emit(layout, args.json_out.as_deref());
        }
    }

    let mut options = AnalyzeOptions {
        return_debug_overlay: args.debug_out.is_some(),
        target_canvas: canvas,
        ..AnalyzeOptions::default()
    };
    if let Some(name) = args.name.clone() {
        options.name = name;
    }

    let analysis = match (&args.base64, &args.image) {
        (Some(source), _) => analyze_sketch(&read_text_source(source)?, &options, &config)?,
        (None, Some(path)) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read image: {}", path.display()))?;
            let image = decode_image_bytes(&bytes)
                .with_context(|| format!("failed to decode image: {}", path.display()))?;
            analyze_image(&image, &options, &config)?
        }
        (None, None) => bail!("provide an image path or --base64 <file|->"),
    };
    debug!(
        components = analysis.layout.components.len(),
        "analysis finished"
    );

    if let Some(path) = args.edges_out.as_deref() {
        ensure_parent_dir(path)?;
        analysis
            .edges
            .save(path)
            .with_context(|| format!("failed to write edge map: {}", path.display()))?;
    }
    if let Some(path) = args.debug_out.as_deref() {
        write_overlay_png(&analysis, path)?;
    }

    let mut payload = if args.simple {
        serde_json::to_value(&analysis.layout)?
    } else {
        serde_json::to_value(&analysis)?
    };
    if let Some(obj) = payload.as_object_mut() {
        if let Some(path) = args.debug_out.as_deref() {
            obj.insert("debug_out".to_string(), json!(abs_path(path)));
            obj.remove("debug_overlay_image");
        }
        if let Some(path) = args.edges_out.as_deref() {
            obj.insert("edges_out".to_string(), json!(abs_path(path)));
        }
    }
    emit(payload, args.json_out.as_deref())
}

fn command_synth(args: SynthArgs) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("synthetic sketch size must be non-zero, got {}x{}", args.width, args.height);
    }
    let image = render_sketch(args.width, args.height);
    ensure_parent_dir(&args.out)?;
    image
        .save(&args.out)
        .with_context(|| format!("failed to write sketch: {}", args.out.display()))?;

    let boxes: Vec<Value> = sketch_boxes(args.width, args.height)
        .into_iter()
        .map(|(label, [x0, y0, x1, y1])| json!({"label": label, "x0": x0, "y0": y0, "x1": x1, "y1": y1}))
        .collect();
    println!(
        "{}",
        serde_json::to_string(&json!({
            "out": abs_path(&args.out),
            "width": args.width,
            "height": args.height,
            "boxes": boxes
        }))?
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<VisionConfig> {
    let config = match path {
        Some(path) => VisionConfig::from_json_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => VisionConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

/// Explicit width/height win, then the device preset, then the config default.
fn resolve_canvas(
    device: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
    config: &VisionConfig,
) -> Option<(u32, u32)> {
    if device.is_none() && width.is_none() && height.is_none() {
        return None;
    }
    let (base_w, base_h) = device.map(device_canvas).unwrap_or_else(|| config.default_canvas());
    Some((width.unwrap_or(base_w), height.unwrap_or(base_h)))
}

fn read_text_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read base64 payload from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(source).with_context(|| format!("failed to read base64 payload: {source}"))
}

fn write_overlay_png(analysis: &SketchAnalysis, path: &Path) -> Result<()> {
    let Some(encoded) = analysis.debug_overlay_image.as_deref() else {
        bail!("debug overlay was not rendered");
    };
    let bytes = decode_base64_bytes(encoded).context("invalid debug overlay payload")?;
    ensure_parent_dir(path)?;
    fs::write(path, bytes).with_context(|| format!("failed to write overlay: {}", path.display()))?;
    Ok(())
}

fn emit(payload: Value, json_out: Option<&Path>) -> Result<()> {
    if let Some(path) = json_out {
        write_json_pretty(path, &payload)?;
    }
    println!("{}", serde_json::to_string(&payload)?);
    Ok(())
}

fn write_json_pretty(path: &Path, value: &Value) -> Result<()> {
    ensure_parent_dir(path)?;
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).with_context(|| format!("failed to write JSON: {}", path.display()))?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create parent directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn abs_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}
