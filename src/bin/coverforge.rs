use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "coverforge", version)]
struct Cli {
    /// Log debug events (history, asset preparation) to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a document to PNG or JPEG.
    Render(RenderArgs),
    /// Parse and validate a document without rendering it.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Output format; inferred from the `--out` extension when omitted.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// JPEG quality (1..=100).
    #[arg(long)]
    quality: Option<u8>,

    /// Output size multiplier (0, 8].
    #[arg(long)]
    multiplier: Option<f64>,

    /// Font file to register; may be repeated.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base directory for image and SVG sources (defaults to the document's directory).
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<coverforge::Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("open document '{}'", path.display()))?;
    let doc = coverforge::Document::from_json(&text)
        .with_context(|| format!("parse document '{}'", path.display()))?;
    Ok(doc)
}

fn infer_format(out: &Path) -> Format {
    match out
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => Format::Jpeg,
        _ => Format::Png,
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;

    let mut config = match &args.config {
        Some(path) => coverforge::EditorConfig::from_path(path)?,
        None => coverforge::EditorConfig::default(),
    };
    config.font_paths.extend(args.fonts.iter().cloned());
    if let Some(dir) = &args.assets {
        config.assets_root = Some(dir.clone());
    } else if config.assets_root.is_none() {
        config.assets_root = Some(
            args.in_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        );
    }
    if let Some(m) = args.multiplier {
        config.export.multiplier = m;
    }
    if let Some(q) = args.quality {
        config.export.jpeg_quality = q;
    }
    config.validate()?;

    let mut session = coverforge::EditorSession::open(config, doc)?;
    let report = session.prepare_assets();
    for (source, reason) in &report.failed {
        eprintln!("warning: asset '{source}' skipped: {reason}");
    }

    let bytes = match args.format.unwrap_or_else(|| infer_format(&args.out)) {
        Format::Png => session.export_png()?,
        Format::Jpeg => session.export_jpeg()?,
    };

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("write image '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    println!(
        "ok: {}x{} canvas, {} layer(s)",
        doc.canvas_width,
        doc.canvas_height,
        doc.layers.len()
    );
    for layer in &doc.layers {
        let filter = coverforge::FilterProgram::build(&layer.filter_chain).to_css();
        println!(
            "  {} [{}] opacity={} blend={:?} filter={}",
            layer.id,
            layer.content.kind_name(),
            layer.opacity,
            layer.blend_mode,
            filter
        );
    }
    Ok(())
}
