use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use brand_palette_wasm::structural::style_requests;
use brand_palette_wasm::{ExtractorConfig, PageSnapshot, PaletteExtractor, SnapshotPage};
use clap::Parser;
use tracing::{Level, warn};

/// Extract a brand color palette from a rendered page snapshot.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Page snapshot (JSON) with computed styles, custom properties and an optional screenshot path
    #[arg(required_unless_present = "print_selectors")]
    snapshot: Option<PathBuf>,

    /// Viewport capture to quantize; overrides the snapshot's `screenshot` field
    #[arg(short, long)]
    screenshot: Option<PathBuf>,

    /// Budget for the viewport capture and quantization, in milliseconds
    #[arg(short, long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Structural colors needed to skip the screenshot stage
    #[arg(short, long, default_value_t = 3)]
    min_colors: usize,

    /// Log every candidate and rejection to stderr (also enabled by BRAND_PALETTE_DEBUG)
    #[arg(short, long)]
    verbose: bool,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Print the selectors and properties a snapshot must contain, then exit
    #[arg(long)]
    print_selectors: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ExtractorConfig::from_env()
        .with_screenshot_timeout(Duration::from_millis(args.timeout_ms))
        .with_min_colors(args.min_colors);
    if args.verbose {
        config = config.with_verbose(true);
    }

    tracing_subscriber::fmt()
        .with_max_level(if config.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    if args.print_selectors {
        println!("{}", serde_json::to_string_pretty(&style_requests())?);
        return Ok(());
    }

    let snapshot_path = args.snapshot.context("no snapshot given")?;
    let text = fs::read_to_string(&snapshot_path)
        .with_context(|| format!("reading {}", snapshot_path.display()))?;
    let snapshot = PageSnapshot::from_json(&text).context("invalid page snapshot")?;

    // An explicit --screenshot must exist. A capture named by the snapshot is best effort:
    // without it the page simply has no capture and the screenshot stage fails softly.
    let capture = match args.screenshot {
        Some(path) => {
            Some(fs::read(&path).with_context(|| format!("reading {}", path.display()))?)
        }
        None => snapshot
            .screenshot
            .as_ref()
            .map(|p| relative_to(&snapshot_path, p))
            .and_then(|path| match fs::read(&path) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "snapshot screenshot unreadable, continuing without it"
                    );
                    None
                }
            }),
    };

    let mut page = SnapshotPage::new(snapshot);
    if let Some(bytes) = capture {
        page = page.with_encoded_capture(bytes);
    }

    let palette = PaletteExtractor::new(config)
        .extract(&page)
        .context("palette extraction failed")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&palette)?
    } else {
        serde_json::to_string(&palette)?
    };
    println!("{json}");

    Ok(())
}

fn relative_to(snapshot_path: &Path, screenshot: &Path) -> PathBuf {
    match snapshot_path.parent() {
        Some(dir) if screenshot.is_relative() => dir.join(screenshot),
        _ => screenshot.to_path_buf(),
    }
}
