//! pagesplit command-line tool
//!
//! Splits selected pages of a PDF into two halves and writes the result next
//! to the input (or wherever `--output` points).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use pagesplit_core::{
    run_split, select_pages, LopdfCanvas, MarginConvention, PageCanvas, RangeMode,
    RenderStrategy, Rotation, SplitMode, SplitOptions, SplitPolicy, SplitReport,
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConventionArg {
    /// Each half is S/2 + margin
    PerHalf,
    /// Each half is (S + margin)/2
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RenderArg {
    /// Let the page box crop the painted page
    Scale,
    /// Paint through an explicit clip rectangle
    Clip,
}

/// Command-line arguments for pagesplit
#[derive(Parser, Debug)]
#[command(name = "pagesplit")]
#[command(version, about = "Split PDF pages into two halves for printing")]
struct Args {
    /// Source PDF
    input: PathBuf,

    /// Output PDF (default: <input>_split.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pages to split, e.g. "1-3, 5" (default: every page)
    #[arg(short, long)]
    ranges: Option<String>,

    /// Extend each half past the seam so the halves overlap
    #[arg(short, long)]
    extended: bool,

    /// Margin as a fraction of the longer page side (extended mode)
    #[arg(long)]
    overlap: Option<f64>,

    /// How the margin enlarges each half
    #[arg(long, value_enum)]
    margin_convention: Option<ConventionArg>,

    /// How each half is isolated when painting
    #[arg(long, value_enum)]
    render: Option<RenderArg>,

    /// Counter-clockwise rotation applied before splitting (multiple of 90)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    rotate: i64,

    /// Reject malformed page ranges instead of ignoring them
    #[arg(long)]
    strict: bool,

    /// JSON file with a split policy; other flags override its fields
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let report = run(&args)?;
    info!(
        "Wrote {} pages ({} split)",
        report.output_pages, report.split_pages
    );

    Ok(())
}

fn run(args: &Args) -> anyhow::Result<SplitReport> {
    if !args.input.exists() {
        bail!(
            "Please supply a PDF file: {} does not exist",
            args.input.display()
        );
    }
    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let canvas = LopdfCanvas::load(&bytes)?;
    let page_count = canvas.page_count();
    info!("{}: {} pages", args.input.display(), page_count);

    let options = build_options(args, page_count)?;
    let selected = select_pages(&options.ranges, page_count, options.range_mode)?;

    let mut last_percent = None;
    let outcome = run_split(canvas, &selected, &options, |progress| {
        let percent = progress.percent();
        if last_percent != Some(percent) {
            info!("Progress: {}%", percent);
            last_percent = Some(percent);
        }
    })?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    fs::write(&output, &outcome.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Saved {}", output.display());

    Ok(outcome.report)
}

/// Merge the policy file (if any) with the command-line flags
fn build_options(args: &Args, page_count: u32) -> anyhow::Result<SplitOptions> {
    let mut policy = match &args.policy {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read policy {}", path.display()))?;
            serde_json::from_str::<SplitPolicy>(&json)
                .with_context(|| format!("Invalid policy {}", path.display()))?
        }
        None => SplitPolicy::default(),
    };

    if let Some(ratio) = args.overlap {
        policy = policy.with_overlap_ratio(ratio);
    }
    if let Some(convention) = args.margin_convention {
        policy = policy.with_margin_convention(match convention {
            ConventionArg::PerHalf => MarginConvention::PerHalf,
            ConventionArg::Folded => MarginConvention::Folded,
        });
    }
    if let Some(render) = args.render {
        policy = policy.with_render(match render {
            RenderArg::Scale => RenderStrategy::Scale,
            RenderArg::Clip => RenderStrategy::Clip,
        });
    }
    policy.validate()?;

    let rotation = Rotation::from_degrees(args.rotate).with_context(|| {
        format!(
            "Rotation must be a multiple of 90 degrees, got {}",
            args.rotate
        )
    })?;

    // Same prefill the upload form used: split everything
    let ranges = args
        .ranges
        .clone()
        .unwrap_or_else(|| format!("1-{}", page_count));

    let range_mode = if args.strict {
        RangeMode::Strict
    } else {
        RangeMode::Permissive
    };

    Ok(SplitOptions::new(ranges, SplitMode::from_extended(args.extended))
        .with_policy(policy)
        .with_rotation(rotation)
        .with_range_mode(range_mode))
}

/// `dir/name.pdf` -> `dir/name_split.pdf`
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_split.pdf", stem))
}
