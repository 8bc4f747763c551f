//! PDF page splitting
//!
//! Divides selected pages of a PDF into two halves along their longer side,
//! optionally overlapping near the seam, and passes every other page through.
//!
//! - `ranges`: page range expressions like "1-3, 5"
//! - `geometry`: split axis, half sizes and placement transforms
//! - `canvas` / `lopdf_canvas`: the document model the pipeline paints into
//! - `pipeline`: the in-order split driver with progress reporting

pub mod canvas;
pub mod command;
pub mod error;
pub mod geometry;
pub mod lopdf_canvas;
pub mod pipeline;
pub mod ranges;

pub use canvas::{EmbeddedPage, PageCanvas};
pub use command::{process_command, process_json, PdfCommand, ProcessMetrics, ProcessResult};
pub use error::SplitError;
pub use geometry::{
    compute_split, compute_split_default, ClipRect, ContentWindow, HalfPageSpec,
    MarginConvention, PageDimensions, PlacementTransform, RenderStrategy, Rotation, SplitAxis,
    SplitLayout, SplitMode, SplitPolicy, DEFAULT_OVERLAP_RATIO,
};
pub use lopdf_canvas::LopdfCanvas;
pub use pipeline::{
    run_split, split_pages, split_pages_with_progress, SplitOptions, SplitOutcome,
    SplitProgress, SplitReport,
};
pub use ranges::{parse_ranges, parse_ranges_strict, select_pages, RangeMode};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, SplitError> {
    Ok(LopdfCanvas::load(bytes)?.page_count())
}
