//! Page split pipeline
//!
//! Walks the source pages in order. Pages outside the selection are copied
//! unchanged; selected pages are embedded once and painted onto two new pages
//! laid out by the geometry engine.

use crate::canvas::PageCanvas;
use crate::error::SplitError;
use crate::geometry::{compute_split, Rotation, SplitLayout, SplitMode, SplitPolicy};
use crate::lopdf_canvas::LopdfCanvas;
use crate::ranges::{select_pages, RangeMode};
use serde::{Deserialize, Serialize};

/// Everything a caller chooses for one split
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Pages to split, e.g. "1-3, 5". Empty selects nothing.
    pub ranges: String,
    pub mode: SplitMode,
    pub policy: SplitPolicy,
    /// Extra counter-clockwise turn applied to split pages
    pub rotation: Rotation,
    pub range_mode: RangeMode,
}

impl SplitOptions {
    pub fn new(ranges: impl Into<String>, mode: SplitMode) -> Self {
        Self {
            ranges: ranges.into(),
            mode,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: SplitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_range_mode(mut self, range_mode: RangeMode) -> Self {
        self.range_mode = range_mode;
        self
    }
}

/// Reported after each source page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitProgress {
    pub processed: u32,
    pub total: u32,
}

impl SplitProgress {
    /// Rounded completion percentage
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((u64::from(self.processed) * 100 + u64::from(self.total) / 2) / u64::from(self.total))
            as u32
    }
}

/// Page counts of a finished split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub source_pages: u32,
    pub split_pages: u32,
    pub output_pages: u32,
}

/// Output document plus its page counts
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub bytes: Vec<u8>,
    pub report: SplitReport,
}

/// Split pages of a PDF
pub fn split_pages(bytes: &[u8], options: &SplitOptions) -> Result<SplitOutcome, SplitError> {
    split_pages_with_progress(bytes, options, |_| {})
}

/// Split pages of a PDF, reporting progress once per source page
pub fn split_pages_with_progress<F>(
    bytes: &[u8],
    options: &SplitOptions,
    progress: F,
) -> Result<SplitOutcome, SplitError>
where
    F: FnMut(SplitProgress),
{
    options.policy.validate()?;

    let canvas = LopdfCanvas::load(bytes)?;
    let selected = select_pages(&options.ranges, canvas.page_count(), options.range_mode)?;

    run_split(canvas, &selected, options, progress)
}

/// Drive any [`PageCanvas`] through a split.
///
/// `selected` must be ascending, as returned by the range parser.
pub fn run_split<C, F>(
    mut canvas: C,
    selected: &[u32],
    options: &SplitOptions,
    mut progress: F,
) -> Result<SplitOutcome, SplitError>
where
    C: PageCanvas,
    F: FnMut(SplitProgress),
{
    let total = canvas.page_count();
    let mut split_count = 0;

    for page_num in 1..=total {
        if selected.binary_search(&page_num).is_ok() {
            let layout = split_page(&mut canvas, page_num, options)?;
            tracing::debug!(
                "Split page {} along {:?} (margin {:.2}, overlap {:.2})",
                page_num,
                layout.axis,
                layout.margin,
                layout.overlap()
            );
            split_count += 1;
        } else {
            canvas.copy_page(page_num)?;
            tracing::debug!("Copied page {} unchanged", page_num);
        }

        progress(SplitProgress {
            processed: page_num,
            total,
        });
    }

    let bytes = canvas.finish()?;
    let report = SplitReport {
        source_pages: total,
        split_pages: split_count,
        output_pages: total + split_count,
    };

    tracing::info!(
        "Split {} of {} pages into {} output pages ({} bytes)",
        report.split_pages,
        report.source_pages,
        report.output_pages,
        bytes.len()
    );

    Ok(SplitOutcome { bytes, report })
}

/// Embed one page and paint it onto its two halves
fn split_page<C: PageCanvas>(
    canvas: &mut C,
    page_num: u32,
    options: &SplitOptions,
) -> Result<SplitLayout, SplitError> {
    let embedded = canvas.embed_page(page_num, options.rotation)?;
    if !embedded.dimensions.is_valid() {
        return Err(SplitError::InvalidPage(format!(
            "Page {} has invalid size {}x{}",
            page_num, embedded.dimensions.width, embedded.dimensions.height
        )));
    }

    let layout = compute_split(embedded.dimensions, options.mode, &options.policy);
    for half in layout.halves() {
        let page = canvas.add_page(half.output_size)?;
        canvas.draw_embedded(&page, &embedded.handle, &half.placement)?;
    }

    Ok(layout)
}
