//! Page-level information extraction
//!
//! Reports each page's displayed size together with a preview of how it
//! would be split, so the UI can show the halves before anything runs.

use pagesplit_core::{
    compute_split, LopdfCanvas, PageCanvas, PageDimensions, Rotation, SplitAxis, SplitLayout,
    SplitMode, SplitPolicy,
};
use serde::Serialize;

/// Information about a single PDF page
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub page_num: u32,
    /// Displayed width in points, after /Rotate
    pub width: f64,
    /// Displayed height in points
    pub height: f64,
    /// Page /Rotate in degrees (0, 90, 180, 270)
    pub rotation: i64,
    pub orientation: PageOrientation,
}

/// Page orientation
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
    Square,
}

/// Sizes of the two pages a split would produce
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SplitPreview {
    pub page_num: u32,
    pub axis: SplitAxis,
    pub margin: f64,
    pub overlap: f64,
    pub first: [f64; 2],
    pub second: [f64; 2],
}

impl PageInfo {
    /// Extract page info from a loaded document
    pub fn from_canvas(canvas: &LopdfCanvas, page_num: u32) -> Result<Self, String> {
        let dims = canvas.page_size(page_num).map_err(|e| e.to_string())?;
        let rotation = canvas
            .source_rotation(page_num)
            .map_err(|e| e.to_string())?;

        let orientation = if (dims.width - dims.height).abs() < 1.0 {
            PageOrientation::Square
        } else if dims.width > dims.height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        };

        Ok(Self {
            page_num,
            width: dims.width,
            height: dims.height,
            rotation,
            orientation,
        })
    }

    /// Get all page infos for a document
    pub fn all_from_canvas(canvas: &LopdfCanvas) -> Result<Vec<Self>, String> {
        (1..=canvas.page_count())
            .map(|page_num| Self::from_canvas(canvas, page_num))
            .collect()
    }

    pub fn dimensions(&self) -> PageDimensions {
        PageDimensions::new(self.width, self.height)
    }

    /// Preview the split of this page, after an extra counter-clockwise turn
    pub fn preview(&self, mode: SplitMode, policy: &SplitPolicy, extra: Rotation) -> SplitPreview {
        let layout = compute_split(extra.apply(self.dimensions()), mode, policy);
        SplitPreview::from_layout(self.page_num, &layout)
    }
}

impl SplitPreview {
    fn from_layout(page_num: u32, layout: &SplitLayout) -> Self {
        let size = |dims: PageDimensions| [dims.width, dims.height];
        Self {
            page_num,
            axis: layout.axis,
            margin: layout.margin,
            overlap: layout.overlap(),
            first: size(layout.first.output_size),
            second: size(layout.second.output_size),
        }
    }
}
