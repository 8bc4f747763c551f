//! Split geometry engine
//!
//! Given a page's size and a split mode, computes the split axis, the size of
//! both output pages and the transform used to paint the original content onto
//! each of them. Coordinates follow PDF user space: origin bottom-left, y up.
//!
//! The engine does no I/O and never fails. Non-positive dimensions produce
//! non-positive output sizes; callers check [`PageDimensions::is_valid`].

use crate::error::SplitError;
use serde::{Deserialize, Serialize};

/// Width and height of a page in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn longer_side(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// Direction of the cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitAxis {
    /// Cut across the page, producing a top and a bottom half
    Horizontal,
    /// Cut down the page, producing a left and a right half
    Vertical,
}

impl SplitAxis {
    /// Portrait pages split top/bottom, everything else (square included) left/right
    pub fn for_dimensions(dims: PageDimensions) -> Self {
        if dims.height > dims.width {
            SplitAxis::Horizontal
        } else {
            SplitAxis::Vertical
        }
    }

    /// Length of the side being cut
    pub fn extent(self, dims: PageDimensions) -> f64 {
        match self {
            SplitAxis::Horizontal => dims.height,
            SplitAxis::Vertical => dims.width,
        }
    }
}

/// Whether the two halves share an overlapping strip around the seam
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    /// Two equal halves meeting exactly at the seam
    #[default]
    Plain,
    /// Each half grows by a margin past the seam
    Extended,
}

impl SplitMode {
    pub fn from_extended(extended: bool) -> Self {
        if extended {
            SplitMode::Extended
        } else {
            SplitMode::Plain
        }
    }
}

/// How the margin enlarges each half
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginConvention {
    /// Each half is `S/2 + m`; halves overlap by `2m`
    #[default]
    PerHalf,
    /// Each half is `(S + m)/2`; halves overlap by `m`
    Folded,
}

impl MarginConvention {
    /// Output extent along the split axis for a side of length `extent`
    pub fn half_extent(self, extent: f64, margin: f64) -> f64 {
        match self {
            MarginConvention::PerHalf => extent / 2.0 + margin,
            MarginConvention::Folded => (extent + margin) / 2.0,
        }
    }
}

/// How the painted content is restricted to one half
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderStrategy {
    /// Paint the whole page and let the output page box crop it
    #[default]
    Scale,
    /// Paint the whole page inside an explicit clip rectangle
    Clip,
}

/// Named margin and rendering conventions for Extended splits.
///
/// The margin is `overlap_ratio * max(width, height)`. Because the cut always
/// runs across the longer side, this is also a fraction of the split axis, so
/// the raster tool's fixed 55/45 split is `fixed_overlap()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitPolicy {
    pub overlap_ratio: f64,
    pub margin_convention: MarginConvention,
    pub render: RenderStrategy,
}

/// Margin fraction used when nothing else is configured
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.05;

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
            margin_convention: MarginConvention::PerHalf,
            render: RenderStrategy::Scale,
        }
    }
}

impl SplitPolicy {
    /// 55% halves drawn through a clip rectangle (10% shared strip)
    pub fn fixed_overlap() -> Self {
        Self {
            overlap_ratio: 0.05,
            margin_convention: MarginConvention::PerHalf,
            render: RenderStrategy::Clip,
        }
    }

    pub fn with_overlap_ratio(mut self, ratio: f64) -> Self {
        self.overlap_ratio = ratio;
        self
    }

    pub fn with_margin_convention(mut self, convention: MarginConvention) -> Self {
        self.margin_convention = convention;
        self
    }

    pub fn with_render(mut self, render: RenderStrategy) -> Self {
        self.render = render;
        self
    }

    /// A half may never cover the whole page, so the ratio must stay below 0.5
    pub fn validate(&self) -> Result<(), SplitError> {
        let ratio = self.overlap_ratio;
        if !ratio.is_finite() || !(0.0..0.5).contains(&ratio) {
            return Err(SplitError::InvalidPolicy(format!(
                "overlap ratio must be in [0, 0.5), got {}",
                ratio
            )));
        }
        Ok(())
    }

    /// Margin added past the seam for a page in the given mode
    pub fn margin(&self, dims: PageDimensions, mode: SplitMode) -> f64 {
        match mode {
            SplitMode::Plain => 0.0,
            SplitMode::Extended => dims.longer_side() * self.overlap_ratio,
        }
    }
}

/// Axis-aligned rectangle, origin at its lower-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Which part of the painted content stays visible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContentWindow {
    /// Content is drawn 1:1 and cropped by the output page box. The factors
    /// are the visible fraction of the source along each axis.
    Scale { x_scale: f64, y_scale: f64 },
    /// Content is drawn 1:1 inside this rectangle (output page coordinates)
    Clip(ClipRect),
}

/// Where and how the full source page is painted onto an output page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementTransform {
    /// Origin of the painted source page in output page coordinates
    pub x: f64,
    pub y: f64,
    /// Size the source page is painted at
    pub width: f64,
    pub height: f64,
    pub window: ContentWindow,
}

/// One output page derived from a split source page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfPageSpec {
    pub output_size: PageDimensions,
    pub placement: PlacementTransform,
}

impl HalfPageSpec {
    /// The part of the source page visible on this output page, in source coordinates
    pub fn source_region(&self) -> ClipRect {
        ClipRect {
            x: -self.placement.x,
            y: -self.placement.y,
            width: self.output_size.width,
            height: self.output_size.height,
        }
    }
}

/// Result of splitting one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitLayout {
    pub axis: SplitAxis,
    pub margin: f64,
    /// Top half (Horizontal) or left half (Vertical)
    pub first: HalfPageSpec,
    /// Bottom half (Horizontal) or right half (Vertical)
    pub second: HalfPageSpec,
}

impl SplitLayout {
    /// Length of the strip shown on both halves, measured along the split axis
    pub fn overlap(&self) -> f64 {
        let a = self.first.source_region();
        let b = self.second.source_region();
        let shared = match self.axis {
            SplitAxis::Vertical => (a.x + a.width).min(b.x + b.width) - a.x.max(b.x),
            SplitAxis::Horizontal => (a.y + a.height).min(b.y + b.height) - a.y.max(b.y),
        };
        shared.max(0.0)
    }

    /// Output pages in document order
    pub fn halves(&self) -> [&HalfPageSpec; 2] {
        [&self.first, &self.second]
    }
}

fn half_spec(
    source: PageDimensions,
    output_size: PageDimensions,
    offset: (f64, f64),
    render: RenderStrategy,
) -> HalfPageSpec {
    let window = match render {
        RenderStrategy::Scale => ContentWindow::Scale {
            x_scale: output_size.width / source.width,
            y_scale: output_size.height / source.height,
        },
        RenderStrategy::Clip => ContentWindow::Clip(ClipRect {
            x: 0.0,
            y: 0.0,
            width: output_size.width,
            height: output_size.height,
        }),
    };

    HalfPageSpec {
        output_size,
        placement: PlacementTransform {
            x: offset.0,
            y: offset.1,
            width: source.width,
            height: source.height,
            window,
        },
    }
}

/// Compute both halves of a page split
pub fn compute_split(dims: PageDimensions, mode: SplitMode, policy: &SplitPolicy) -> SplitLayout {
    let axis = SplitAxis::for_dimensions(dims);
    let margin = policy.margin(dims, mode);
    let extent = axis.extent(dims);
    let half = policy.margin_convention.half_extent(extent, margin);
    // Offset that brings the far end of the page onto the second window
    let shift = -(extent - half);

    let (first, second) = match axis {
        SplitAxis::Vertical => {
            let size = PageDimensions::new(half, dims.height);
            (
                half_spec(dims, size, (0.0, 0.0), policy.render),
                half_spec(dims, size, (shift, 0.0), policy.render),
            )
        }
        SplitAxis::Horizontal => {
            let size = PageDimensions::new(dims.width, half);
            (
                half_spec(dims, size, (0.0, shift), policy.render),
                half_spec(dims, size, (0.0, 0.0), policy.render),
            )
        }
    };

    SplitLayout {
        axis,
        margin,
        first,
        second,
    }
}

/// [`compute_split`] with the default policy
pub fn compute_split_default(dims: PageDimensions, mode: SplitMode) -> SplitLayout {
    compute_split(dims, mode, &SplitPolicy::default())
}

/// Counter-clockwise quarter turn applied to a page before it is split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    /// Accepts any multiple of 90, negative values included
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(match degrees.rem_euclid(360) {
            0 => Rotation::None,
            90 => Rotation::Ccw90,
            180 => Rotation::Ccw180,
            _ => Rotation::Ccw270,
        })
    }

    /// Convert a page `/Rotate` value (clockwise) into the turn that makes the
    /// page upright as a viewer shows it
    pub fn from_page_rotate(rotate: i64) -> Self {
        Self::from_degrees(-rotate).unwrap_or_default()
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Ccw90 => 90,
            Rotation::Ccw180 => 180,
            Rotation::Ccw270 => 270,
        }
    }

    /// Apply `self`, then `next`
    pub fn then(self, next: Rotation) -> Rotation {
        Self::from_degrees(self.degrees() + next.degrees()).unwrap_or_default()
    }

    pub fn swaps_sides(self) -> bool {
        matches!(self, Rotation::Ccw90 | Rotation::Ccw270)
    }

    /// Page size after rotation
    pub fn apply(self, dims: PageDimensions) -> PageDimensions {
        if self.swaps_sides() {
            PageDimensions::new(dims.height, dims.width)
        } else {
            dims
        }
    }

    /// PDF matrix `[a b c d e f]` mapping the box `[0 0 w h]` onto the rotated
    /// box `[0 0 w' h']`
    pub fn matrix(self, dims: PageDimensions) -> [f64; 6] {
        let (w, h) = (dims.width, dims.height);
        match self {
            Rotation::None => [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            Rotation::Ccw90 => [0.0, 1.0, -1.0, 0.0, h, 0.0],
            Rotation::Ccw180 => [-1.0, 0.0, 0.0, -1.0, w, h],
            Rotation::Ccw270 => [0.0, -1.0, 1.0, 0.0, 0.0, w],
        }
    }
}
