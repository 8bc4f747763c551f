//! Document model consumed by the split pipeline
//!
//! A `PageCanvas` holds a loaded source document and the output being built
//! from it. Handles it hands out are only valid for the canvas that created
//! them and are never kept past the page being processed.

use crate::error::SplitError;
use crate::geometry::{PageDimensions, PlacementTransform, Rotation};

/// Source page content embedded for reuse on output pages
#[derive(Debug, Clone)]
pub struct EmbeddedPage<H> {
    pub handle: H,
    /// Size of the content as painted, after rotation
    pub dimensions: PageDimensions,
}

pub trait PageCanvas {
    /// An output page created with [`PageCanvas::add_page`]
    type Page;
    /// Reusable content of a source page
    type Embedded;

    /// Number of pages in the source document
    fn page_count(&self) -> u32;

    /// Displayed size of a source page (1-indexed)
    fn page_size(&self, page_num: u32) -> Result<PageDimensions, SplitError>;

    /// Append a source page to the output unchanged
    fn copy_page(&mut self, page_num: u32) -> Result<(), SplitError>;

    /// Turn a source page into paintable content, rotated counter-clockwise
    /// by `rotation` on top of the page's own display rotation
    fn embed_page(
        &mut self,
        page_num: u32,
        rotation: Rotation,
    ) -> Result<EmbeddedPage<Self::Embedded>, SplitError>;

    /// Append an empty output page
    fn add_page(&mut self, size: PageDimensions) -> Result<Self::Page, SplitError>;

    /// Paint embedded content onto an output page
    fn draw_embedded(
        &mut self,
        page: &Self::Page,
        embedded: &Self::Embedded,
        placement: &PlacementTransform,
    ) -> Result<(), SplitError>;

    /// Serialize the output document
    fn finish(self) -> Result<Vec<u8>, SplitError>;
}
