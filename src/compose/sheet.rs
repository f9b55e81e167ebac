//! Two labels per A4 sheet, each rotated a quarter turn clockwise.

use super::pdf::{OutputDocument, PageCanvas, PageSize, Placement, SourceDocument};
use super::strategy::{ComposeResult, Composition, PageComposer};
use crate::config::SHEET_MARGIN;
use crate::domain::in_chunks;
use crate::error::LabelResult;

const TILES_PER_PAGE: usize = 2;
const TILE_ROTATION: f32 = -90.0;

/// Page numbers (1-based) per sheet slot; `None` leaves the slot blank.
pub type SheetPlan = Vec<Vec<Option<usize>>>;

/// Sheet tiling layout.
#[derive(Debug, Clone)]
pub struct SheetComposer {
    skip_first: bool,
    margin: f32,
    tiles_per_page: usize,
    page_size: PageSize,
}

impl SheetComposer {
    pub fn new() -> Self {
        Self {
            skip_first: false,
            margin: SHEET_MARGIN,
            tiles_per_page: TILES_PER_PAGE,
            page_size: PageSize::A4,
        }
    }

    /// Leaves the first slot of the first sheet empty.
    pub fn with_skip_first(mut self, skip_first: bool) -> Self {
        self.skip_first = skip_first;
        self
    }

    /// Sets the inward offset of every tile, in points.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Assigns input pages to sheet slots.
    pub fn plan(&self, page_count: usize) -> SheetPlan {
        let mut slots: Vec<Option<usize>> = Vec::with_capacity(page_count + 1);
        if self.skip_first {
            slots.push(None);
        }
        slots.extend((1..=page_count).map(Some));
        in_chunks(&slots, self.tiles_per_page)
    }

    /// Anchor of tile `index` on a sheet.
    pub fn tile_origin(&self, index: usize) -> (f32, f32) {
        let height = self.page_size.height;
        let band = height / self.tiles_per_page as f32;
        let y = height - band * index as f32;
        (self.margin, y - self.margin)
    }
}

impl Default for SheetComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageComposer for SheetComposer {
    fn compose(&self, source: &SourceDocument) -> LabelResult<Composition> {
        let mut output = OutputDocument::new();
        let plan = self.plan(source.page_count());

        for (sheet_index, sheet) in plan.iter().enumerate() {
            let mut canvas = PageCanvas::new();
            for (tile, slot) in sheet.iter().enumerate() {
                let Some(page_number) = *slot else {
                    continue;
                };
                let embedded = output.embed_page(source, page_number)?;
                let (x, y) = self.tile_origin(tile);
                canvas.draw_page(
                    &embedded,
                    Placement {
                        x,
                        y,
                        scale: 1.0,
                        rotation: TILE_ROTATION,
                    },
                );
            }
            log::debug!("sheet {}: {:?}", sheet_index + 1, sheet);
            output.add_page(self.page_size, canvas)?;
        }

        Ok(Composition {
            result: ComposeResult {
                pages_processed: source.page_count(),
                pages_written: output.page_count(),
                ..Default::default()
            },
            document: output,
        })
    }

    fn name(&self) -> &str {
        "to-A4"
    }
}
