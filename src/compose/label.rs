//! One label per page, scaled onto label stock and annotated with the
//! order lines of the matching order.

use super::pdf::{OutputDocument, PageBox, PageCanvas, PageSize, Placement, SourceDocument, TextStyle};
use super::strategy::{ComposeResult, Composition, PageComposer};
use crate::domain::{OrderLineFormatter, OrderLineItem, OrdersByPayment, ReferenceMatch, ReferenceMatcher};
use crate::error::{LabelError, LabelResult};

/// Distance of the order text from the top-right corner, in points.
const ANNOTATION_INSET: f32 = 10.0;
const ANNOTATION_FONT_SIZE: f32 = 8.0;
const ANNOTATION_LINE_HEIGHT: f32 = 8.0;
const ANNOTATION_ROTATION: f32 = 270.0;

/// Uniform scale fitting `page` inside `target`, preserving aspect ratio.
pub fn fit_scale(page: &PageBox, target: PageSize) -> f32 {
    (target.width / page.width).min(target.height / page.height)
}

/// Label layout with order annotations.
pub struct LabelComposer {
    orders: OrdersByPayment,
    matcher: ReferenceMatcher,
    formatter: OrderLineFormatter,
    page_size: PageSize,
}

impl LabelComposer {
    /// Creates a composer for 102×162 mm labels.
    pub fn new(orders: OrdersByPayment) -> Self {
        Self {
            orders,
            matcher: ReferenceMatcher::new(),
            formatter: OrderLineFormatter::new(),
            page_size: PageSize::LABEL_102X162,
        }
    }

    pub fn with_formatter(mut self, formatter: OrderLineFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_matcher(mut self, matcher: ReferenceMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Line items of the order referenced in a page's text, if any.
    pub fn resolve_items<S: AsRef<str>>(&self, fragments: &[S]) -> (ReferenceMatch, Option<&[OrderLineItem]>) {
        let found = self.matcher.resolve(fragments, &self.orders);
        let items = found
            .payment_id()
            .and_then(|id| self.orders.get(&id))
            .map(Vec::as_slice)
            .filter(|items| !items.is_empty());
        (found, items)
    }

    fn annotation_style(&self) -> TextStyle {
        TextStyle {
            x: self.page_size.width - ANNOTATION_INSET,
            y: self.page_size.height - ANNOTATION_INSET,
            size: ANNOTATION_FONT_SIZE,
            line_height: ANNOTATION_LINE_HEIGHT,
            rotation: ANNOTATION_ROTATION,
        }
    }

    fn report_unmatched(page_number: usize, fragments: &[String], found: &ReferenceMatch) {
        log::warn!("could not find orders for page {}", page_number);
        log::warn!("  page text: {:?}", fragments);
        log::warn!("  reference: {}", found.candidate_reference().unwrap_or("<none>"));
        log::warn!(
            "  matches: {:?}",
            found
                .candidates
                .iter()
                .map(|c| format!("{}={}", c.pattern, c.digits))
                .collect::<Vec<_>>()
        );
    }
}

impl PageComposer for LabelComposer {
    fn compose(&self, source: &SourceDocument) -> LabelResult<Composition> {
        let mut output = OutputDocument::new();
        let mut result = ComposeResult {
            pages_processed: source.page_count(),
            ..Default::default()
        };

        for page_number in 1..=source.page_count() {
            let embedded = output.embed_page(source, page_number)?;
            if embedded.bbox.width <= 0.0 || embedded.bbox.height <= 0.0 {
                return Err(LabelError::Layout {
                    message: "page has an empty media box".to_string(),
                    page: Some(page_number),
                });
            }

            let mut canvas = PageCanvas::new();
            canvas.draw_page(
                &embedded,
                Placement {
                    x: 0.0,
                    y: 0.0,
                    scale: fit_scale(&embedded.bbox, self.page_size),
                    rotation: 0.0,
                },
            );

            let fragments = source.page_fragments(page_number)?;
            let (found, items) = self.resolve_items(&fragments);
            match items {
                Some(items) => {
                    log::debug!(
                        "page {}: payment {} with {} line item(s)",
                        page_number,
                        items[0].payment_id,
                        items.len()
                    );
                    canvas.draw_text_block(
                        &self.formatter.annotation_text(items),
                        self.annotation_style(),
                    );
                    result.pages_annotated += 1;
                }
                None => {
                    Self::report_unmatched(page_number, &fragments, &found);
                    result.unmatched_pages.push(page_number);
                }
            }

            output.add_page(self.page_size, canvas)?;
            result.pages_written += 1;
        }

        Ok(Composition {
            document: output,
            result,
        })
    }

    fn name(&self) -> &str {
        "to-102x162"
    }
}
