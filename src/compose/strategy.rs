//! Composer trait and supporting types.

use super::pdf::{OutputDocument, SourceDocument};
use crate::error::LabelResult;

/// Statistics about a layout run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeResult {
    /// Input pages read
    pub pages_processed: usize,

    /// Output pages written
    pub pages_written: usize,

    /// Output pages carrying order lines
    pub pages_annotated: usize,

    /// Input pages (1-based) whose order could not be resolved
    pub unmatched_pages: Vec<usize>,
}

impl ComposeResult {
    pub fn has_unmatched(&self) -> bool {
        !self.unmatched_pages.is_empty()
    }
}

/// Output of a composer: the new document plus what happened.
pub struct Composition {
    pub document: OutputDocument,
    pub result: ComposeResult,
}

/// A way of laying input pages out onto new pages.
pub trait PageComposer {
    /// Lays out every page of `source` into a new document.
    fn compose(&self, source: &SourceDocument) -> LabelResult<Composition>;

    /// Human-readable name of this layout.
    fn name(&self) -> &str;
}
