//! Page layout: labels for label stock and tiled A4 sheets.
//!
//! A [`PageComposer`] turns a loaded source PDF into a new document;
//! [`ComposeService`] handles file I/O around it so that the output file is
//! only written once the whole document has been built.

pub mod label;
pub mod pdf;
pub mod sheet;
pub mod strategy;

pub use label::{fit_scale, LabelComposer};
pub use pdf::{EmbeddedPage, OutputDocument, PageBox, PageCanvas, PageSize, Placement, SourceDocument, TextStyle};
pub use sheet::{SheetComposer, SheetPlan};
pub use strategy::{ComposeResult, Composition, PageComposer};

use crate::error::{LabelError, LabelResult};
use std::path::Path;

/// Layout service running a composer over an input file.
pub struct ComposeService {
    composer: Box<dyn PageComposer>,
}

impl ComposeService {
    /// Creates a new service with the specified composer.
    pub fn new(composer: Box<dyn PageComposer>) -> Self {
        Self { composer }
    }

    /// Creates a service for tiled A4 sheets with default settings.
    pub fn with_sheet_layout() -> Self {
        Self::new(Box::new(SheetComposer::new()))
    }

    pub fn composer_name(&self) -> &str {
        self.composer.name()
    }

    /// Lays out `input` and writes the result to `output`.
    ///
    /// # Arguments
    /// * `input` - Path to the source PDF
    /// * `output` - Path for the laid out PDF
    ///
    /// # Returns
    /// Statistics about the run
    pub fn compose(&self, input: &Path, output: &Path) -> LabelResult<ComposeResult> {
        if !input.exists() {
            return Err(LabelError::Io {
                path: input.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Input file does not exist",
                ),
            });
        }

        let source = SourceDocument::load(input)?;
        log::info!(
            "{}: laying out {} page(s) from {}",
            self.composer.name(),
            source.page_count(),
            input.display()
        );

        let Composition { document, result } = self.composer.compose(&source)?;
        let bytes = document.to_bytes()?;
        std::fs::write(output, bytes).map_err(|e| LabelError::Io {
            path: output.to_path_buf(),
            source: e,
        })?;

        log::info!(
            "wrote {} page(s) to {}",
            result.pages_written,
            output.display()
        );
        Ok(result)
    }
}
