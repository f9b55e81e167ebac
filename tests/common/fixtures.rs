//! Test fixtures and PDF builders.
//!
//! Builds label exports the way the merch backend produces them: one label
//! per page, every text line in its own text object.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

/// 4 in × 6 in, the size of a typical exported shipping label.
pub const LABEL_WIDTH: f32 = 288.0;
pub const LABEL_HEIGHT: f32 = 432.0;

const FONT_SIZE: f32 = 12.0;
const LINE_SPACING: f32 = 16.0;

#[derive(Debug, Clone)]
enum PageContent {
    /// One text object per line
    Lines(Vec<String>),
    /// One text object, runs placed with `Td`
    Block(Vec<String>),
    Raw(Vec<Operation>),
}

/// Builder for label PDFs with custom text per page.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let pdf = TestPdfBuilder::new()
///     .with_page(&["SHIP TO", "Jane Doe", "Reference: 12345"])
///     .with_page(&["ORM-4711"])
///     .build(Path::new("/tmp/labels.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    pages: Vec<PageContent>,
    width: f32,
    height: f32,
}

impl TestPdfBuilder {
    /// Creates a builder for 4 in × 6 in pages.
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            width: LABEL_WIDTH,
            height: LABEL_HEIGHT,
        }
    }

    /// Adds a page with one text object per line.
    pub fn with_page(mut self, lines: &[&str]) -> Self {
        self.pages.push(PageContent::Lines(to_strings(lines)));
        self
    }

    /// Adds a page whose runs all sit in a single text object.
    pub fn with_text_block(mut self, runs: &[&str]) -> Self {
        self.pages.push(PageContent::Block(to_strings(runs)));
        self
    }

    /// Adds a page with the given content operations. Font `F1` is available.
    pub fn with_operations(mut self, operations: Vec<Operation>) -> Self {
        self.pages.push(PageContent::Raw(operations));
        self
    }

    /// Adds `count` pages numbered "Label 1", "Label 2", ...
    pub fn with_numbered_pages(mut self, count: usize) -> Self {
        let start = self.pages.len();
        for n in 1..=count {
            self.pages
                .push(PageContent::Lines(vec![format!("Label {}", start + n)]));
        }
        self
    }

    /// Sets the page dimensions in points.
    pub fn with_dimensions(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Builds the document in memory.
    ///
    /// The media box lives on the page tree root, so pages inherit it.
    pub fn build_document(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for page in &self.pages {
            let operations = match page {
                PageContent::Lines(lines) => self.line_operations(lines),
                PageContent::Block(runs) => self.block_operations(runs),
                PageContent::Raw(operations) => operations.clone(),
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), self.width.into(), self.height.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }

    /// Builds the PDF and saves it to `path`.
    pub fn build(&self, path: &Path) -> Result<PathBuf> {
        let mut doc = self.build_document()?;
        doc.save(path)?;
        Ok(path.to_path_buf())
    }
}

impl TestPdfBuilder {
    fn line_operations(&self, lines: &[String]) -> Vec<Operation> {
        let mut operations = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let y = self.height - 40.0 - LINE_SPACING * index as f32;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
            operations.push(Operation::new("Td", vec![20.0f32.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            operations.push(Operation::new("ET", vec![]));
        }
        operations
    }

    fn block_operations(&self, runs: &[String]) -> Vec<Operation> {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("Td", vec![20.0f32.into(), (self.height - 40.0).into()]),
        ];
        for (index, run) in runs.iter().enumerate() {
            if index > 0 {
                operations.push(Operation::new("Td", vec![0.0f32.into(), (-LINE_SPACING).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(run.as_str())]));
        }
        operations.push(Operation::new("ET", vec![]));
        operations
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
