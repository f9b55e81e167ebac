//! PDF model operations used by the composers.
//!
//! Source pages are turned into Form XObjects so they can be drawn onto new
//! pages at any position, scale and rotation. Text is drawn with the
//! standard Helvetica font in WinAnsiEncoding.

use crate::error::{LabelError, LabelResult};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Inheritance chains longer than this are treated as broken.
const MAX_PARENT_DEPTH: usize = 32;

/// Horizontal gap drawn for each tab character, in thousandths of an em.
const TAB_ADVANCE: f32 = 2000.0;

const FONT_NAME: &str = "F1";

/// Size of an output page in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// 4.094 in × 6.457 in label stock (102×162 mm).
    pub const LABEL_102X162: PageSize = PageSize {
        width: 4.094 * 72.0,
        height: 6.457 * 72.0,
    };

    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Visible area of a source page in its own coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageBox {
    fn from_media_box(values: &[f32]) -> Option<Self> {
        match values {
            [x0, y0, x1, y1] => Some(Self {
                x: x0.min(*x1),
                y: y0.min(*y1),
                width: (x1 - x0).abs(),
                height: (y1 - y0).abs(),
            }),
            _ => None,
        }
    }

    fn default_letter() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: DEFAULT_PAGE_SIZE.0,
            height: DEFAULT_PAGE_SIZE.1,
        }
    }
}

// =============================================================================
// Source documents
// =============================================================================

/// A loaded input PDF with 1-based page access.
pub struct SourceDocument {
    path: PathBuf,
    doc: Document,
    pages: Vec<ObjectId>,
}

impl SourceDocument {
    /// Loads a PDF from disk.
    pub fn load(path: &Path) -> LabelResult<Self> {
        let doc = Document::load(path)
            .map_err(|e| LabelError::pdf(format!("loading {}", path.display()), e))?;
        Ok(Self::from_document(path, doc))
    }

    /// Wraps an already parsed document.
    pub fn from_document(path: &Path, doc: Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            path: path.to_path_buf(),
            doc,
            pages,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Object id of a page, 1-based.
    pub fn page_id(&self, page_number: usize) -> LabelResult<ObjectId> {
        page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .copied()
            .ok_or_else(|| LabelError::InvalidInput {
                parameter: "page".to_string(),
                reason: format!(
                    "page {} out of range (document has {} pages)",
                    page_number,
                    self.pages.len()
                ),
            })
    }

    /// Media box of a page, following inheritance from the page tree.
    pub fn page_box(&self, page_number: usize) -> LabelResult<PageBox> {
        let page_id = self.page_id(page_number)?;
        let page_box = inherited(&self.doc, page_id, b"MediaBox")
            .and_then(|obj| resolve(&self.doc, obj).as_array().ok())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| number(resolve(&self.doc, v)))
                    .collect::<Vec<_>>()
            })
            .and_then(|values| PageBox::from_media_box(&values))
            .unwrap_or_else(PageBox::default_letter);
        Ok(page_box)
    }

    /// Text fragments of a page, one per text-showing operation, in content
    /// order.
    ///
    /// `Tj`, `'` and `"` yield their string; `TJ` yields its strings joined.
    /// Runs inside the same text object stay separate fragments. Whitespace
    /// only runs are dropped.
    pub fn page_fragments(&self, page_number: usize) -> LabelResult<Vec<String>> {
        let page_id = self.page_id(page_number)?;
        let extraction_error = |e: lopdf::Error| LabelError::TextExtraction {
            path: self.path.clone(),
            reason: format!("page {}: {}", page_number, e),
        };

        let encodings: BTreeMap<Vec<u8>, &str> = self
            .doc
            .get_page_fonts(page_id)
            .into_iter()
            .map(|(name, font)| (name, font.get_font_encoding()))
            .collect();
        let content = self.doc.get_page_content(page_id).map_err(extraction_error)?;
        let operations = Content::decode(&content)
            .map_err(extraction_error)?
            .operations;

        let mut encoding = None;
        let mut fragments = Vec::new();
        for operation in &operations {
            let shown = match operation.operator.as_str() {
                "Tf" => {
                    encoding = operation
                        .operands
                        .first()
                        .and_then(|name| name.as_name().ok())
                        .and_then(|name| encodings.get(name).copied());
                    continue;
                }
                "Tj" | "'" => operation.operands.first().map(|o| shown_text(encoding, o)),
                "\"" => operation.operands.get(2).map(|o| shown_text(encoding, o)),
                "TJ" => operation.operands.first().map(|o| shown_text(encoding, o)),
                _ => None,
            };
            if let Some(text) = shown.filter(|text| !text.trim().is_empty()) {
                fragments.push(text);
            }
        }
        log::trace!("page {} fragments: {:?}", page_number, fragments);
        Ok(fragments)
    }
}

/// Decodes a show-text operand: a string, or a `TJ` array whose strings are
/// joined and whose spacing numbers are skipped.
fn shown_text(encoding: Option<&str>, operand: &Object) -> String {
    match operand {
        Object::String(bytes, _) => Document::decode_text(encoding, bytes),
        Object::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Object::String(bytes, _) => Some(Document::decode_text(encoding, bytes)),
                _ => None,
            })
            .collect(),
        _ => String::new(),
    }
}

/// Looks up a page attribute, walking up `Parent` links when it is inherited.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_PARENT_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

// =============================================================================
// Output documents
// =============================================================================

/// A source page copied into an output document as a Form XObject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddedPage {
    pub id: ObjectId,
    pub bbox: PageBox,
}

/// Where and how an embedded page is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// Counter-clockwise rotation in degrees
    pub rotation: f32,
}

/// Appearance of a text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub line_height: f32,
    /// Counter-clockwise rotation in degrees
    pub rotation: f32,
}

/// Drawing operations for one output page.
#[derive(Debug, Default)]
pub struct PageCanvas {
    operations: Vec<Operation>,
    xobjects: Dictionary,
    uses_font: bool,
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Draws an embedded page.
    pub fn draw_page(&mut self, page: &EmbeddedPage, placement: Placement) {
        let name = format!("P{}", self.xobjects.len());
        self.xobjects.set(name.as_bytes(), Object::Reference(page.id));

        let (cos, sin) = rotation(placement.rotation);
        let s = placement.scale;
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            reals(&[s * cos, s * sin, -s * sin, s * cos, placement.x, placement.y]),
        ));
        if page.bbox.x != 0.0 || page.bbox.y != 0.0 {
            self.operations.push(Operation::new(
                "cm",
                reals(&[1.0, 0.0, 0.0, 1.0, -page.bbox.x, -page.bbox.y]),
            ));
        }
        self.operations
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Draws multi-line text. Lines are separated by `\n`; tabs become gaps.
    pub fn draw_text_block(&mut self, text: &str, style: TextStyle) {
        let (cos, sin) = rotation(style.rotation);
        self.uses_font = true;
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(FONT_NAME.as_bytes().to_vec()), style.size.into()],
        ));
        self.operations
            .push(Operation::new("TL", vec![style.line_height.into()]));
        self.operations.push(Operation::new(
            "Tm",
            reals(&[cos, sin, -sin, cos, style.x, style.y]),
        ));
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.operations.push(Operation::new("T*", vec![]));
            }
            self.operations
                .push(Operation::new("TJ", vec![Object::Array(text_array(line))]));
        }
        self.operations.push(Operation::new("ET", vec![]));
    }
}

/// Builds a new PDF out of canvases and embedded source pages.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    font_id: Option<ObjectId>,
    embedded: HashMap<ObjectId, EmbeddedPage>,
    copied: HashMap<ObjectId, ObjectId>,
}

impl OutputDocument {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            font_id: None,
            embedded: HashMap::new(),
            copied: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Makes a source page drawable in this document. Each source page is
    /// copied once, however often it is drawn.
    pub fn embed_page(
        &mut self,
        source: &SourceDocument,
        page_number: usize,
    ) -> LabelResult<EmbeddedPage> {
        let page_id = source.page_id(page_number)?;
        if let Some(page) = self.embedded.get(&page_id) {
            return Ok(*page);
        }

        let bbox = source.page_box(page_number)?;
        let content = page_content(source.document(), page_id).map_err(|e| {
            LabelError::pdf(format!("reading content of page {}", page_number), e)
        })?;

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Form".to_vec()));
        dict.set("FormType", Object::Integer(1));
        dict.set(
            "BBox",
            Object::Array(reals(&[
                bbox.x,
                bbox.y,
                bbox.x + bbox.width,
                bbox.y + bbox.height,
            ])),
        );
        if let Some(resources) = inherited(source.document(), page_id, b"Resources") {
            let resources = resources.clone();
            let copied = self.copy_deep(source.document(), &resources)?;
            dict.set("Resources", copied);
        }

        let id = self.doc.add_object(Stream::new(dict, content));
        let page = EmbeddedPage { id, bbox };
        self.embedded.insert(page_id, page);
        Ok(page)
    }

    /// Appends a page of the given size with the canvas drawn on it.
    pub fn add_page(&mut self, size: PageSize, canvas: PageCanvas) -> LabelResult<ObjectId> {
        let mut resources = Dictionary::new();
        if !canvas.xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(canvas.xobjects));
        }
        if canvas.uses_font {
            let font_id = self.font();
            resources.set(
                "Font",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    FONT_NAME,
                    Object::Reference(font_id),
                )])),
            );
        }

        let content = Content {
            operations: canvas.operations,
        }
        .encode()
        .map_err(|e| LabelError::pdf("encoding page content", e))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(reals(&[0.0, 0.0, size.width, size.height])),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        self.kids.push(Object::Reference(page_id));
        Ok(page_id)
    }

    /// Finalizes the page tree and returns the document.
    pub fn into_document(mut self) -> Document {
        let count = self.kids.len() as i64;
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(self.kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }

    /// Finalizes, compresses and serializes the document.
    pub fn to_bytes(self) -> LabelResult<Vec<u8>> {
        let mut doc = self.into_document();
        doc.compress();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| LabelError::Layout {
            message: format!("failed to serialize output: {}", e),
            page: None,
        })?;
        Ok(bytes)
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        self.font_id = Some(id);
        id
    }

    /// Copies an object graph from `source`, reusing objects copied earlier.
    fn copy_deep(&mut self, source: &Document, obj: &Object) -> LabelResult<Object> {
        match obj {
            Object::Reference(id) => {
                if let Some(&new_id) = self.copied.get(id) {
                    return Ok(Object::Reference(new_id));
                }
                let new_id = self.doc.new_object_id();
                self.copied.insert(*id, new_id);
                let referenced = source
                    .get_object(*id)
                    .map_err(|e| LabelError::pdf(format!("resolving {:?}", id), e))?
                    .clone();
                let copied = self.copy_deep(source, &referenced)?;
                self.doc.objects.insert(new_id, copied);
                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(source, dict)?)),
            Object::Array(items) => items
                .iter()
                .map(|item| self.copy_deep(source, item))
                .collect::<LabelResult<Vec<_>>>()
                .map(Object::Array),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(source, &stream.dict)?;
                Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
            }
            _ => Ok(obj.clone()),
        }
    }

    fn copy_dictionary(&mut self, source: &Document, dict: &Dictionary) -> LabelResult<Dictionary> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_deep(source, value)?);
        }
        Ok(copy)
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompressed, concatenated content streams of a page.
fn page_content(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<u8>> {
    let page = doc.get_dictionary(page_id)?;
    let streams: Vec<ObjectId> = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items
                .iter()
                .filter_map(|o| o.as_reference().ok())
                .collect(),
            _ => vec![*id],
        },
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_reference().ok())
            .collect(),
        _ => Vec::new(),
    };

    let mut content = Vec::new();
    for id in streams {
        if let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            content.extend_from_slice(&data);
            content.push(b'\n');
        }
    }
    Ok(content)
}

// =============================================================================
// Helpers
// =============================================================================

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|&v| v.into()).collect()
}

/// Cosine and sine of a counter-clockwise angle, snapped for right angles.
fn rotation(degrees: f32) -> (f32, f32) {
    let radians = degrees.to_radians();
    let snap = |v: f32| if v.abs() < 1e-6 { 0.0 } else { v };
    (snap(radians.cos()), snap(radians.sin()))
}

/// `TJ` operand for one line: text runs separated by tab gaps.
fn text_array(line: &str) -> Vec<Object> {
    let mut items = Vec::new();
    let mut run = String::new();
    let mut tabs = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            tabs += 1;
            continue;
        }
        if tabs > 0 {
            push_run(&mut items, &mut run);
            items.push((-(tabs as f32) * TAB_ADVANCE).into());
            tabs = 0;
        }
        run.push(ch);
    }
    push_run(&mut items, &mut run);
    if tabs > 0 {
        items.push((-(tabs as f32) * TAB_ADVANCE).into());
    }
    items
}

fn push_run(items: &mut Vec<Object>, run: &mut String) {
    if !run.is_empty() {
        items.push(Object::string_literal(encode_win_ansi(run)));
        run.clear();
    }
}

/// Encodes text in WinAnsiEncoding; unsupported characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(ch: char) -> u8 {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => code as u8,
        _ => match ch {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}
