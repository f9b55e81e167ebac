//! Inspection helpers for laid out PDFs.

use anyhow::{anyhow, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};
use std::path::Path;

/// Loads a PDF written by the layout service.
pub fn load_output(path: &Path) -> Result<Document> {
    Ok(Document::load(path)?)
}

/// Decoded content stream operations of a page (1-based).
pub fn page_operations(doc: &Document, page_number: u32) -> Result<Vec<Operation>> {
    let page_id = *doc
        .get_pages()
        .get(&page_number)
        .ok_or_else(|| anyhow!("page {} not found", page_number))?;
    let content = doc.get_page_content(page_id)?;
    Ok(Content::decode(&content)?.operations)
}

/// Number of operations with the given operator.
pub fn count_operator(operations: &[Operation], operator: &str) -> usize {
    operations
        .iter()
        .filter(|op| op.operator == operator)
        .count()
}

/// Bytes shown by every `TJ` operation, one entry per operation.
pub fn shown_text(operations: &[Operation]) -> Vec<Vec<u8>> {
    operations
        .iter()
        .filter(|op| op.operator == "TJ")
        .map(|op| {
            let mut bytes = Vec::new();
            if let Some(Object::Array(items)) = op.operands.first() {
                for item in items {
                    if let Object::String(run, _) = item {
                        bytes.extend_from_slice(run);
                    }
                }
            }
            bytes
        })
        .collect()
}

/// Operands of the first operation with the given operator, as numbers.
pub fn first_operands(operations: &[Operation], operator: &str) -> Option<Vec<f32>> {
    operations
        .iter()
        .find(|op| op.operator == operator)
        .map(|op| op.operands.iter().filter_map(as_number).collect())
}

/// Media box of a page (1-based).
pub fn media_box(doc: &Document, page_number: u32) -> Result<Vec<f32>> {
    let page_id = *doc
        .get_pages()
        .get(&page_number)
        .ok_or_else(|| anyhow!("page {} not found", page_number))?;
    let page = doc.get_dictionary(page_id)?;
    let values = page.get(b"MediaBox")?.as_array()?;
    Ok(values.iter().filter_map(as_number).collect())
}

/// Asserts two lists of numbers agree to within 0.01.
pub fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "expected {:?}, got {:?}",
        expected,
        actual
    );
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 0.01, "expected {:?}, got {:?}", expected, actual);
    }
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Text shown inside each Form XObject a page draws, in `Do` order.
///
/// Each entry joins the `Tj` strings of one drawn source page.
pub fn drawn_page_text(doc: &Document, page_number: u32) -> Result<Vec<String>> {
    let page_id = *doc
        .get_pages()
        .get(&page_number)
        .ok_or_else(|| anyhow!("page {} not found", page_number))?;
    let xobjects = doc
        .get_dictionary(page_id)?
        .get(b"Resources")?
        .as_dict()?
        .get(b"XObject")?
        .as_dict()?;

    let mut drawn = Vec::new();
    for op in page_operations(doc, page_number)? {
        if op.operator != "Do" {
            continue;
        }
        let name = op
            .operands
            .first()
            .ok_or_else(|| anyhow!("Do without operand"))?
            .as_name()?;
        let stream = doc
            .get_object(xobjects.get(name)?.as_reference()?)?
            .as_stream()?;
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let text: String = Content::decode(&content)?
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect();
        drawn.push(text);
    }
    Ok(drawn)
}
