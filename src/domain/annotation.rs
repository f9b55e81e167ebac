//! Text printed next to a label listing what goes in the parcel.

use super::order::OrderLineItem;
use crate::config::DEFAULT_STRIP;

/// Number of order lines printed side by side on one row.
pub const LINES_PER_ROW: usize = 3;

/// Separator between order lines on the same row.
pub const COLUMN_SEPARATOR: &str = "\t\t";

/// Splits items into consecutive chunks of `size`; every `size`-th item
/// starts a new chunk.
pub fn in_chunks<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(|chunk| chunk.to_vec()).collect()
}

/// Formats order line items for printing.
#[derive(Debug, Clone)]
pub struct OrderLineFormatter {
    strip: String,
}

impl OrderLineFormatter {
    /// Creates a formatter removing the default item name suffix.
    pub fn new() -> Self {
        Self::with_strip(DEFAULT_STRIP)
    }

    /// Creates a formatter removing `strip` from item names.
    pub fn with_strip(strip: impl Into<String>) -> Self {
        Self {
            strip: strip.into(),
        }
    }

    /// Formats one item as `[<qty> × ]<name>[ (<option>)]`.
    pub fn format_line(&self, item: &OrderLineItem) -> String {
        let mut line = String::new();
        if item.quantity > 1 {
            line.push_str(&format!("{} × ", item.quantity));
        }
        if self.strip.is_empty() {
            line.push_str(&item.item_name);
        } else {
            line.push_str(&item.item_name.replacen(&self.strip, "", 1));
        }
        if let Some(option) = item.option.as_deref().filter(|o| !o.is_empty()) {
            line.push_str(&format!(" ({})", option));
        }
        line
    }

    /// Formats all items of an order as rows of [`LINES_PER_ROW`] lines.
    pub fn annotation_text(&self, items: &[OrderLineItem]) -> String {
        let lines: Vec<String> = items.iter().map(|item| self.format_line(item)).collect();
        in_chunks(&lines, LINES_PER_ROW)
            .iter()
            .map(|row| row.join(COLUMN_SEPARATOR))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for OrderLineFormatter {
    fn default() -> Self {
        Self::new()
    }
}
