//! Print-ready shipping labels from Bandcamp label exports.
//!
//! This library takes the multi-page label PDF exported from the Bandcamp
//! merch backend and lays it out for printing, either one label per
//! 102×162 mm label page annotated with what goes into the parcel, or two
//! labels per A4 sheet.
//!
//! # Features
//!
//! - **Label layout**: Scales each label onto 4.094 in × 6.457 in stock
//! - **Order annotation**: Prints quantity, item and option of every line item
//! - **Reference matching**: Finds `ORM-…` codes, `Reference:` fields and bare numbers
//! - **Sheet layout**: Tiles two labels per A4 sheet, optionally skipping the first slot
//! - **OAuth client**: Refreshes expired tokens and retries once
//!
//! # Architecture
//!
//! - [`api`]: Authenticated client for the merch API and token cache
//! - [`domain`]: Orders, grouping, reference matching and order line text
//! - [`compose`]: Label and sheet layouts on top of the PDF model
//! - [`config`]: Defaults and the credentials file
//! - [`error`]: Error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use bandlabels::{ComposeService, SheetComposer};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ComposeService::new(Box::new(SheetComposer::new().with_skip_first(true)));
//!
//! service.compose(Path::new("labels.pdf"), Path::new("result.pdf"))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Examples
//!
//! ## Annotate labels with known orders
//!
//! ```no_run
//! use bandlabels::domain::{group_by_payment_id, OrderLineItem};
//! use bandlabels::{ComposeService, LabelComposer};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let orders = group_by_payment_id(vec![
//!     OrderLineItem::new(12345, "Totebag by ORM", 2).with_option("Black"),
//! ]);
//! let service = ComposeService::new(Box::new(LabelComposer::new(orders)));
//!
//! let result = service.compose(Path::new("labels.pdf"), Path::new("result.pdf"))?;
//! println!("{} page(s) without orders", result.unmatched_pages.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Reference matching
//!
//! ```
//! use bandlabels::domain::{group_by_payment_id, OrderLineItem, ReferenceMatcher};
//!
//! let orders = group_by_payment_id(vec![OrderLineItem::new(12345, "LP", 1)]);
//! let found = ReferenceMatcher::new().resolve(&["Reference: 12345"], &orders);
//! assert_eq!(found.payment_id(), Some(12345));
//! ```

// Public API
pub mod api;
pub mod compose;
pub mod config;
pub mod domain;
pub mod error;

// Re-exports for convenient access
pub use api::{BandcampApi, OrderQuery};
pub use compose::{
    ComposeResult, ComposeService, LabelComposer, PageComposer, PageSize, SheetComposer,
};
pub use domain::{OrderLineFormatter, OrdersByPayment, ReferenceMatcher};
pub use error::{LabelError, LabelResult};
