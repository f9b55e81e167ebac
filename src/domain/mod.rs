//! Domain models and business logic.
//!
//! Order data from the merch API, the typed grouping helper used to index
//! it by payment id, detection of order references in label text and the
//! formatting of order lines printed on labels.

pub mod annotation;
pub mod grouping;
pub mod order;
pub mod reference;

pub use annotation::{in_chunks, OrderLineFormatter};
pub use grouping::{group_by, group_by_or};
pub use order::{group_by_payment_id, Band, OrderLineItem, OrdersByPayment};
pub use reference::{
    BareNumberPattern, Candidate, OrmCodePattern, ReferenceFieldPattern, ReferenceMatch,
    ReferenceMatcher, ReferencePattern,
};
