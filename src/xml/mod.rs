//! Schema-ordered XML assembly for the four document kinds.
//!
//! The authority's schema is position-sensitive: child elements of every
//! block must appear in the exact declared order, and unknown or reordered
//! elements cause rejection. Element order is therefore written out
//! explicitly per document kind, never derived from field iteration.
//!
//! # Document kinds
//!
//! - **NF-e / NFC-e** — [`to_document_xml`]
//! - **Cancellation event** — [`to_event_xml`]
//! - **Number-range invalidation** — [`to_invalidation_xml`]

mod document;
mod event;
mod invalidation;
pub(crate) mod writer;

pub use document::{NFE_NS, NFE_VERSION, STAGING_PLACEHOLDER, to_document_xml};
pub use event::{CancellationEvent, EVENT_VERSION, to_event_xml};
pub use invalidation::{RangeInvalidation, to_invalidation_xml};
pub use writer::{format_amount, format_quantity, truncate};
