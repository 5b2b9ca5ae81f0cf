//! Core fiscal-document types, access keys, and number sequencing.
//!
//! This module provides the foundational types for NF-e/NFC-e emission:
//! the document variants, their builders, the 44-digit access key with its
//! mod-11 check digit, and the durable per-(issuer, series) counter.

mod access_key;
mod builder;
mod error;
mod sequencing;
mod types;
mod uf;

pub use access_key::*;
pub use builder::*;
pub use error::*;
pub use sequencing::*;
pub use types::*;
pub use uf::*;
