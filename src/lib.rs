//! # notafiscal
//!
//! Brazilian electronic fiscal document emission: NF-e (model 55) and NFC-e
//! (model 65) — access-key generation, schema-ordered XML assembly, enveloped
//! XML digital signatures, and SOAP transmission to the SEFAZ web services.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! Element order follows the NF-e 4.00 schema exactly; the authority's
//! validator rejects reordered or unknown elements.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::TimeZone;
//! use notafiscal::core::*;
//! use rust_decimal::Decimal;
//!
//! let issued_at = Uf::Sp.utc_offset().with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
//!
//! let issuer = IssuerBuilder::new(
//!     "11222333000181",
//!     "ACME Comercio LTDA",
//!     AddressBuilder::new("Sao Paulo", "3550308", Uf::Sp)
//!         .street("Rua Augusta", "100")
//!         .district("Consolacao")
//!         .postal_code("01310000")
//!         .build(),
//! )
//! .state_registration("123456789012")
//! .tax_regime(TaxRegime::Simplified)
//! .build();
//!
//! let invoice = InvoiceBuilder::new(issuer, Environment::Staging)
//!     .series(1)
//!     .number(1)
//!     .issued_at(issued_at)
//!     .nonce(12345678)
//!     .recipient(RecipientBuilder::new("99888777000166", "Cliente SA")
//!         .address(AddressBuilder::new("Sao Paulo", "3550308", Uf::Sp)
//!             .street("Av Paulista", "1000")
//!             .district("Bela Vista")
//!             .postal_code("01311000")
//!             .build())
//!         .build())
//!     .tech_responsible(TechResponsible {
//!         cnpj: "11222333000181".into(),
//!         contact: "Suporte".into(),
//!         email: "suporte@acme.com.br".into(),
//!         phone: "1133334444".into(),
//!     })
//!     .add_line(DocumentLineBuilder::new("P001", "Produto Teste", Decimal::ONE, Decimal::new(1000, 2))
//!         .ncm("61091000")
//!         .cfop("5102")
//!         .build())
//!     .add_payment(Payment::new(PaymentMethod::Cash, Decimal::new(1000, 2)))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(invoice.info().access_key.as_str().len(), 44);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Domain types, builders, access keys, number sequencing |
//! | `xml` | NF-e/NFC-e, cancellation event, and invalidation XML assembly |
//! | `qrcode` | NFC-e QR verification URL and keyed SHA-1 hash |
//! | `signing` | PKCS#12 credentials, enveloped XMLDSig (SHA-1/RSA-SHA1) |
//! | `transmission` | SEFAZ routing, SOAP envelopes, mutual-TLS client |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "qrcode")]
pub mod qrcode;

#[cfg(feature = "signing")]
pub mod signing;

#[cfg(feature = "transmission")]
pub mod transmission;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
