//! Enveloped XML digital signatures over fiscal documents.
//!
//! The authority mandates SHA-1 digests and RSA-SHA1 signatures — legacy
//! algorithms preserved here as an external compliance constraint, not a
//! design choice. Credentials come from password-protected PKCS#12
//! containers and can be cached process-wide through an explicit
//! [`CredentialCache`].
//!
//! # Example
//!
//! ```no_run
//! use notafiscal::signing::{SigningCredential, sign_document};
//!
//! let der: Vec<u8> = std::fs::read("issuer.pfx").unwrap();
//! let credential = SigningCredential::from_pkcs12(&der, "passphrase").unwrap();
//! let document_xml: String = todo!(); // via notafiscal::xml::to_document_xml
//! let reference_id: String = todo!(); // FiscalDocument::signature_reference()
//! let signed = sign_document(&document_xml, &reference_id, &credential).unwrap();
//! ```

mod credential;
mod xmldsig;

pub use credential::{CredentialCache, SigningCredential};
pub use xmldsig::{
    ALG_C14N, ALG_ENVELOPED, ALG_RSA_SHA1, ALG_SHA1, DSIG_NS, embedded_digest, sign_document,
    verify_signature,
};
