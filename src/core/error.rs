use thiserror::Error;

/// Errors that can occur while building, signing, or transmitting a fiscal
/// document.
///
/// The variants follow the pipeline stages: everything up to `Validation`
/// fails before any crypto or network work; `Rejection` is not a software
/// fault but the authority refusing the document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FiscalError {
    /// Caller input missing or malformed (issuer tax id, empty line list, …).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Certificate container could not be opened (wrong passphrase, bad DER).
    #[error("credential error: {0}")]
    Credential(String),

    /// Signature construction failed (missing referenced element or Id).
    #[error("signing error: {0}")]
    Signing(String),

    /// No endpoint configured for the region/service/environment combination.
    #[error("routing error: {0}")]
    Routing(String),

    /// Network-level failure: timeout, TLS handshake, unreachable host.
    /// Surfaced as-is; never retried.
    #[error("transport error: {0}")]
    Transport(String),

    /// The authority returned a non-success status code.
    #[error("rejected by authority: {status} - {reason}")]
    Rejection {
        /// Numeric status code (cStat) from the authority.
        status: u16,
        /// Reason text (xMotivo) surfaced verbatim.
        reason: String,
    },

    /// XML generation or parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Document number sequencing or store error.
    #[error("sequencing error: {0}")]
    Sequencing(String),
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "issuer.cnpj").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for FiscalError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.to_string())
    }
}
