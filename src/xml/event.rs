use chrono::{DateTime, FixedOffset};

use crate::core::{AccessKey, Environment, Uf, ValidationError};

use super::document::NFE_NS;
use super::writer::{XmlResult, XmlWriter, truncate};

/// Cancellation event code (`tpEvento`).
const EVENT_CANCEL: &str = "110111";

/// Event layout version.
pub const EVENT_VERSION: &str = "1.00";

/// Cancellation of an already-authorized document.
///
/// Requires the authorization protocol number returned when the document
/// was accepted, plus a justification of at least 15 characters.
#[derive(Debug, Clone)]
pub struct CancellationEvent {
    pub uf: Uf,
    pub environment: Environment,
    /// Issuer tax id (14 digits).
    pub cnpj: String,
    /// Key of the document being cancelled.
    pub access_key: AccessKey,
    /// `nProt`: authorization protocol of the cancelled document.
    pub protocol: String,
    /// `xJust`: 15..=255 characters.
    pub justification: String,
    pub event_time: DateTime<FixedOffset>,
    /// `nSeqEvento`: 1 unless the same event is re-registered.
    pub sequence: u8,
}

impl CancellationEvent {
    /// `Id` attribute of the signed `infEvento` element.
    pub fn signature_reference(&self) -> String {
        format!(
            "ID{}{}{:02}",
            EVENT_CANCEL,
            self.access_key.as_str(),
            self.sequence
        )
    }
}

/// Render the `<evento>` document for a cancellation. The signer references
/// the `infEvento` element by its `Id`.
pub fn to_event_xml(event: &CancellationEvent) -> XmlResult {
    if event.cnpj.len() != 14 {
        return Err(ValidationError::new("cnpj", "issuer tax id must be 14 digits").into());
    }
    if event.justification.chars().count() < 15 {
        return Err(
            ValidationError::new("justification", "must have at least 15 characters").into(),
        );
    }
    if event.protocol.is_empty() {
        return Err(ValidationError::new(
            "protocol",
            "cancellation requires the authorization protocol number",
        )
        .into());
    }

    let mut w = XmlWriter::new();
    w.start_element_with_attrs("evento", &[("xmlns", NFE_NS), ("versao", EVENT_VERSION)])?;
    w.start_element_with_attrs("infEvento", &[("Id", &event.signature_reference())])?;
    w.text_element("cOrgao", &event.uf.code().to_string())?;
    w.text_element("tpAmb", &event.environment.code().to_string())?;
    w.text_element("CNPJ", &event.cnpj)?;
    w.text_element("chNFe", event.access_key.as_str())?;
    w.text_element(
        "dhEvento",
        &event.event_time.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
    )?;
    w.text_element("tpEvento", EVENT_CANCEL)?;
    w.text_element("nSeqEvento", &event.sequence.to_string())?;
    w.text_element("verEvento", EVENT_VERSION)?;
    w.start_element_with_attrs("detEvento", &[("versao", EVENT_VERSION)])?;
    w.text_element("descEvento", "Cancelamento")?;
    w.text_element("nProt", &event.protocol)?;
    w.text_element("xJust", &truncate(&event.justification, 255))?;
    w.end_element("detEvento")?;
    w.end_element("infEvento")?;
    w.end_element("evento")?;
    w.into_string()
}
