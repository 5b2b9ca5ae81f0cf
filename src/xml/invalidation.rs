use crate::core::{Environment, Model, Uf, ValidationError};

use super::document::{NFE_NS, NFE_VERSION};
use super::writer::{XmlResult, XmlWriter, truncate};

/// Invalidation of an unused document number range.
///
/// Registered when numbers issued by the sequencer will never become
/// documents (emission aborted, gaps after a crash). The signer references
/// the `infInut` element by its `Id`.
#[derive(Debug, Clone)]
pub struct RangeInvalidation {
    pub uf: Uf,
    pub environment: Environment,
    /// Issuer tax id (14 digits).
    pub cnpj: String,
    pub model: Model,
    pub series: u16,
    /// First number of the invalidated range.
    pub number_start: u64,
    /// Last number of the invalidated range (inclusive).
    pub number_end: u64,
    /// `xJust`: 15..=255 characters.
    pub justification: String,
    /// Four-digit year the range belongs to.
    pub year: u16,
}

impl RangeInvalidation {
    /// `Id` attribute of the signed `infInut` element:
    /// `"ID"` + cUF(2) + year(2) + CNPJ(14) + model(2) + series(3) +
    /// start(9) + end(9).
    pub fn signature_reference(&self) -> String {
        format!(
            "ID{:02}{:02}{}{}{:03}{:09}{:09}",
            self.uf.code(),
            self.year % 100,
            self.cnpj,
            self.model.code(),
            self.series,
            self.number_start,
            self.number_end,
        )
    }
}

/// Render the `<inutNFe>` document for a number-range invalidation.
pub fn to_invalidation_xml(inv: &RangeInvalidation) -> XmlResult {
    if inv.cnpj.len() != 14 {
        return Err(ValidationError::new("cnpj", "issuer tax id must be 14 digits").into());
    }
    if inv.number_start == 0 || inv.number_end < inv.number_start {
        return Err(ValidationError::new(
            "number_start",
            format!("invalid range {}..={}", inv.number_start, inv.number_end),
        )
        .into());
    }
    if inv.justification.chars().count() < 15 {
        return Err(
            ValidationError::new("justification", "must have at least 15 characters").into(),
        );
    }

    let mut w = XmlWriter::new();
    w.start_element_with_attrs("inutNFe", &[("xmlns", NFE_NS), ("versao", NFE_VERSION)])?;
    w.start_element_with_attrs("infInut", &[("Id", &inv.signature_reference())])?;
    w.text_element("tpAmb", &inv.environment.code().to_string())?;
    w.text_element("xServ", "INUTILIZAR")?;
    w.text_element("cUF", &inv.uf.code().to_string())?;
    w.text_element("ano", &format!("{:02}", inv.year % 100))?;
    w.text_element("CNPJ", &inv.cnpj)?;
    w.text_element("mod", inv.model.code())?;
    w.text_element("serie", &inv.series.to_string())?;
    w.text_element("nNFIni", &inv.number_start.to_string())?;
    w.text_element("nNFFin", &inv.number_end.to_string())?;
    w.text_element("xJust", &truncate(&inv.justification, 255))?;
    w.end_element("infInut")?;
    w.end_element("inutNFe")?;
    w.into_string()
}
