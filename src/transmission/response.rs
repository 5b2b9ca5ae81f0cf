use chrono::{DateTime, FixedOffset};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::core::FiscalError;

/// Status codes with pipeline-level meaning. Everything else is a rejection
/// whose reason text is surfaced verbatim.
pub const STATUS_AUTHORIZED: u16 = 100;
pub const STATUS_BATCH_RECEIVED: u16 = 104;
pub const STATUS_SERVICE_ONLINE: u16 = 107;

/// Parsed authority reply.
#[derive(Debug, Clone)]
pub struct TransmissionResult {
    /// `cStat`: numeric status code.
    pub status: u16,
    /// `xMotivo`: reason text.
    pub reason: String,
    /// `nProt`: authorization protocol number, when granted.
    pub protocol: Option<String>,
    /// `dhRecbto`: authority-side receipt timestamp.
    pub received_at: Option<DateTime<FixedOffset>>,
    /// Full response payload, retained for audit.
    pub raw: String,
}

impl TransmissionResult {
    /// Whether the reply is a success for its operation (authorized
    /// document or online service).
    pub fn accepted(&self) -> bool {
        matches!(self.status, STATUS_AUTHORIZED | STATUS_SERVICE_ONLINE)
    }

    /// Convert a rejection into [`FiscalError::Rejection`], passing
    /// successes through.
    pub fn ensure_accepted(self) -> Result<Self, FiscalError> {
        if self.accepted() {
            Ok(self)
        } else {
            Err(FiscalError::Rejection {
                status: self.status,
                reason: self.reason,
            })
        }
    }
}

#[derive(Default)]
struct Fields {
    status: Option<u16>,
    reason: Option<String>,
    protocol: Option<String>,
    received_at: Option<String>,
}

/// Extract status, reason, protocol, and timestamp from an authority reply.
///
/// For batch-received replies (`cStat` 104) the true per-document status is
/// nested one level deeper inside the `protNFe` protocol block and is
/// re-extracted from there.
pub fn parse(xml: &str) -> Result<TransmissionResult, FiscalError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut outer = Fields::default();
    let mut nested = Fields::default();
    let mut in_protocol = 0usize;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = std::str::from_utf8(e.local_name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "protNFe" || name == "protEvento" || name == "retEvento" {
                    in_protocol += 1;
                }
                current = Some(name);
            }
            Ok(Event::End(ref e)) => {
                let local = e.local_name();
                let name = std::str::from_utf8(local.as_ref()).unwrap_or("");
                if name == "protNFe" || name == "protEvento" || name == "retEvento" {
                    in_protocol = in_protocol.saturating_sub(1);
                }
                current = None;
            }
            Ok(Event::Text(ref t)) => {
                let text = t.unescape().unwrap_or_default().to_string();
                let fields = if in_protocol > 0 {
                    &mut nested
                } else {
                    &mut outer
                };
                match current.as_deref() {
                    Some("cStat") if fields.status.is_none() => {
                        fields.status = text.parse::<u16>().ok();
                    }
                    Some("xMotivo") if fields.reason.is_none() => {
                        fields.reason = Some(text);
                    }
                    Some("nProt") if fields.protocol.is_none() => {
                        fields.protocol = Some(text);
                    }
                    Some("dhRecbto") if fields.received_at.is_none() => {
                        fields.received_at = Some(text);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(FiscalError::Xml(format!("response parse error: {e}"))),
        }
    }

    let outer_status = outer
        .status
        .ok_or_else(|| FiscalError::Xml("response carries no status code".into()))?;

    // Batch received: the document's own verdict lives in the nested block.
    let (status, reason) = if outer_status == STATUS_BATCH_RECEIVED && nested.status.is_some() {
        (
            nested.status.unwrap_or(outer_status),
            nested.reason.clone().or(outer.reason).unwrap_or_default(),
        )
    } else {
        (outer_status, outer.reason.unwrap_or_default())
    };

    let received_at = nested
        .received_at
        .or(outer.received_at)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok());

    Ok(TransmissionResult {
        status,
        reason,
        protocol: nested.protocol.or(outer.protocol),
        received_at,
        raw: xml.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORIZED: &str = r#"<retEnviNFe xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
        <tpAmb>2</tpAmb><verAplic>SP_NFE_PL009</verAplic>
        <cStat>104</cStat><xMotivo>Lote processado</xMotivo><cUF>35</cUF>
        <protNFe versao="4.00"><infProt>
            <tpAmb>2</tpAmb><verAplic>SP_NFE_PL009</verAplic>
            <chNFe>35240611222333000181550010000000011123456789</chNFe>
            <dhRecbto>2024-06-15T10:00:05-03:00</dhRecbto>
            <nProt>135240000000123</nProt>
            <digVal>abc=</digVal>
            <cStat>100</cStat><xMotivo>Autorizado o uso da NF-e</xMotivo>
        </infProt></protNFe>
    </retEnviNFe>"#;

    #[test]
    fn batch_received_reports_nested_status() {
        let result = parse(AUTHORIZED).unwrap();
        assert_eq!(result.status, 100);
        assert_eq!(result.reason, "Autorizado o uso da NF-e");
        assert_eq!(result.protocol.as_deref(), Some("135240000000123"));
        assert!(result.received_at.is_some());
        assert!(result.accepted());
    }

    #[test]
    fn plain_authorized() {
        let xml = "<retEnviNFe><cStat>100</cStat><xMotivo>Autorizado</xMotivo>\
                   <nProt>123</nProt></retEnviNFe>";
        let result = parse(xml).unwrap();
        assert_eq!(result.status, 100);
        assert_eq!(result.protocol.as_deref(), Some("123"));
    }

    #[test]
    fn rejection_surfaces_reason_verbatim() {
        let xml = "<retEnviNFe><cStat>539</cStat>\
                   <xMotivo>Rejeicao: Duplicidade de NF-e</xMotivo></retEnviNFe>";
        let result = parse(xml).unwrap();
        assert_eq!(result.status, 539);
        assert!(!result.accepted());
        let err = result.ensure_accepted().unwrap_err();
        match err {
            FiscalError::Rejection { status, reason } => {
                assert_eq!(status, 539);
                assert_eq!(reason, "Rejeicao: Duplicidade de NF-e");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn batch_received_without_protocol_stays_104() {
        let xml = "<retEnviNFe><cStat>104</cStat><xMotivo>Lote processado</xMotivo></retEnviNFe>";
        let result = parse(xml).unwrap();
        assert_eq!(result.status, 104);
        assert!(!result.accepted());
    }

    #[test]
    fn service_online() {
        let xml = "<retConsStatServ><cStat>107</cStat>\
                   <xMotivo>Servico em Operacao</xMotivo></retConsStatServ>";
        let result = parse(xml).unwrap();
        assert_eq!(result.status, 107);
        assert!(result.accepted());
    }

    #[test]
    fn missing_status_is_an_error() {
        assert!(parse("<retEnviNFe><xMotivo>?</xMotivo></retEnviNFe>").is_err());
    }
}
