use crate::core::{Environment, Uf};
use crate::xml::{NFE_NS, NFE_VERSION};

use super::routing::Service;

const SOAP_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Wrap a service payload in the SOAP 1.2 envelope the authority expects.
fn envelope(service: Service, payload: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>",
            "<soap12:Envelope xmlns:soap12=\"{soap}\">",
            "<soap12:Body>",
            "<nfeDadosMsg xmlns=\"{wsdl}\">{payload}</nfeDadosMsg>",
            "</soap12:Body>",
            "</soap12:Envelope>",
        ),
        soap = SOAP_NS,
        wsdl = service.namespace(),
        payload = payload,
    )
}

/// Authorization batch: one signed document, synchronous processing
/// requested (`indSinc` 1).
pub fn authorization_envelope(batch_id: u64, signed_document: &str) -> String {
    let payload = format!(
        "<enviNFe xmlns=\"{NFE_NS}\" versao=\"{NFE_VERSION}\">\
         <idLote>{batch_id}</idLote><indSinc>1</indSinc>{signed_document}</enviNFe>"
    );
    envelope(Service::Authorization, &payload)
}

/// Event batch: one signed event per lot.
pub fn event_envelope(lot_id: u64, signed_event: &str) -> String {
    let payload = format!(
        "<envEvento xmlns=\"{NFE_NS}\" versao=\"1.00\">\
         <idLote>{lot_id}</idLote>{signed_event}</envEvento>"
    );
    envelope(Service::EventReception, &payload)
}

/// Number-range invalidation: the signed `inutNFe` document as-is.
pub fn invalidation_envelope(signed_invalidation: &str) -> String {
    envelope(Service::Invalidation, signed_invalidation)
}

/// Service status query. Mandatory before treating any authorization
/// response as final.
pub fn status_envelope(uf: Uf, environment: Environment) -> String {
    let payload = format!(
        "<consStatServ xmlns=\"{NFE_NS}\" versao=\"{NFE_VERSION}\">\
         <tpAmb>{}</tpAmb><cUF>{}</cUF><xServ>STATUS</xServ></consStatServ>",
        environment.code(),
        uf.code(),
    );
    envelope(Service::StatusService, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_envelope_shape() {
        let env = authorization_envelope(42, "<NFe>doc</NFe>");
        assert!(env.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(env.contains("<idLote>42</idLote><indSinc>1</indSinc><NFe>doc</NFe>"));
        assert!(env.contains("wsdl/NFeAutorizacao4"));
        assert!(env.ends_with("</soap12:Envelope>"));
    }

    #[test]
    fn event_envelope_shape() {
        let env = event_envelope(7, "<evento>e</evento>");
        assert!(env.contains("<envEvento"));
        assert!(env.contains("<idLote>7</idLote><evento>e</evento>"));
        assert!(env.contains("wsdl/NFeRecepcaoEvento4"));
    }

    #[test]
    fn status_envelope_shape() {
        let env = status_envelope(crate::core::Uf::Sp, crate::core::Environment::Staging);
        assert!(env.contains("<tpAmb>2</tpAmb><cUF>35</cUF><xServ>STATUS</xServ>"));
        assert!(env.contains("wsdl/NFeStatusServico4"));
    }
}
