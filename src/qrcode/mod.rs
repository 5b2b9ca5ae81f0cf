//! NFC-e QR verification URL and keyed hash.
//!
//! Only the online layout is generated: synchronous online emission is the
//! single mode this pipeline supports. The richer offline-contingency
//! layout (which embeds totals and a digest of the signature) is not
//! implemented.
//!
//! Two hash generations exist in the wild; see [`qr_code_hash`] (current,
//! version 2) and [`qr_code_hash_v1`] (historical). They are deliberately
//! separate functions with no shared construction so the two field orders
//! cannot be mixed silently. Confirm against the currently published
//! authority manual before switching generations.

use sha1::{Digest, Sha1};

use crate::core::{AccessKey, Environment, FiscalError, Uf};

/// QR-code protocol version emitted in the URL and mixed into the hash.
pub const QR_VERSION: &str = "2";

/// A receipt's verification payload: the URL printed as a QR code and the
/// keyed hash embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    pub url: String,
    pub hash: String,
}

/// Left-pad the security-code identifier to 6 digits.
pub fn pad_csc_id(csc_id: &str) -> Result<String, FiscalError> {
    if csc_id.is_empty() || csc_id.len() > 6 || !csc_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FiscalError::Validation(format!(
            "security-code identifier must be 1..=6 digits, got {csc_id:?}"
        )));
    }
    Ok(format!("{csc_id:0>6}"))
}

/// Version-2 keyed hash: SHA-1 over `key|2|tpAmb|idCSC` with the secret
/// appended directly (no separator), hex-encoded upper-case.
pub fn qr_code_hash(
    key: &AccessKey,
    environment: Environment,
    csc_id_padded: &str,
    csc: &str,
) -> String {
    let params = format!(
        "{}|{}|{}|{}",
        key.as_str(),
        QR_VERSION,
        environment.code(),
        csc_id_padded
    );
    let digest = Sha1::digest(format!("{params}{csc}").as_bytes());
    hex::encode_upper(digest)
}

/// Historical version-1 hash: SHA-1 over the query-string form with the
/// secret appended. Kept only so implementers migrating old emitters can
/// recognize it; nothing in this crate generates it.
pub fn qr_code_hash_v1(
    key: &AccessKey,
    environment: Environment,
    csc_id_padded: &str,
    csc: &str,
) -> String {
    let params = format!(
        "chNFe={}&nVersao=100&tpAmb={}&cIdToken={}",
        key.as_str(),
        environment.code(),
        csc_id_padded
    );
    let digest = Sha1::digest(format!("{params}{csc}").as_bytes());
    hex::encode_upper(digest)
}

/// Build the online-emission verification URL for a receipt.
pub fn qr_code_url(
    key: &AccessKey,
    environment: Environment,
    csc_id: &str,
    csc: &str,
    uf: Uf,
) -> Result<QrCode, FiscalError> {
    if csc.is_empty() {
        return Err(FiscalError::Validation(
            "security-code secret is required".into(),
        ));
    }
    let padded = pad_csc_id(csc_id)?;
    let hash = qr_code_hash(key, environment, &padded, csc);
    let url = format!(
        "{}?p={}|{}|{}|{}|{}",
        qr_base_url(uf, environment),
        key.as_str(),
        QR_VERSION,
        environment.code(),
        padded,
        hash
    );
    Ok(QrCode { url, hash })
}

/// Per-state QR presentation endpoint.
pub fn qr_base_url(uf: Uf, environment: Environment) -> &'static str {
    use Environment::*;
    use Uf::*;
    match (uf, environment) {
        (Sp, Production) => "https://www.nfce.fazenda.sp.gov.br/qrcode",
        (Sp, Staging) => "https://www.homologacao.nfce.fazenda.sp.gov.br/qrcode",
        (Mg, Production) => "https://portalsped.fazenda.mg.gov.br/portalnfce/sistema/qrcode.xhtml",
        (Mg, Staging) => "https://hportalsped.fazenda.mg.gov.br/portalnfce/sistema/qrcode.xhtml",
        (Rs, Production) => "https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx",
        (Rs, Staging) => "https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx",
        (Pr, Production) => "http://www.fazenda.pr.gov.br/nfce/qrcode",
        (Pr, Staging) => "http://www.fazenda.pr.gov.br/nfce/qrcode",
        (Ba, Production) => "http://nfe.sefaz.ba.gov.br/servicos/nfce/qrcode.aspx",
        (Ba, Staging) => "http://hnfe.sefaz.ba.gov.br/servicos/nfce/qrcode.aspx",
        (Go, Production) => "http://nfe.sefaz.go.gov.br/nfeweb/sites/nfce/danfeNFCe",
        (Go, Staging) => "http://homolog.sefaz.go.gov.br/nfeweb/sites/nfce/danfeNFCe",
        (Mt, Production) => "http://www.sefaz.mt.gov.br/nfce/consultanfce",
        (Mt, Staging) => "http://homologacao.sefaz.mt.gov.br/nfce/consultanfce",
        (Ms, Production) => "http://www.dfe.ms.gov.br/nfce/qrcode",
        (Ms, Staging) => "http://www.dfe.ms.gov.br/nfce/qrcode",
        (Pe, Production) => "http://nfce.sefaz.pe.gov.br/nfce/consulta",
        (Pe, Staging) => "http://nfcehomolog.sefaz.pe.gov.br/nfce/consulta",
        (Am, Production) => "http://sistemas.sefaz.am.gov.br/nfceweb/consultarNFCe.jsp",
        (Am, Staging) => "http://homnfce.sefaz.am.gov.br/nfceweb/consultarNFCe.jsp",
        // Every remaining state is served by the shared SVRS portal.
        (_, Production) => "https://dfe-portal.svrs.rs.gov.br/NFCe/QRCode",
        (_, Staging) => "https://dfe-portal.svrs.rs.gov.br/NFCe/QRCode",
    }
}

/// Per-state consultation page (`urlChave`).
pub fn consultation_url(uf: Uf, environment: Environment) -> &'static str {
    use Environment::*;
    use Uf::*;
    match (uf, environment) {
        (Sp, Production) => "https://www.nfce.fazenda.sp.gov.br/consulta",
        (Sp, Staging) => "https://www.homologacao.nfce.fazenda.sp.gov.br/consulta",
        (Mg, _) => "https://portalsped.fazenda.mg.gov.br/portalnfce",
        (Rs, _) => "https://www.sefaz.rs.gov.br/nfce/consulta",
        (Pr, _) => "http://www.fazenda.pr.gov.br/nfce/consulta",
        (Ba, Production) => "http://nfe.sefaz.ba.gov.br/servicos/nfce/consulta.aspx",
        (Ba, Staging) => "http://hnfe.sefaz.ba.gov.br/servicos/nfce/consulta.aspx",
        (Go, _) => "http://www.nfce.go.gov.br/nfeweb/sites/nfce/consulta",
        (Mt, _) => "http://www.sefaz.mt.gov.br/nfce/consultanfce",
        (Ms, _) => "http://www.dfe.ms.gov.br/nfce/consulta",
        (Pe, _) => "http://nfce.sefaz.pe.gov.br/nfce/consulta",
        (Am, _) => "http://sistemas.sefaz.am.gov.br/nfceweb/formConsulta.do",
        (_, _) => "https://dfe-portal.svrs.rs.gov.br/NFCe/Consulta",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::core::{EmissionType, Model};

    fn key() -> AccessKey {
        let issued = Uf::Sp
            .utc_offset()
            .with_ymd_and_hms(2024, 6, 15, 10, 0, 0)
            .unwrap();
        AccessKey::generate(
            Uf::Sp,
            &issued,
            "11222333000181",
            Model::Receipt,
            1,
            1,
            EmissionType::Normal,
            12345678,
        )
        .unwrap()
    }

    #[test]
    fn csc_id_padding() {
        assert_eq!(pad_csc_id("1").unwrap(), "000001");
        assert_eq!(pad_csc_id("000001").unwrap(), "000001");
        assert!(pad_csc_id("").is_err());
        assert!(pad_csc_id("1234567").is_err());
        assert!(pad_csc_id("12a").is_err());
    }

    #[test]
    fn hash_shape_and_determinism() {
        let k = key();
        let h1 = qr_code_hash(&k, Environment::Staging, "000001", "SECRET");
        let h2 = qr_code_hash(&k, Environment::Staging, "000001", "SECRET");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 40);
        assert!(h1.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(h1, h1.to_uppercase());
    }

    #[test]
    fn hash_depends_on_secret_and_environment() {
        let k = key();
        let base = qr_code_hash(&k, Environment::Staging, "000001", "SECRET");
        assert_ne!(
            base,
            qr_code_hash(&k, Environment::Staging, "000001", "OTHER")
        );
        assert_ne!(
            base,
            qr_code_hash(&k, Environment::Production, "000001", "SECRET")
        );
    }

    #[test]
    fn v1_and_v2_differ() {
        let k = key();
        assert_ne!(
            qr_code_hash(&k, Environment::Staging, "000001", "SECRET"),
            qr_code_hash_v1(&k, Environment::Staging, "000001", "SECRET")
        );
    }

    #[test]
    fn url_layout() {
        let k = key();
        let qr = qr_code_url(&k, Environment::Staging, "1", "SECRET", Uf::Sp).unwrap();
        let expected_prefix = format!(
            "https://www.homologacao.nfce.fazenda.sp.gov.br/qrcode?p={}|2|2|000001|",
            k.as_str()
        );
        assert!(qr.url.starts_with(&expected_prefix));
        assert!(qr.url.ends_with(&qr.hash));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let k = key();
        assert!(qr_code_url(&k, Environment::Staging, "1", "", Uf::Sp).is_err());
    }

    #[test]
    fn svrs_fallback_states() {
        assert!(qr_base_url(Uf::Sc, Environment::Production).contains("svrs"));
        assert!(consultation_url(Uf::To, Environment::Staging).contains("svrs"));
    }
}
