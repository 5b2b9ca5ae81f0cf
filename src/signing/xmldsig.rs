use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use openssl::hash::{MessageDigest, hash};
use openssl::sign::Verifier;
use openssl::x509::X509;

use crate::core::FiscalError;
use crate::xml::NFE_NS;

use super::credential::SigningCredential;

/// XMLDSig namespace.
pub const DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
/// Exclusive canonicalization.
pub const ALG_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
/// Enveloped-signature transform.
pub const ALG_ENVELOPED: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
/// SHA-1 digest — mandated by the authority, weak by modern standards.
pub const ALG_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
/// RSA-SHA1 signature — same compliance constraint.
pub const ALG_RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";

/// Locate the element carrying `Id="{id}"` and return its byte range.
///
/// The assembler never nests an element inside another of the same name, so
/// the first matching close tag ends the element.
fn referenced_element(xml: &str, id: &str) -> Result<std::ops::Range<usize>, FiscalError> {
    let marker = format!("Id=\"{id}\"");
    let attr_at = xml.find(&marker).ok_or_else(|| {
        FiscalError::Signing(format!("no element with Id=\"{id}\" in document"))
    })?;
    let start = xml[..attr_at]
        .rfind('<')
        .ok_or_else(|| FiscalError::Signing("malformed document: no element start".into()))?;
    let tag_end = xml[start + 1..]
        .find(|c: char| c.is_whitespace() || c == '>')
        .ok_or_else(|| FiscalError::Signing("malformed document: unterminated tag".into()))?;
    let tag = &xml[start + 1..start + 1 + tag_end];
    let close = format!("</{tag}>");
    let close_at = xml[start..]
        .find(&close)
        .ok_or_else(|| FiscalError::Signing(format!("element <{tag}> is never closed")))?;
    Ok(start..start + close_at + close.len())
}

/// Canonical form of one extracted element.
///
/// The writer already emits canonical-compatible bytes (compact output,
/// fixed attribute order, quick-xml escaping); the only c14n step left is
/// propagating the default namespace inherited from the document root into
/// the extracted element's start tag.
fn canonicalize(element: &str, inherited_ns: &str) -> String {
    let tag_end = element
        .find(|c: char| c.is_whitespace() || c == '>')
        .unwrap_or(element.len());
    if element[..element.find('>').unwrap_or(element.len())].contains("xmlns=") {
        element.to_string()
    } else {
        format!(
            "{} xmlns=\"{}\"{}",
            &element[..tag_end],
            inherited_ns,
            &element[tag_end..]
        )
    }
}

fn sha1_base64(data: &[u8]) -> Result<String, FiscalError> {
    let digest = hash(MessageDigest::sha1(), data)
        .map_err(|e| FiscalError::Signing(format!("digest: {e}")))?;
    Ok(BASE64.encode(&digest))
}

fn build_signed_info(reference_id: &str, digest_value: &str) -> String {
    format!(
        concat!(
            "<SignedInfo>",
            "<CanonicalizationMethod Algorithm=\"{c14n}\"></CanonicalizationMethod>",
            "<SignatureMethod Algorithm=\"{rsa_sha1}\"></SignatureMethod>",
            "<Reference URI=\"#{id}\">",
            "<Transforms>",
            "<Transform Algorithm=\"{enveloped}\"></Transform>",
            "<Transform Algorithm=\"{c14n}\"></Transform>",
            "</Transforms>",
            "<DigestMethod Algorithm=\"{sha1}\"></DigestMethod>",
            "<DigestValue>{digest}</DigestValue>",
            "</Reference>",
            "</SignedInfo>",
        ),
        c14n = ALG_C14N,
        rsa_sha1 = ALG_RSA_SHA1,
        enveloped = ALG_ENVELOPED,
        sha1 = ALG_SHA1,
        id = reference_id,
        digest = digest_value,
    )
}

/// Sign the element identified by `reference_id` and splice the `Signature`
/// block into the document.
///
/// Steps follow the enveloped-signature profile: canonicalize the referenced
/// element (the enveloped transform is a no-op at this point — no signature
/// exists yet), digest it, sign the canonical `SignedInfo` with RSA-SHA1,
/// and emit the signature with the certificate as key material. The block
/// lands after the referenced element, skipping a receipt's `infNFeSupl`
/// supplement so the schema order (`infNFe`, `infNFeSupl`, `Signature`) is
/// preserved.
pub fn sign_document(
    xml: &str,
    reference_id: &str,
    credential: &SigningCredential,
) -> Result<String, FiscalError> {
    let range = referenced_element(xml, reference_id)?;
    let canonical = canonicalize(&xml[range.clone()], NFE_NS);
    let digest_value = sha1_base64(canonical.as_bytes())?;

    let signed_info = build_signed_info(reference_id, &digest_value);
    // SignedInfo is signed in its canonical form, with the dsig namespace
    // it inherits from the Signature element made explicit.
    let canonical_signed_info = canonicalize(&signed_info, DSIG_NS);
    let signature_value = BASE64.encode(credential.sign_sha1(canonical_signed_info.as_bytes())?);
    let certificate = BASE64.encode(credential.certificate_der()?);

    let signature_block = format!(
        concat!(
            "<Signature xmlns=\"{ns}\">",
            "{signed_info}",
            "<SignatureValue>{value}</SignatureValue>",
            "<KeyInfo><X509Data><X509Certificate>{cert}</X509Certificate></X509Data></KeyInfo>",
            "</Signature>",
        ),
        ns = DSIG_NS,
        signed_info = signed_info,
        value = signature_value,
        cert = certificate,
    );

    let mut insert_at = range.end;
    // Keep the supplement block between the signed element and the signature.
    if xml[insert_at..].starts_with("<infNFeSupl>") {
        if let Some(close) = xml[insert_at..].find("</infNFeSupl>") {
            insert_at += close + "</infNFeSupl>".len();
        }
    }

    let mut signed = String::with_capacity(xml.len() + signature_block.len());
    signed.push_str(&xml[..insert_at]);
    signed.push_str(&signature_block);
    signed.push_str(&xml[insert_at..]);
    Ok(signed)
}

fn text_between<'a>(xml: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = xml.find(open)? + open.len();
    let end = xml[start..].find(close)? + start;
    Some(&xml[start..end])
}

/// Verify an enveloped signature produced by [`sign_document`].
///
/// Recomputes the canonical digest of the referenced element (with the
/// signature stripped, per the enveloped transform) and checks the RSA
/// signature over `SignedInfo` against the embedded certificate. Returns
/// `Ok(false)` when either check fails; `Err` when the document lacks the
/// signature structure entirely.
pub fn verify_signature(xml: &str) -> Result<bool, FiscalError> {
    let signature_start = xml
        .find("<Signature")
        .ok_or_else(|| FiscalError::Signing("document has no Signature element".into()))?;
    let signature_close = xml[signature_start..]
        .find("</Signature>")
        .map(|at| signature_start + at + "</Signature>".len())
        .ok_or_else(|| FiscalError::Signing("Signature element is never closed".into()))?;

    let reference_id = text_between(xml, "URI=\"#", "\"")
        .ok_or_else(|| FiscalError::Signing("signature has no reference URI".into()))?
        .to_string();
    let digest_value = text_between(xml, "<DigestValue>", "</DigestValue>")
        .ok_or_else(|| FiscalError::Signing("signature has no digest value".into()))?;
    let signature_value = text_between(xml, "<SignatureValue>", "</SignatureValue>")
        .ok_or_else(|| FiscalError::Signing("signature has no signature value".into()))?;
    let certificate_b64 = text_between(xml, "<X509Certificate>", "</X509Certificate>")
        .ok_or_else(|| FiscalError::Signing("signature has no certificate".into()))?;

    // Enveloped transform: digest the document with the signature removed.
    let mut stripped = String::with_capacity(xml.len());
    stripped.push_str(&xml[..signature_start]);
    stripped.push_str(&xml[signature_close..]);
    let range = referenced_element(&stripped, &reference_id)?;
    let canonical = canonicalize(&stripped[range], NFE_NS);
    let recomputed = sha1_base64(canonical.as_bytes())?;
    if recomputed != digest_value {
        return Ok(false);
    }

    let signed_info = text_between(xml, "<SignedInfo>", "</SignedInfo>")
        .map(|inner| format!("<SignedInfo>{inner}</SignedInfo>"))
        .ok_or_else(|| FiscalError::Signing("signature has no SignedInfo".into()))?;
    let canonical_signed_info = canonicalize(&signed_info, DSIG_NS);

    let der = BASE64
        .decode(certificate_b64)
        .map_err(|e| FiscalError::Signing(format!("certificate base64: {e}")))?;
    let cert = X509::from_der(&der)
        .map_err(|e| FiscalError::Signing(format!("embedded certificate: {e}")))?;
    let public_key = cert
        .public_key()
        .map_err(|e| FiscalError::Signing(format!("certificate public key: {e}")))?;
    let raw_signature = BASE64
        .decode(signature_value)
        .map_err(|e| FiscalError::Signing(format!("signature base64: {e}")))?;

    let mut verifier = Verifier::new(MessageDigest::sha1(), &public_key)
        .map_err(|e| FiscalError::Signing(format!("verifier init: {e}")))?;
    verifier
        .update(canonical_signed_info.as_bytes())
        .map_err(|e| FiscalError::Signing(format!("verifier update: {e}")))?;
    verifier
        .verify(&raw_signature)
        .map_err(|e| FiscalError::Signing(format!("verify: {e}")))
}

/// Embedded digest value of the reference, for audit tooling.
pub fn embedded_digest(xml: &str) -> Option<&str> {
    text_between(xml, "<DigestValue>", "</DigestValue>")
}
