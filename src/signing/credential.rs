use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use openssl::x509::X509;

use crate::core::FiscalError;

/// An RSA key pair plus its certificate, extracted once from a
/// password-protected PKCS#12 container.
pub struct SigningCredential {
    key: PKey<Private>,
    cert: X509,
    fingerprint: String,
}

impl SigningCredential {
    /// Extract the key and certificate from PKCS#12 DER bytes. A wrong
    /// passphrase or malformed container fails here, before any signing.
    pub fn from_pkcs12(der: &[u8], passphrase: &str) -> Result<Self, FiscalError> {
        let container = Pkcs12::from_der(der)
            .map_err(|e| FiscalError::Credential(format!("malformed PKCS#12 container: {e}")))?;
        let parsed = container.parse2(passphrase).map_err(|e| {
            FiscalError::Credential(format!("cannot open PKCS#12 container (passphrase?): {e}"))
        })?;
        let key = parsed
            .pkey
            .ok_or_else(|| FiscalError::Credential("container holds no private key".into()))?;
        let cert = parsed
            .cert
            .ok_or_else(|| FiscalError::Credential("container holds no certificate".into()))?;
        Self::from_parts(key, cert)
    }

    /// Build from already-extracted parts (tests, external key stores).
    pub fn from_parts(key: PKey<Private>, cert: X509) -> Result<Self, FiscalError> {
        let digest = cert
            .digest(MessageDigest::sha1())
            .map_err(|e| FiscalError::Credential(format!("certificate digest: {e}")))?;
        let fingerprint = digest
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<String>();
        Ok(Self {
            key,
            cert,
            fingerprint,
        })
    }

    /// SHA-1 fingerprint of the certificate, upper-case hex.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Certificate in DER form, for the signature's key material.
    pub fn certificate_der(&self) -> Result<Vec<u8>, FiscalError> {
        self.cert
            .to_der()
            .map_err(|e| FiscalError::Credential(format!("certificate DER export: {e}")))
    }

    pub fn certificate(&self) -> &X509 {
        &self.cert
    }

    /// RSA-SHA1 signature over `data`. The legacy algorithm is mandated by
    /// the authority and must be preserved bit-for-bit.
    pub(crate) fn sign_sha1(&self, data: &[u8]) -> Result<Vec<u8>, FiscalError> {
        let mut signer = Signer::new(MessageDigest::sha1(), &self.key)
            .map_err(|e| FiscalError::Signing(format!("signer init: {e}")))?;
        signer
            .update(data)
            .map_err(|e| FiscalError::Signing(format!("signer update: {e}")))?;
        signer
            .sign_to_vec()
            .map_err(|e| FiscalError::Signing(format!("signature: {e}")))
    }
}

impl std::fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredential")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Explicit, shareable credential cache keyed by certificate fingerprint.
///
/// Container parsing is expensive; callers insert a credential once and
/// reuse the `Arc` across signing operations. Entries have no expiry —
/// invalidate manually when a credential is rotated.
#[derive(Debug, Default)]
pub struct CredentialCache {
    entries: Mutex<HashMap<String, Arc<SigningCredential>>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a credential under its fingerprint, returning the shared handle.
    pub fn insert(&self, credential: SigningCredential) -> Result<Arc<SigningCredential>, FiscalError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| FiscalError::Credential("credential cache lock poisoned".into()))?;
        let handle = Arc::new(credential);
        entries.insert(handle.fingerprint().to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn get(&self, fingerprint: &str) -> Option<Arc<SigningCredential>> {
        self.entries.lock().ok()?.get(fingerprint).cloned()
    }

    /// Drop a rotated credential. Returns whether an entry was present.
    pub fn invalidate(&self, fingerprint: &str) -> bool {
        self.entries
            .lock()
            .map(|mut e| e.remove(fingerprint).is_some())
            .unwrap_or(false)
    }
}
