use std::time::Duration;

use crate::core::{Environment, FiscalError, Uf};

use super::response::{self, TransmissionResult};
use super::routing::{self, Service};
use super::soap;

/// Default transport timeout. The call is synchronous and single-attempt;
/// a timeout is surfaced verbatim, never retried.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTPS client for the authority's SOAP services, authenticated with the
/// issuer's client certificate.
pub struct TransmissionClient {
    http: reqwest::Client,
}

impl TransmissionClient {
    /// Build a client from the issuer's PKCS#12 container. The same
    /// container that feeds [`crate::signing::SigningCredential`] also
    /// authenticates the TLS channel.
    pub fn new(pkcs12_der: &[u8], passphrase: &str) -> Result<Self, FiscalError> {
        Self::with_timeout(pkcs12_der, passphrase, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        pkcs12_der: &[u8],
        passphrase: &str,
        timeout: Duration,
    ) -> Result<Self, FiscalError> {
        let identity = reqwest::Identity::from_pkcs12_der(pkcs12_der, passphrase)
            .map_err(|e| FiscalError::Credential(format!("client identity: {e}")))?;
        let http = reqwest::Client::builder()
            .identity(identity)
            .timeout(timeout)
            .build()
            .map_err(|e| FiscalError::Transport(format!("client build: {e}")))?;
        Ok(Self { http })
    }

    /// Submit one signed document for authorization.
    pub async fn send_document(
        &self,
        signed_document: &str,
        uf: Uf,
        environment: Environment,
        batch_id: u64,
    ) -> Result<TransmissionResult, FiscalError> {
        let body = soap::authorization_envelope(batch_id, signed_document);
        self.post(uf, Service::Authorization, environment, body)
            .await
    }

    /// Submit one signed cancellation event.
    pub async fn send_event(
        &self,
        signed_event: &str,
        uf: Uf,
        environment: Environment,
        lot_id: u64,
    ) -> Result<TransmissionResult, FiscalError> {
        let body = soap::event_envelope(lot_id, signed_event);
        self.post(uf, Service::EventReception, environment, body)
            .await
    }

    /// Submit one signed number-range invalidation.
    pub async fn send_invalidation(
        &self,
        signed_invalidation: &str,
        uf: Uf,
        environment: Environment,
    ) -> Result<TransmissionResult, FiscalError> {
        let body = soap::invalidation_envelope(signed_invalidation);
        self.post(uf, Service::Invalidation, environment, body).await
    }

    /// Query service health. Expect status 107 before trusting any
    /// authorization response as final.
    pub async fn query_status(
        &self,
        uf: Uf,
        environment: Environment,
    ) -> Result<TransmissionResult, FiscalError> {
        let body = soap::status_envelope(uf, environment);
        self.post(uf, Service::StatusService, environment, body)
            .await
    }

    async fn post(
        &self,
        uf: Uf,
        service: Service,
        environment: Environment,
        body: String,
    ) -> Result<TransmissionResult, FiscalError> {
        let url = routing::resolve(uf, service, environment)?;
        let action = service.soap_action();

        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("application/soap+xml; charset=utf-8; action=\"{action}\""),
            )
            .header("SOAPAction", action)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FiscalError::Transport(format!("timed out contacting {url}"))
                } else {
                    FiscalError::Transport(format!("request to {url} failed: {e}"))
                }
            })?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| FiscalError::Transport(format!("reading response body: {e}")))?;

        if !status.is_success() {
            return Err(FiscalError::Transport(format!(
                "HTTP {status} from {url}: {payload}"
            )));
        }

        response::parse(&payload)
    }
}
