//! Transmission to the tax authority's SOAP 1.2 web services.
//!
//! Endpoint selection is a pure function of state, service and environment
//! ([`routing::resolve`]): ten states operate their own infrastructure, one
//! is served by a dedicated federated cluster, and everything else falls
//! back to the shared federated cluster. [`TransmissionClient`] wraps the
//! resolved endpoint with mutual-TLS HTTPS, a single attempt per call and a
//! 30 second default timeout; responses come back as
//! [`TransmissionResult`] with the authority's status code and reason
//! verbatim.

pub mod response;
pub mod routing;
pub mod soap;

mod client;

pub use client::{TransmissionClient, DEFAULT_TIMEOUT};
pub use response::{
    TransmissionResult, STATUS_AUTHORIZED, STATUS_BATCH_RECEIVED, STATUS_SERVICE_ONLINE,
};
pub use routing::{cluster_for, resolve, Cluster, Service};
