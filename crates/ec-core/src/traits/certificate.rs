// # Certificate API Trait
//
// Defines the interface for reading certificates from the certificate
// provisioning service (CPS).
//
// ## Implementations
//
// - HTTP: `ec-api` crate (`HttpCertificateClient`)
// - Tests: scripted doubles under `tests/common`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Certificate validation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationType {
    /// Domain validation (DNS TXT token)
    #[serde(rename = "DV")]
    Dv,
    /// Organization validation
    #[serde(rename = "OV")]
    Ov,
    /// Extended validation
    #[serde(rename = "EV")]
    Ev,
    /// No validation type set
    #[serde(rename = "None")]
    None,
    /// Anything the service adds later
    #[serde(untagged)]
    Other(String),
}

/// DCV token attached to a domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcvToken {
    /// Token value to publish as a DNS TXT record
    #[serde(default)]
    pub token: String,
}

/// Domain control validation metadata for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDcv {
    /// Domain name
    #[serde(default)]
    pub name: String,
    /// Token, once the service has generated one
    #[serde(default)]
    pub dcv_token: Option<DcvToken>,
}

/// Certificate details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Certificate identifier
    pub id: i64,
    /// Validation type
    pub validation_type: ValidationType,
    /// Workflow error, if the order has failed
    #[serde(default)]
    pub workflow_error_message: Option<String>,
    /// Per-domain DCV metadata
    #[serde(default)]
    pub domains: Vec<DomainDcv>,
}

/// Certificate processing status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateStatus {
    /// Status name, e.g. `Processing`, `Deployed`
    #[serde(default)]
    pub status: String,
}

/// Trait for certificate API implementations
///
/// Single-shot reads only. Polling is owned by [`crate::token::TokenPoller`].
#[async_trait]
pub trait CertificateApi: Send + Sync {
    /// Fetch certificate details, including per-domain DCV metadata
    async fn get_certificate(&self, certificate_id: i64) -> Result<Certificate, crate::Error>;

    /// Fetch the certificate processing status
    async fn get_certificate_status(
        &self,
        certificate_id: i64,
    ) -> Result<CertificateStatus, crate::Error>;

    /// Get the service name (for logging/debugging)
    fn service_name(&self) -> &'static str;
}

/// Helper trait for constructing certificate clients from configuration
pub trait CertificateApiFactory: Send + Sync {
    /// Create a CertificateApi instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn CertificateApi>, crate::Error>;
}
