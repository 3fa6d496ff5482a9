//! HTTP client for the certificate provisioning service (CPS)
//!
//! ## API Reference
//!
//! - Certificate details: GET `/v2/pki/certificate/:id`
//! - Certificate status: GET `/v2/pki/certificate/:id/status`

use crate::auth::Authenticator;
use crate::response::{build_client, check_status, read_json, transport_error};
use async_trait::async_trait;
use ec_core::config::ProviderConfig;
use ec_core::traits::{Certificate, CertificateApi, CertificateApiFactory, CertificateStatus};
use ec_core::Result;

const SERVICE: &str = "cps";

/// Path of the certificate resource below the management API address
const API_PATH: &str = "v2/pki/certificate";

/// OAuth scope requested when the credentials carry none
pub const DEFAULT_SCOPE: &str = "sec.cps.certificates";

/// CPS certificate client
#[derive(Debug)]
pub struct HttpCertificateClient {
    base_url: String,
    auth: Authenticator,
    client: reqwest::Client,
}

impl HttpCertificateClient {
    /// Create a client from validated configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(config.http_timeout())?;

        Ok(Self {
            base_url: format!(
                "{}/{}",
                config.api_address.trim_end_matches('/'),
                API_PATH
            ),
            auth: Authenticator::new(
                config.ids_address.clone(),
                config.credentials.clone(),
                client.clone(),
            ),
            client,
        })
    }

    async fn get(&self, what: &str, url: String) -> Result<reqwest::Response> {
        let token = self.auth.bearer_token(DEFAULT_SCOPE).await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        check_status(SERVICE, what, response).await
    }
}

#[async_trait]
impl CertificateApi for HttpCertificateClient {
    async fn get_certificate(&self, certificate_id: i64) -> Result<Certificate> {
        tracing::debug!("Retrieving certificate {}", certificate_id);

        let url = format!("{}/{}", self.base_url, certificate_id);
        let response = self
            .get(&format!("certificate {}", certificate_id), url)
            .await?;
        read_json(SERVICE, response).await
    }

    async fn get_certificate_status(&self, certificate_id: i64) -> Result<CertificateStatus> {
        let url = format!("{}/{}/status", self.base_url, certificate_id);
        let response = self
            .get(&format!("certificate {} status", certificate_id), url)
            .await?;
        read_json(SERVICE, response).await
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

/// Factory for CPS certificate clients
pub struct CertificateClientFactory;

impl CertificateApiFactory for CertificateClientFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn CertificateApi>> {
        Ok(Box::new(HttpCertificateClient::new(config)?))
    }
}
