//! HTTP client for the rules engine API
//!
//! ## API Reference
//!
//! - Add policy: POST `/rules-engine/v1.1/policies`
//! - Get policy: GET `/rules-engine/v1.1/policies/:id`
//! - Deploy policy: POST `/rules-engine/v1.1/deploy-requests`
//!
//! Impersonation is carried in the `Portals_AccountNumber`,
//! `Portals_PortalTypeId` and `Portals_UserId` headers.

use crate::auth::Authenticator;
use crate::response::{build_client, check_status, read_json, transport_error};
use async_trait::async_trait;
use ec_core::config::{Impersonation, ProviderConfig};
use ec_core::traits::{
    AddPolicyResponse, DeployRequest, DeployResponse, RulesEngineApi, RulesEngineApiFactory,
};
use ec_core::Result;
use reqwest::Method;
use serde_json::Value;

const SERVICE: &str = "rules-engine";

/// Path of the rules engine API below the management API address
const API_PATH: &str = "rules-engine/v1.1";

/// OAuth scope requested when the credentials carry none
pub const DEFAULT_SCOPE: &str = "ec.rules";

/// Rules engine API client
///
/// One HTTP call per trait method (plus a token request when using client
/// credentials). No retries.
#[derive(Debug)]
pub struct HttpRulesEngineClient {
    base_url: String,
    auth: Authenticator,
    client: reqwest::Client,
}

impl HttpRulesEngineClient {
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

    async fn request(
        &self,
        method: Method,
        path: &str,
        impersonation: &Impersonation,
    ) -> Result<reqwest::RequestBuilder> {
        let token = self.auth.bearer_token(DEFAULT_SCOPE).await?;
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/json");

        for (header, value) in [
            ("Portals_AccountNumber", &impersonation.account_number),
            ("Portals_PortalTypeId", &impersonation.portal_type_id),
            ("Portals_UserId", &impersonation.customer_user_id),
        ] {
            if !value.is_empty() {
                request = request.header(header, value.as_str());
            }
        }

        Ok(request)
    }

    async fn send(&self, what: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        check_status(SERVICE, what, response).await
    }
}

#[async_trait]
impl RulesEngineApi for HttpRulesEngineClient {
    async fn add_policy(
        &self,
        policy: &str,
        impersonation: &Impersonation,
    ) -> Result<AddPolicyResponse> {
        tracing::debug!("Submitting policy for account {}", impersonation.account_number);

        let request = self
            .request(Method::POST, "policies", impersonation)
            .await?
            .header("Content-Type", "application/json")
            .body(policy.to_string());

        let response = self.send("add policy", request).await?;
        read_json(SERVICE, response).await
    }

    async fn get_policy(&self, policy_id: i64, impersonation: &Impersonation) -> Result<Value> {
        let request = self
            .request(Method::GET, &format!("policies/{}", policy_id), impersonation)
            .await?;

        let response = self
            .send(&format!("policy {}", policy_id), request)
            .await?;
        read_json(SERVICE, response).await
    }

    async fn deploy_policy(
        &self,
        deploy: &DeployRequest,
        impersonation: &Impersonation,
    ) -> Result<DeployResponse> {
        let request = self
            .request(Method::POST, "deploy-requests", impersonation)
            .await?
            .json(deploy);

        let response = self.send("deploy request", request).await?;
        read_json(SERVICE, response).await
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

/// Factory for rules engine clients
pub struct RulesEngineClientFactory;

impl RulesEngineApiFactory for RulesEngineClientFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn RulesEngineApi>> {
        Ok(Box::new(HttpRulesEngineClient::new(config)?))
    }
}
