// # Rules Engine API Trait
//
// Defines the interface for managing rules engine policies via the remote
// management API.
//
// ## Implementations
//
// - HTTP: `ec-api` crate (`HttpRulesEngineClient`)
// - Tests: in-memory doubles under `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use ec_core::traits::{DeployRequest, RulesEngineApi};
//
// let created = api.add_policy(&policy_json, &impersonation).await?;
// let policy_id: i64 = created.id.parse()?;
// api.deploy_policy(
//     &DeployRequest::new(policy_id, DeployEnvironment::Staging),
//     &impersonation,
// ).await?;
// ```

use crate::config::{DeployEnvironment, Impersonation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message attached to every deploy request
pub const DEPLOY_MESSAGE: &str = "Auto-submitted policy";

/// Response to a policy submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPolicyResponse {
    /// Identifier of the new policy (numeric, but transported as a string)
    pub id: String,
}

/// Request to promote a saved policy to an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    /// Free-form message recorded with the request
    pub message: String,
    /// Policy to deploy
    pub policy_id: i64,
    /// Target environment
    pub environment: DeployEnvironment,
}

impl DeployRequest {
    /// Create a deploy request with the standard message
    pub fn new(policy_id: i64, environment: DeployEnvironment) -> Self {
        Self {
            message: DEPLOY_MESSAGE.to_string(),
            policy_id,
            environment,
        }
    }
}

/// Response to a deploy request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResponse {
    /// Identifier of the deploy request
    pub id: String,
    /// Deploy request state as reported by the service
    #[serde(default)]
    pub state: Option<String>,
}

/// Trait for rules engine API implementations
///
/// Implementations execute exactly one logical API call per method and
/// return failures as errors. Retrying is not their concern.
#[async_trait]
pub trait RulesEngineApi: Send + Sync {
    /// Submit a new policy
    ///
    /// `policy` is the JSON document as a string.
    async fn add_policy(
        &self,
        policy: &str,
        impersonation: &Impersonation,
    ) -> Result<AddPolicyResponse, crate::Error>;

    /// Fetch a policy document by its numeric identifier
    ///
    /// The document is returned untyped; server metadata is still present.
    async fn get_policy(
        &self,
        policy_id: i64,
        impersonation: &Impersonation,
    ) -> Result<serde_json::Value, crate::Error>;

    /// Deploy a saved policy to an environment
    async fn deploy_policy(
        &self,
        request: &DeployRequest,
        impersonation: &Impersonation,
    ) -> Result<DeployResponse, crate::Error>;

    /// Get the service name (for logging/debugging)
    fn service_name(&self) -> &'static str;
}

/// Helper trait for constructing rules engine clients from configuration
pub trait RulesEngineApiFactory: Send + Sync {
    /// Create a RulesEngineApi instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn RulesEngineApi>, crate::Error>;
}
