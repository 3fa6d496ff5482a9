//! Rules engine policy resource
//!
//! Translates the declared policy resource into rules engine API calls.
//!
//! ## Lifecycle
//!
//! ```text
//! create/update ─▶ lock ─▶ add_policy ─▶ deploy_policy ─▶ read
//! read          ─▶ get_policy ─▶ normalize ─▶ store canonical JSON
//! delete        ─▶ get_policy ─▶ placeholder for same platform ─▶ add + deploy ─▶ clear id
//! ```
//!
//! Policies cannot be deleted remotely. Deleting the resource replaces the
//! deployed policy with an empty placeholder and forgets the identifier.

use crate::config::{DeployEnvironment, Impersonation};
use crate::error::{Error, Result, ResultExt};
use crate::normalize::normalize;
use crate::traits::{DeployRequest, RulesEngineApi};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

/// Value the `state` field is forced to before submission
pub const LOCKED_STATE: &str = "locked";

/// State of a policy resource instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyResourceData {
    /// Policy identifier; `None` before creation and after deletion
    pub id: Option<String>,
    /// Policy JSON document
    pub policy: String,
    /// Target environment
    pub deploy_to: DeployEnvironment,
    /// Identifier of the last deploy request
    pub deploy_request_id: Option<String>,
    /// Impersonation settings for every call
    pub impersonation: Impersonation,
}

impl PolicyResourceData {
    /// Create resource input for a policy document
    pub fn new(policy: impl Into<String>, deploy_to: DeployEnvironment) -> Self {
        Self {
            id: None,
            policy: policy.into(),
            deploy_to,
            deploy_request_id: None,
            impersonation: Impersonation::default(),
        }
    }

    /// Set the impersonation settings
    pub fn with_impersonation(mut self, impersonation: Impersonation) -> Self {
        self.impersonation = impersonation;
        self
    }
}

/// Check a declared policy string
///
/// Rejects blank strings and anything that is not valid JSON.
pub fn validate_policy(policy: &str) -> Result<()> {
    if policy.trim().is_empty() {
        return Err(Error::invalid_input("policy must not be empty or whitespace"));
    }
    serde_json::from_str::<Value>(policy)
        .map_err(|e| Error::invalid_input(format!("policy is not valid JSON: {}", e)))?;
    Ok(())
}

/// Canonical form of a declared policy string, as stored in state
///
/// Empty input is returned as-is.
pub fn state_func(policy: &str) -> Result<String> {
    if policy.is_empty() {
        return Ok(String::new());
    }
    let doc = parse_policy(policy)?;
    Ok(serde_json::to_string(&normalize(Value::Object(doc)))?)
}

/// Build the placeholder policy deployed in place of a deleted one
///
/// `timestamp` is embedded in the name and in the comment feature.
pub fn placeholder_policy(platform: &str, timestamp: &str) -> Value {
    json!({
        "@type": "policy-create",
        "name": format!("Terraform Placeholder - {}", timestamp),
        "platform": platform,
        "rules": [{
            "@type": "rule-create",
            "description": "Placeholder rule created by the Edgecast Terraform Provider",
            "matches": [{
                "features": [{
                    "type": "feature.comment",
                    "value": format!("Empty policy created on {}", timestamp),
                }],
                "ordinal": 1,
                "type": "match.always",
            }],
            "name": "Placeholder Rule",
        }],
        "state": LOCKED_STATE,
    })
}

fn parse_policy(policy: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(policy) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(Error::invalid_input("policy must be a JSON object")),
        Err(e) => Err(Error::invalid_input(format!("policy is not valid JSON: {}", e))),
    }
}

fn parse_policy_id(id: Option<&str>) -> Result<i64> {
    let id = id.unwrap_or_default();
    id.parse::<i64>().map_err(|e| {
        Error::invalid_input(format!(
            "error parsing Policy ID from state: {:?}: {}",
            id, e
        ))
    })
}

fn policy_id_of(doc: &Value) -> Option<String> {
    match doc.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The rules engine policy resource
pub struct PolicyResource {
    api: Box<dyn RulesEngineApi>,
}

impl PolicyResource {
    /// Create the resource over a rules engine API client
    pub fn new(api: Box<dyn RulesEngineApi>) -> Self {
        Self { api }
    }

    /// Create a policy and deploy it to the target environment
    pub async fn create(&self, data: &mut PolicyResourceData) -> Result<()> {
        let mut doc = parse_policy(&data.policy)?;
        doc.insert("state".to_string(), Value::String(LOCKED_STATE.to_string()));
        let policy = serde_json::to_string(&doc)?;

        self.add_policy(&policy, false, data).await?;
        self.read(data).await
    }

    /// Refresh `data.policy` with the canonical form of the remote policy
    ///
    /// On failure the identifier is cleared.
    pub async fn read(&self, data: &mut PolicyResourceData) -> Result<()> {
        let doc = match self.get_policy(data).await {
            Ok(doc) => doc,
            Err(e) => {
                data.id = None;
                return Err(e);
            }
        };

        let Some(id) = policy_id_of(&doc) else {
            data.id = None;
            return Err(Error::api(
                self.api.service_name(),
                "policy response has no id",
            ));
        };
        data.id = Some(id);

        let policy = match serde_json::to_string(&normalize(doc)) {
            Ok(policy) => policy,
            Err(e) => {
                data.id = None;
                return Err(Error::from(e).context("error marshaling policy to json"));
            }
        };

        info!(
            "Successfully retrieved policy {}: {}",
            data.id.as_deref().unwrap_or_default(),
            policy
        );
        data.policy = policy;

        Ok(())
    }

    /// Replace the policy; identical to [`PolicyResource::create`]
    pub async fn update(&self, data: &mut PolicyResourceData) -> Result<()> {
        self.create(data).await
    }

    /// Deploy an empty placeholder for the same platform, then forget the id
    pub async fn delete(&self, data: &mut PolicyResourceData) -> Result<()> {
        // Fresh copy, so the placeholder goes to the right platform
        let current = self.get_policy(data).await?;

        let platform = current
            .get("platform")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::api(self.api.service_name(), "policy response has no platform")
            })?;

        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let placeholder = serde_json::to_string(&placeholder_policy(platform, &timestamp))?;

        self.add_policy(&placeholder, true, data).await
    }

    async fn get_policy(&self, data: &PolicyResourceData) -> Result<Value> {
        let policy_id = parse_policy_id(data.id.as_deref())?;
        info!("Retrieving policy {}", policy_id);

        self.api
            .get_policy(policy_id, &data.impersonation)
            .await
            .context("getPolicy")
    }

    async fn add_policy(
        &self,
        policy: &str,
        is_placeholder: bool,
        data: &mut PolicyResourceData,
    ) -> Result<()> {
        let account = data.impersonation.account_number.clone();

        let created = self
            .api
            .add_policy(policy, &data.impersonation)
            .await
            .context("addPolicy")?;

        let policy_id = created.id.parse::<i64>().map_err(|e| {
            Error::invalid_input(format!("{:?}: {}", created.id, e))
                .context("addPolicy: parsing policy ID")
        })?;

        if !is_placeholder {
            data.id = Some(created.id.clone());
            data.policy = policy.to_string();
        }

        let request = DeployRequest::new(policy_id, data.deploy_to);
        info!("Deploying new policy for Account {}: {:?}", account, request);

        let deployed = match self.api.deploy_policy(&request, &data.impersonation).await {
            Ok(deployed) => deployed,
            Err(e) => {
                warn!("Deploying new policy for Account {} failed", account);
                return Err(e.context("addPolicy"));
            }
        };

        info!(
            "Successfully deployed new policy for Account {}: {:?}",
            account, deployed
        );

        if is_placeholder {
            data.id = None;
        } else {
            data.deploy_request_id = Some(deployed.id);
        }

        Ok(())
    }
}
