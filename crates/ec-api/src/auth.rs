//! Bearer token acquisition
//!
//! Client credentials are exchanged at `{ids_address}/connect/token` on every
//! call. A pre-issued access token is used as-is.

use crate::response::{check_status, read_json, transport_error};
use ec_core::config::Credentials;
use ec_core::{Error, Result};
use serde::Deserialize;

const SERVICE: &str = "identity";

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Source of bearer tokens for one API client
#[derive(Debug, Clone)]
pub struct Authenticator {
    ids_address: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl Authenticator {
    /// Create an authenticator for one identity server and credential set
    pub fn new(
        ids_address: impl Into<String>,
        credentials: Credentials,
        client: reqwest::Client,
    ) -> Self {
        Self {
            ids_address: ids_address.into().trim_end_matches('/').to_string(),
            credentials,
            client,
        }
    }

    /// Obtain a bearer token
    ///
    /// `default_scope` applies when the credentials carry no scope override.
    pub async fn bearer_token(&self, default_scope: &str) -> Result<String> {
        let (client_id, client_secret, scope) = match &self.credentials {
            Credentials::AccessToken { access_token } => return Ok(access_token.clone()),
            Credentials::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => (client_id, client_secret, scope.as_deref().unwrap_or(default_scope)),
        };

        tracing::debug!("Requesting access token for scope {}", scope);

        let url = format!("{}/connect/token", self.ids_address);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("scope", scope),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, "token request", response).await?;
        let token: TokenResponse = read_json(SERVICE, response).await?;

        if token.access_token.is_empty() {
            return Err(Error::auth("identity server returned an empty access token"));
        }
        Ok(token.access_token)
    }
}
