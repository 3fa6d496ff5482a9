//! Configuration types for the provider resources
//!
//! This module defines the provider-level configuration handed to the API
//! clients, the per-resource impersonation settings, and the parsers for the
//! user-facing string attributes (environments, durations).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default management API address
pub const DEFAULT_API_ADDRESS: &str = "https://api.vdms.io";

/// Default identity server address (OAuth2 token endpoint host)
pub const DEFAULT_IDS_ADDRESS: &str = "https://id.vdms.io";

/// Provider-level configuration
///
/// Read-only input shared by every resource invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base address of the management API
    #[serde(default = "default_api_address")]
    pub api_address: String,

    /// Base address of the identity server
    #[serde(default = "default_ids_address")]
    pub ids_address: String,

    /// Credentials used to authenticate API calls
    pub credentials: Credentials,

    /// HTTP request timeout (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Log level for [`crate::logging::init_logging`]
    ///
    /// Only validated here. The host passes it to `init_logging` once at
    /// plugin start.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ProviderConfig {
    /// Create a configuration with default addresses for the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            api_address: default_api_address(),
            ids_address: default_ids_address(),
            credentials,
            http_timeout_secs: default_http_timeout_secs(),
            log_level: default_log_level(),
        }
    }

    /// Override the management API address
    pub fn with_api_address(mut self, address: impl Into<String>) -> Self {
        self.api_address = address.into();
        self
    }

    /// Override the identity server address
    pub fn with_ids_address(mut self, address: impl Into<String>) -> Self {
        self.ids_address = address.into();
        self
    }

    /// Load configuration from `EC_*` environment variables
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// `EC_ACCESS_TOKEN` takes precedence over the client credential pair.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = match lookup("EC_ACCESS_TOKEN").filter(|t| !t.is_empty()) {
            Some(access_token) => Credentials::AccessToken { access_token },
            None => Credentials::ClientCredentials {
                client_id: lookup("EC_IDS_CLIENT_ID").ok_or_else(|| {
                    crate::Error::config("EC_IDS_CLIENT_ID or EC_ACCESS_TOKEN is required")
                })?,
                client_secret: lookup("EC_IDS_CLIENT_SECRET").ok_or_else(|| {
                    crate::Error::config("EC_IDS_CLIENT_SECRET is required with EC_IDS_CLIENT_ID")
                })?,
                scope: lookup("EC_IDS_SCOPE"),
            },
        };

        let http_timeout_secs = match lookup("EC_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                crate::Error::config(format!("EC_HTTP_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => default_http_timeout_secs(),
        };

        let config = Self {
            api_address: lookup("EC_API_ADDRESS").unwrap_or_else(default_api_address),
            ids_address: lookup("EC_IDS_ADDRESS").unwrap_or_else(default_ids_address),
            credentials,
            http_timeout_secs,
            log_level: lookup("EC_LOG_LEVEL").unwrap_or_else(default_log_level),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_address("api_address", &self.api_address)?;
        validate_address("ids_address", &self.ids_address)?;
        self.credentials.validate()?;

        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("http_timeout_secs must be > 0"));
        }

        crate::logging::parse_level(&self.log_level)?;

        Ok(())
    }

    /// HTTP request timeout as a [`Duration`]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn validate_address(field: &str, address: &str) -> Result<(), crate::Error> {
    if address.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", field)));
    }
    if !address.starts_with("https://") && !address.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, address
        )));
    }
    Ok(())
}

fn default_api_address() -> String {
    DEFAULT_API_ADDRESS.to_string()
}

fn default_ids_address() -> String {
    DEFAULT_IDS_ADDRESS.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// API credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// OAuth2 client credentials exchanged for a token on every call
    ClientCredentials {
        /// Identity server client ID
        client_id: String,
        /// Identity server client secret
        /// ⚠️ NEVER log this value
        client_secret: String,
        /// Scope override (each API client has its own default)
        #[serde(default)]
        scope: Option<String>,
    },

    /// A bearer token issued out of band
    AccessToken {
        /// ⚠️ NEVER log this value
        access_token: String,
    },
}

impl Credentials {
    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            Credentials::ClientCredentials {
                client_id,
                client_secret,
                ..
            } => {
                if client_id.is_empty() {
                    return Err(crate::Error::config("client_id cannot be empty"));
                }
                if client_secret.is_empty() {
                    return Err(crate::Error::config("client_secret cannot be empty"));
                }
                Ok(())
            }
            Credentials::AccessToken { access_token } => {
                if access_token.is_empty() {
                    return Err(crate::Error::config("access_token cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

// Custom Debug implementation that hides secrets
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ClientCredentials {
                client_id, scope, ..
            } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<REDACTED>")
                .field("scope", scope)
                .finish(),
            Credentials::AccessToken { .. } => f
                .debug_struct("AccessToken")
                .field("access_token", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Impersonation settings sent with every API call
///
/// Ignored by the remote service for MCC credentials. Empty strings mean
/// "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impersonation {
    /// Account to impersonate
    #[serde(default)]
    pub account_number: String,

    /// Portal type to impersonate (1=MCC 2=PCC 3=WCC 4=WCC 5=opencdn)
    #[serde(default)]
    pub portal_type_id: String,

    /// Customer user to impersonate
    #[serde(default)]
    pub customer_user_id: String,
}

impl Impersonation {
    /// Create impersonation settings for an account
    pub fn for_account(account_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            ..Self::default()
        }
    }

    /// Set the portal type ID
    pub fn with_portal_type_id(mut self, portal_type_id: impl Into<String>) -> Self {
        self.portal_type_id = portal_type_id.into();
        self
    }

    /// Set the customer user ID
    pub fn with_customer_user_id(mut self, customer_user_id: impl Into<String>) -> Self {
        self.customer_user_id = customer_user_id.into();
        self
    }
}

/// Target environment of a deploy request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnvironment {
    /// Production platform
    Production,
    /// Staging platform
    Staging,
}

impl DeployEnvironment {
    /// Wire name of the environment
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployEnvironment::Production => "production",
            DeployEnvironment::Staging => "staging",
        }
    }
}

impl fmt::Display for DeployEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployEnvironment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(DeployEnvironment::Production),
            "staging" => Ok(DeployEnvironment::Staging),
            other => Err(crate::Error::invalid_input(format!(
                "deploy_to must be one of `production`, `staging`. Got: {}",
                other
            ))),
        }
    }
}

/// Parse a duration string such as `20m`, `1h30m` or `1.5s`
///
/// Accepts one or more decimal numbers, each followed by a unit
/// (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`). A bare `0` is allowed.
/// Negative durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, crate::Error> {
    let invalid = || crate::Error::invalid_input(format!("invalid duration {:?}", input));

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return Err(crate::Error::invalid_input(format!(
            "duration cannot be negative: {:?}",
            input
        )));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos: f64 = 0.0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err(invalid());
        }
        let value: f64 = number.parse().map_err(|_| invalid())?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => {
                return Err(crate::Error::invalid_input(format!(
                    "missing unit in duration {:?}",
                    input
                )));
            }
            _ => {
                return Err(crate::Error::invalid_input(format!(
                    "unknown unit {:?} in duration {:?}",
                    unit, input
                )));
            }
        };

        total_nanos += value * scale;
        rest = tail;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid());
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
