//! DNS TXT token polling
//!
//! Waits for the certificate service to publish the domain control
//! validation (DCV) token of a DV certificate.
//!
//! Each check reads the certificate and its status, then [`classify`] decides
//! between three outcomes:
//!
//! - **Rejected**: the certificate can never yield a token (wrong validation
//!   type, failed workflow). Polling stops with an error.
//! - **Pending**: the token is not there yet. With waiting enabled the check
//!   is repeated until the deadline; without it polling stops with no value
//!   and no error, and the caller reads again later.
//! - **Ready**: the first domain's token. All domains on a certificate share
//!   the same token.

use crate::config::parse_duration;
use crate::error::{Error, Result, ResultExt};
use crate::retry::{Attempt, CancelSignal, RetryError, RetryPolicy, retry_until};
use crate::traits::{Certificate, CertificateApi, CertificateStatus, ValidationType};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Default for the `wait_timeout` attribute
pub const DEFAULT_WAIT_TIMEOUT: &str = "20m";

/// Why a token is not available yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReason {
    /// Certificate status is `processing`
    Processing,
    /// No domain metadata was returned
    NoDomains,
    /// The first domain has no token object
    MissingToken,
    /// The first domain's token is empty
    EmptyToken,
}

impl fmt::Display for PendingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            PendingReason::Processing => "certificate is processing",
            PendingReason::NoDomains => "no domain metadata returned",
            PendingReason::MissingToken => "first domain has no DCV token",
            PendingReason::EmptyToken => "first domain has an empty DCV token",
        };
        write!(f, "token not available: {}", reason)
    }
}

/// Result of inspecting one certificate read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
    /// Polling can never succeed
    Rejected(String),
    /// Not available yet
    Pending(PendingReason),
    /// The token value
    Ready(String),
}

/// Classify a certificate and its status
pub fn classify(certificate: &Certificate, status: &CertificateStatus) -> TokenCheck {
    if certificate.validation_type != ValidationType::Dv {
        return TokenCheck::Rejected("certificate must have validation type DV".to_string());
    }

    if let Some(message) = certificate
        .workflow_error_message
        .as_deref()
        .filter(|m| !m.is_empty())
    {
        return TokenCheck::Rejected(format!("error in workflow: {}", message));
    }

    if status.status.eq_ignore_ascii_case("processing") {
        return TokenCheck::Pending(PendingReason::Processing);
    }

    let Some(first) = certificate.domains.first() else {
        return TokenCheck::Pending(PendingReason::NoDomains);
    };

    match &first.dcv_token {
        None => TokenCheck::Pending(PendingReason::MissingToken),
        Some(token) if token.token.is_empty() => TokenCheck::Pending(PendingReason::EmptyToken),
        Some(token) => TokenCheck::Ready(token.token.clone()),
    }
}

/// An in-flight polling request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationQuery {
    /// Certificate to inspect
    pub certificate_id: i64,
    /// How long to keep polling when waiting is enabled
    pub timeout: Duration,
    /// Whether to keep polling while the token is pending
    pub wait_until_available: bool,
}

/// Polls the certificate service for a DCV token
pub struct TokenPoller<'a> {
    api: &'a dyn CertificateApi,
    initial_delay: Duration,
    max_delay: Duration,
}

impl<'a> TokenPoller<'a> {
    /// Create a poller with the default interval schedule
    pub fn new(api: &'a dyn CertificateApi) -> Self {
        let defaults = RetryPolicy::new(Duration::ZERO);
        Self {
            api,
            initial_delay: defaults.initial_delay,
            max_delay: defaults.max_delay,
        }
    }

    /// Override the interval schedule
    pub fn with_intervals(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }

    /// Wait for the token
    ///
    /// # Returns
    ///
    /// - `Ok(Some(token))`: the token is available
    /// - `Ok(None)`: the token is pending and waiting is disabled
    /// - `Err(Error::Rejected)`: the certificate can never yield a token
    /// - `Err(Error::Timeout)`: still pending when the deadline elapsed
    /// - `Err(_)`: any API error, without retrying
    pub async fn await_token(
        &self,
        query: &ValidationQuery,
        cancel: CancelSignal,
    ) -> Result<Option<String>> {
        let policy = RetryPolicy::new(query.timeout)
            .with_initial_delay(self.initial_delay)
            .with_max_delay(self.max_delay);

        let outcome = retry_until(&policy, cancel, || self.check(query)).await;

        match outcome {
            Ok(token) => Ok(token),
            Err(RetryError::Fatal(err)) => Err(err),
            Err(RetryError::Timeout {
                timeout,
                attempts,
                last_reason,
            }) => Err(Error::Timeout {
                timeout,
                attempts,
                last_condition: last_reason,
            }),
            Err(RetryError::Cancelled {
                attempts,
                last_reason,
            }) => Err(Error::Cancelled {
                attempts,
                last_condition: last_reason,
            }),
        }
    }

    async fn check(&self, query: &ValidationQuery) -> Attempt<Option<String>, Error> {
        let id = query.certificate_id;

        info!("Retrieving certificate: ID: {}", id);
        let certificate = match self
            .api
            .get_certificate(id)
            .await
            .context("error while retrieving certificate details")
        {
            Ok(certificate) => certificate,
            Err(e) => return Attempt::Fatal(e),
        };

        info!("Retrieving certificate status: ID: {}", id);
        let status = match self
            .api
            .get_certificate_status(id)
            .await
            .context("error while retrieving certificate status")
        {
            Ok(status) => status,
            Err(e) => return Attempt::Fatal(e),
        };

        match classify(&certificate, &status) {
            TokenCheck::Rejected(reason) => Attempt::Fatal(Error::rejected(reason)),
            TokenCheck::Ready(token) => {
                debug!("DCV token available for certificate {}", id);
                Attempt::Done(Some(token))
            }
            TokenCheck::Pending(reason) if query.wait_until_available => {
                info!("{}; retrying", reason);
                Attempt::Continue(reason.to_string())
            }
            TokenCheck::Pending(reason) => {
                // The user re-reads the data source to try again.
                info!("{}; not retrying", reason);
                Attempt::Done(None)
            }
        }
    }
}

/// State of a DNS TXT token data source instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsTxtTokenData {
    /// Certificate identifier (numeric string)
    pub certificate_id: String,
    /// Keep polling while the token is pending
    pub wait_until_available: bool,
    /// Polling timeout as a duration string
    pub wait_timeout: String,
    /// Computed token value
    pub value: Option<String>,
    /// Synthetic identifier (unix seconds of the last successful read)
    pub id: Option<String>,
}

impl DnsTxtTokenData {
    /// Create data source input with default attributes
    pub fn new(certificate_id: impl Into<String>) -> Self {
        Self {
            certificate_id: certificate_id.into(),
            wait_until_available: false,
            wait_timeout: DEFAULT_WAIT_TIMEOUT.to_string(),
            value: None,
            id: None,
        }
    }

    /// Enable or disable waiting
    pub fn with_wait(mut self, wait_until_available: bool) -> Self {
        self.wait_until_available = wait_until_available;
        self
    }

    /// Set the wait timeout
    pub fn with_wait_timeout(mut self, wait_timeout: impl Into<String>) -> Self {
        self.wait_timeout = wait_timeout.into();
        self
    }

    fn query(&self) -> Result<ValidationQuery> {
        let timeout = parse_duration(&self.wait_timeout).context("invalid wait_timeout")?;
        let certificate_id = self.certificate_id.trim().parse::<i64>().map_err(|e| {
            Error::invalid_input(format!(
                "failed to parse certificate ID {:?}: {}",
                self.certificate_id, e
            ))
        })?;

        Ok(ValidationQuery {
            certificate_id,
            timeout,
            wait_until_available: self.wait_until_available,
        })
    }
}

/// The DNS TXT token data source
pub struct DnsTxtTokenDataSource {
    api: Box<dyn CertificateApi>,
    initial_delay: Duration,
    max_delay: Duration,
}

impl DnsTxtTokenDataSource {
    /// Create the data source over a certificate API client
    pub fn new(api: Box<dyn CertificateApi>) -> Self {
        let defaults = RetryPolicy::new(Duration::ZERO);
        Self {
            api,
            initial_delay: defaults.initial_delay,
            max_delay: defaults.max_delay,
        }
    }

    /// Override the polling interval schedule
    pub fn with_intervals(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }

    /// Read the token into `data`
    ///
    /// Input errors are reported before any API call. When the token is
    /// pending and waiting is disabled, `data` is left untouched.
    pub async fn read(&self, data: &mut DnsTxtTokenData, cancel: CancelSignal) -> Result<()> {
        let query = data.query()?;
        info!(
            "Reading DNS TXT token for certificate {} (wait_until_available: {}, timeout: {:?})",
            query.certificate_id, query.wait_until_available, query.timeout
        );

        let poller = TokenPoller::new(self.api.as_ref())
            .with_intervals(self.initial_delay, self.max_delay);

        if let Some(token) = poller.await_token(&query, cancel).await? {
            data.value = Some(token);
            data.id = Some(chrono::Utc::now().timestamp().to_string());
        }

        Ok(())
    }
}
