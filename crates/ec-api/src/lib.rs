// # ec-api
//
// HTTP implementations of the `ec-core` API traits against the Edgecast
// management API.
//
// - `HttpRulesEngineClient`: rules engine policies and deploy requests
// - `HttpCertificateClient`: CPS certificate details and status
//
// ## Behavior
//
// - One HTTP request per trait call, plus a token request when using
//   client credentials (tokens are not cached)
// - No retries. Polling is owned by `ec_core::token::TokenPoller`
// - HTTP status codes map to `ec_core::Error` variants:
//   401/403 authentication, 404 not found, 429 rate limited,
//   5xx transient server error, anything else an API error with the body
//
// ## Security
//
// Client secrets and access tokens never appear in logs or `Debug` output.

pub mod auth;
pub mod certificate;
mod response;
pub mod rules_engine;

pub use auth::Authenticator;
pub use certificate::{CertificateClientFactory, HttpCertificateClient};
pub use rules_engine::{HttpRulesEngineClient, RulesEngineClientFactory};
