// # ec-core
//
// Core library for the Edgecast rules engine and certificate resources of an
// infrastructure-as-code provider plugin.
//
// ## Architecture Overview
//
// The host runtime owns plan/apply, state persistence and scheduling. This
// library provides the handlers it invokes:
// - **RulesEngineApi / CertificateApi**: Traits for the remote management APIs
// - **PolicyResource**: Create/read/update/delete of a rules engine policy
// - **normalize**: Canonical form of a policy for state comparison
// - **DnsTxtTokenDataSource**: Read of a certificate's DCV token
// - **TokenPoller / retry**: Bounded polling for the token
//
// ## Design Principles
//
// 1. **Separation of Concerns**: API clients live in `ec-api`, behind traits
// 2. **Single-shot clients**: Only the token poller retries, and the retry
//    driver owns the deadline and interval policy
// 3. **No shared state**: Every invocation reads fresh from the remote service

pub mod traits;
pub mod normalize;
pub mod policy;
pub mod retry;
pub mod token;
pub mod config;
pub mod error;
pub mod logging;

// Re-export core types for convenience
pub use traits::{CertificateApi, RulesEngineApi};
pub use normalize::normalize;
pub use policy::{PolicyResource, PolicyResourceData};
pub use retry::{CancelHandle, CancelSignal};
pub use token::{DnsTxtTokenData, DnsTxtTokenDataSource, TokenPoller, ValidationQuery};
pub use config::{Credentials, DeployEnvironment, Impersonation, ProviderConfig};
pub use error::{Error, Result};
