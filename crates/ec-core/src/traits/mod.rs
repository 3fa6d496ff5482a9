//! Core traits for the provider resources
//!
//! This module defines the abstract interfaces for the remote management APIs.
//!
//! - [`RulesEngineApi`]: Create, fetch and deploy rules engine policies
//! - [`CertificateApi`]: Fetch certificates and their status

pub mod rules_engine;
pub mod certificate;

pub use rules_engine::{
    AddPolicyResponse, DeployRequest, DeployResponse, RulesEngineApi, RulesEngineApiFactory,
};
pub use certificate::{
    Certificate, CertificateApi, CertificateApiFactory, CertificateStatus, DcvToken, DomainDcv,
    ValidationType,
};
