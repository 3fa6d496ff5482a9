//! Test doubles and common utilities for contract tests
//!
//! These doubles stand in for the remote management APIs. They record every
//! call so tests can assert on what the handlers sent.

#![allow(dead_code)]

use ec_core::config::Impersonation;
use ec_core::error::{Error, Result};
use ec_core::traits::{
    AddPolicyResponse, Certificate, CertificateApi, CertificateStatus, DcvToken, DeployRequest,
    DeployResponse, DomainDcv, RulesEngineApi, ValidationType,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An in-memory rules engine that decorates stored policies the way the
/// service does (ids, types, ordinals, timestamps)
pub struct MockRulesEngine {
    /// Stored policies by id
    policies: Arc<Mutex<HashMap<i64, Value>>>,
    /// Submitted policy bodies, in order
    added: Arc<Mutex<Vec<String>>>,
    /// Deploy requests, in order
    deploys: Arc<Mutex<Vec<DeployRequest>>>,
    /// Impersonation seen on every call
    impersonations: Arc<Mutex<Vec<Impersonation>>>,
    /// Call counter for get_policy()
    get_call_count: Arc<AtomicUsize>,
    /// Make deploy_policy() fail
    fail_deploy: Arc<AtomicBool>,
    /// Make get_policy() fail
    fail_get: Arc<AtomicBool>,
}

impl MockRulesEngine {
    pub fn new() -> Self {
        Self {
            policies: Arc::new(Mutex::new(HashMap::new())),
            added: Arc::new(Mutex::new(Vec::new())),
            deploys: Arc::new(Mutex::new(Vec::new())),
            impersonations: Arc::new(Mutex::new(Vec::new())),
            get_call_count: Arc::new(AtomicUsize::new(0)),
            fail_deploy: Arc::new(AtomicBool::new(false)),
            fail_get: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new MockRulesEngine that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            policies: Arc::clone(&other.policies),
            added: Arc::clone(&other.added),
            deploys: Arc::clone(&other.deploys),
            impersonations: Arc::clone(&other.impersonations),
            get_call_count: Arc::clone(&other.get_call_count),
            fail_deploy: Arc::clone(&other.fail_deploy),
            fail_get: Arc::clone(&other.fail_get),
        }
    }

    /// Store a policy as if it had been created earlier
    pub fn seed(&self, id: i64, policy: Value) {
        self.policies.lock().unwrap().insert(id, policy);
    }

    pub fn added(&self) -> Vec<Value> {
        self.added
            .lock()
            .unwrap()
            .iter()
            .map(|body| serde_json::from_str(body).unwrap())
            .collect()
    }

    pub fn deploys(&self) -> Vec<DeployRequest> {
        self.deploys.lock().unwrap().clone()
    }

    pub fn impersonations(&self) -> Vec<Impersonation> {
        self.impersonations.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    pub fn set_fail_deploy(&self, fail: bool) {
        self.fail_deploy.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }
}

/// Add server metadata to a submitted policy
pub fn decorate(id: i64, mut policy: Value) -> Value {
    let obj = policy.as_object_mut().unwrap();
    obj.insert("id".into(), json!(id.to_string()));
    obj.insert("@id".into(), json!(format!("/policies/{}", id)));
    obj.insert("@type".into(), json!("Policy"));
    obj.insert("policy_type".into(), json!("rules-engine"));
    obj.insert("state".into(), json!("locked"));
    obj.insert("history".into(), json!([]));
    obj.insert("created_at".into(), json!("2026-01-01T00:00:00Z"));
    obj.insert("updated_at".into(), json!("2026-01-01T00:00:00Z"));

    if let Some(Value::Array(rules)) = obj.get_mut("rules") {
        for (i, rule) in rules.iter_mut().enumerate() {
            let rule = rule.as_object_mut().unwrap();
            rule.insert("id".into(), json!(format!("{}", 1000 + i)));
            rule.insert("@id".into(), json!(format!("/rules/{}", 1000 + i)));
            rule.insert("@type".into(), json!("Rule"));
            rule.insert("ordinal".into(), json!(i + 1));
            rule.insert("policy_type".into(), json!("rules-engine"));
            rule.insert("state".into(), json!("locked"));
            rule.insert("history".into(), json!([]));
            rule.insert("created_at".into(), json!("2026-01-01T00:00:00Z"));
            rule.insert("updated_at".into(), json!("2026-01-01T00:00:00Z"));
            if let Some(Value::Array(matches)) = rule.get_mut("matches") {
                add_ordinals(matches);
            }
        }
    }

    policy
}

fn add_ordinals(matches: &mut [Value]) {
    for (i, m) in matches.iter_mut().enumerate() {
        let m = m.as_object_mut().unwrap();
        m.insert("ordinal".into(), json!(i + 1));
        if let Some(Value::Array(children)) = m.get_mut("matches") {
            add_ordinals(children);
        }
        if let Some(Value::Array(features)) = m.get_mut("features") {
            for (j, f) in features.iter_mut().enumerate() {
                f.as_object_mut()
                    .unwrap()
                    .insert("ordinal".into(), json!(j + 1));
            }
        }
    }
}

#[async_trait::async_trait]
impl RulesEngineApi for MockRulesEngine {
    async fn add_policy(
        &self,
        policy: &str,
        impersonation: &Impersonation,
    ) -> Result<AddPolicyResponse> {
        self.impersonations
            .lock()
            .unwrap()
            .push(impersonation.clone());
        self.added.lock().unwrap().push(policy.to_string());

        let mut policies = self.policies.lock().unwrap();
        let id = 100 + policies.len() as i64;
        let parsed: Value = serde_json::from_str(policy)?;
        policies.insert(id, decorate(id, parsed));

        Ok(AddPolicyResponse { id: id.to_string() })
    }

    async fn get_policy(&self, policy_id: i64, impersonation: &Impersonation) -> Result<Value> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        self.impersonations
            .lock()
            .unwrap()
            .push(impersonation.clone());

        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Error::http("connection reset"));
        }

        self.policies
            .lock()
            .unwrap()
            .get(&policy_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("policy {}", policy_id)))
    }

    async fn deploy_policy(
        &self,
        request: &DeployRequest,
        impersonation: &Impersonation,
    ) -> Result<DeployResponse> {
        self.impersonations
            .lock()
            .unwrap()
            .push(impersonation.clone());

        if self.fail_deploy.load(Ordering::SeqCst) {
            return Err(Error::api("mock-rules-engine", "deploy rejected"));
        }

        let mut deploys = self.deploys.lock().unwrap();
        deploys.push(request.clone());

        Ok(DeployResponse {
            id: format!("dr-{}", deploys.len()),
            state: Some("pending".to_string()),
        })
    }

    fn service_name(&self) -> &'static str {
        "mock-rules-engine"
    }
}

/// What a scripted certificate API returns
#[derive(Clone)]
pub enum CertificateScript {
    /// Always return this certificate and status
    Fixed(Certificate, CertificateStatus),
    /// Return a tokenless certificate until the nth check (1-based), then the token
    ReadyOnCheck(usize, String),
    /// Fail the certificate read
    FailCertificate,
    /// Fail the status read
    FailStatus,
}

/// A certificate API that follows a script and counts calls
pub struct ScriptedCertificateApi {
    script: CertificateScript,
    /// Call counter for get_certificate()
    certificate_call_count: Arc<AtomicUsize>,
    /// Call counter for get_certificate_status()
    status_call_count: Arc<AtomicUsize>,
}

impl ScriptedCertificateApi {
    pub fn new(script: CertificateScript) -> Self {
        Self {
            script,
            certificate_call_count: Arc::new(AtomicUsize::new(0)),
            status_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new ScriptedCertificateApi that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: other.script.clone(),
            certificate_call_count: Arc::clone(&other.certificate_call_count),
            status_call_count: Arc::clone(&other.status_call_count),
        }
    }

    pub fn certificate_call_count(&self) -> usize {
        self.certificate_call_count.load(Ordering::SeqCst)
    }

    pub fn status_call_count(&self) -> usize {
        self.status_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CertificateApi for ScriptedCertificateApi {
    async fn get_certificate(&self, certificate_id: i64) -> Result<Certificate> {
        let call = self.certificate_call_count.fetch_add(1, Ordering::SeqCst) + 1;

        match &self.script {
            CertificateScript::Fixed(cert, _) => Ok(cert.clone()),
            CertificateScript::ReadyOnCheck(n, token) => {
                if call >= *n {
                    Ok(dv_certificate(certificate_id, Some(token.as_str())))
                } else {
                    Ok(dv_certificate(certificate_id, None))
                }
            }
            CertificateScript::FailCertificate => Err(Error::http("connection refused")),
            CertificateScript::FailStatus => Ok(dv_certificate(certificate_id, Some("XYZ"))),
        }
    }

    async fn get_certificate_status(&self, _certificate_id: i64) -> Result<CertificateStatus> {
        self.status_call_count.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            CertificateScript::Fixed(_, status) => Ok(status.clone()),
            CertificateScript::FailStatus => Err(Error::http("connection refused")),
            _ => Ok(status("Active")),
        }
    }

    fn service_name(&self) -> &'static str {
        "scripted-cps"
    }
}

/// A DV certificate with one domain
pub fn dv_certificate(id: i64, token: Option<&str>) -> Certificate {
    Certificate {
        id,
        validation_type: ValidationType::Dv,
        workflow_error_message: None,
        domains: vec![DomainDcv {
            name: "example.com".to_string(),
            dcv_token: token.map(|t| DcvToken {
                token: t.to_string(),
            }),
        }],
    }
}

pub fn status(s: &str) -> CertificateStatus {
    CertificateStatus {
        status: s.to_string(),
    }
}
