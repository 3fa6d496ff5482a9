//! Policy normalization
//!
//! Produces the canonical form of a rules engine policy used for state
//! storage and for comparing desired against observed state.
//!
//! ## What changes
//!
//! - Server-assigned metadata is removed from the policy root and from each
//!   rule; `ordinal` is removed from every match and feature.
//! - Match and feature keys have every `-` replaced with `_`.
//! - Match and feature values that are non-empty arrays made only of strings
//!   become a single space-joined string. Empty arrays are deliberately kept
//!   as arrays so the shape of the tree never changes.
//!
//! Everything else, including the nesting of matches within matches and the
//! order of every list, is preserved.
//!
//! ## Single application
//!
//! Normalizing a normalized document is a no-op. Joining is not reversible
//! though: a value that was already joined upstream cannot be told apart from
//! a plain string. Callers normalize raw input exactly once and never feed
//! joined output back in as raw input.

use serde_json::{Map, Value};

/// Keys assigned by the service at the policy root
pub const POLICY_METADATA_KEYS: &[&str] = &[
    "id",
    "@id",
    "@type",
    "policy_type",
    "state",
    "history",
    "created_at",
    "updated_at",
];

/// Keys assigned by the service on each rule
pub const RULE_METADATA_KEYS: &[&str] = &[
    "id",
    "@id",
    "@type",
    "ordinal",
    "policy_type",
    "state",
    "history",
    "created_at",
    "updated_at",
];

/// Key assigned by the service on each match and feature
pub const ORDINAL_KEY: &str = "ordinal";

const RULES_KEY: &str = "rules";
const MATCHES_KEY: &str = "matches";
const FEATURES_KEY: &str = "features";

/// Normalize a policy document
///
/// A non-object document is returned unchanged. Missing `rules`, `matches`
/// or `features` lists are left missing.
pub fn normalize(doc: Value) -> Value {
    match doc {
        Value::Object(policy) => Value::Object(normalize_policy(policy)),
        other => other,
    }
}

/// Normalize the root object of a policy document
pub fn normalize_policy(mut policy: Map<String, Value>) -> Map<String, Value> {
    strip(&mut policy, POLICY_METADATA_KEYS);

    if let Some(Value::Array(rules)) = policy.get_mut(RULES_KEY) {
        let taken = std::mem::take(rules);
        *rules = taken.into_iter().map(normalize_rule).collect();
    }

    policy
}

fn normalize_rule(rule: Value) -> Value {
    let Value::Object(mut rule) = rule else {
        return rule;
    };

    strip(&mut rule, RULE_METADATA_KEYS);

    if let Some(Value::Array(matches)) = rule.get_mut(MATCHES_KEY) {
        let taken = std::mem::take(matches);
        *matches = normalize_matches(taken);
    }

    Value::Object(rule)
}

/// Normalize a list of matches, recursing into nested matches
pub fn normalize_matches(matches: Vec<Value>) -> Vec<Value> {
    matches
        .into_iter()
        .map(|m| match m {
            Value::Object(m) => Value::Object(normalize_match(m)),
            other => other,
        })
        .collect()
}

fn normalize_match(mut m: Map<String, Value>) -> Map<String, Value> {
    m.remove(ORDINAL_KEY);
    let mut m = standardize(m);

    if let Some(Value::Array(children)) = m.get_mut(MATCHES_KEY) {
        let taken = std::mem::take(children);
        *children = normalize_matches(taken);
    }

    if let Some(Value::Array(features)) = m.get_mut(FEATURES_KEY) {
        for feature in features.iter_mut() {
            if let Value::Object(f) = feature {
                let taken = std::mem::take(f);
                *f = normalize_feature(taken);
            }
        }
    }

    m
}

fn normalize_feature(mut feature: Map<String, Value>) -> Map<String, Value> {
    feature.remove(ORDINAL_KEY);
    standardize(feature)
}

/// Standardize the keys and values of a match or feature object
///
/// Builds a new map: every `-` in a key becomes `_`, and an array value whose
/// elements are all strings becomes those strings joined by single spaces.
/// Any other value, including an array holding a non-string element, is kept
/// as-is. Keys are visited in map order, so if two keys collide after
/// replacement the later one wins.
pub fn standardize(object: Map<String, Value>) -> Map<String, Value> {
    object
        .into_iter()
        .map(|(key, value)| (key.replace('-', "_"), join_string_array(value)))
        .collect()
}

fn join_string_array(value: Value) -> Value {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let joined: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            match joined {
                Some(parts) => Value::String(parts.join(" ")),
                None => Value::Array(items),
            }
        }
        other => other,
    }
}

fn strip(object: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        object.remove(*key);
    }
}
