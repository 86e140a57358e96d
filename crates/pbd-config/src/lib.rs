//! pbd-config
//!
//! Layered YAML configuration: later documents override earlier ones, the
//! merged tree is canonicalized to JSON and hashed (SHA-256) so a run can be
//! tied to the exact configuration that produced it.
//!
//! Credentials never live in config. A string leaf that looks like a key or
//! token aborts loading with `CONFIG_SECRET_DETECTED`.

mod consumption;
mod strategy;

pub use consumption::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport, CONSUMED_PREFIXES};
pub use strategy::{gap_and_go_config, replay_settings, strategy_name, ReplaySettings};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// Leaf string prefixes that identify a pasted credential.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // OpenAI style
    "sk_live",    // Stripe live
    "AKIA",       // AWS access key ID
    "PK",         // Alpaca key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "xoxb-",      // Slack bot token
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for (i, raw) in yaml_docs.iter().enumerate() {
        let v_yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml (layer {i})"))?;
        // An empty document parses to null: treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals("", &merged)?;

    // serde_json's default map is ordered by key, so this string is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(ptr: &str, v: &Value) -> Result<()> {
    match v {
        Value::Object(map) => {
            for (k, vv) in map {
                let next = format!("{ptr}/{}", consumption::escape_pointer_token(k));
                enforce_no_secret_literals(&next, vv)?;
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                enforce_no_secret_literals(&format!("{ptr}/{i}"), vv)?;
            }
        }
        Value::String(s) if looks_like_secret(s) => {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
        _ => {}
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 16 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
