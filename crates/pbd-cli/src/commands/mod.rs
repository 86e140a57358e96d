//! Command handlers for `pbd`.
//!
//! Shared config loading lives here; command-specific logic lives in the
//! submodules.

pub mod replay;
pub mod strategies;

use anyhow::{Context, Result};
use pbd_config::{LoadedConfig, UnusedKeyPolicy};
use tracing::warn;

/// Load layered config and run the unused-key guard over it.
pub fn load_config(paths: &[String], strict: bool) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = pbd_config::load_layered_yaml(&path_refs).context("config load failed")?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = pbd_config::report_unused_keys(&loaded.config_json, policy)?;
    for ptr in &report.unused_leaf_pointers {
        warn!(pointer = %ptr, "unused config key");
    }

    Ok(loaded)
}
