//! Typed views over the merged config tree.

use anyhow::{Context, Result};
use pbd_strategy::{GapAndGoConfig, GAP_AND_GO_NAME};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::LoadedConfig;

/// Driver-side replay options under `/replay`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplaySettings {
    /// Only feed these symbols. Empty = all symbols in the bar file.
    pub symbols: Vec<String>,
    /// Copied into the session handed to the strategy.
    pub flatten_on_stop: bool,
}

/// `/strategy/name`, defaulting to the built-in engine.
pub fn strategy_name(cfg: &LoadedConfig) -> String {
    cfg.config_json
        .pointer("/strategy/name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(GAP_AND_GO_NAME)
        .to_string()
}

/// Engine parameters from `/strategy/gap_and_go`, with `/session/timezone`
/// applied on top. Missing section = all defaults.
pub fn gap_and_go_config(cfg: &LoadedConfig) -> Result<GapAndGoConfig> {
    let mut out: GapAndGoConfig = match cfg.config_json.pointer("/strategy/gap_and_go") {
        None | Some(Value::Null) => GapAndGoConfig::default(),
        Some(v) => serde_json::from_value(v.clone()).context("invalid /strategy/gap_and_go")?,
    };

    if let Some(tz) = cfg.config_json.pointer("/session/timezone") {
        out.timezone = tz
            .as_str()
            .context("/session/timezone must be a string")?
            .to_string();
    }

    out.validate().context("gap_and_go config rejected")?;
    Ok(out)
}

pub fn replay_settings(cfg: &LoadedConfig) -> Result<ReplaySettings> {
    match cfg.config_json.pointer("/replay") {
        None | Some(Value::Null) => Ok(ReplaySettings::default()),
        Some(v) => serde_json::from_value(v.clone()).context("invalid /replay"),
    }
}
