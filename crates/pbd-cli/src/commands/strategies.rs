use anyhow::Result;
use pbd_strategy::{builtin_registry, GapAndGoConfig};

/// `pbd strategies`: one line per registered strategy.
pub fn list() -> Result<()> {
    let registry = builtin_registry(GapAndGoConfig::default())?;
    for meta in registry.list() {
        println!(
            "name={} version={} timeframe_secs={} description=\"{}\"",
            meta.name, meta.version, meta.timeframe_secs, meta.description
        );
    }
    Ok(())
}
