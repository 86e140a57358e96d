//! Plugin registry: named catalogue of strategy factories.
//!
//! [`StrategyHost`](crate::StrategyHost) runs one *active* strategy. The
//! registry is the step before that: it lists what *can* be run, so a driver
//! (CLI, live session) can pick a strategy by name from configuration and get
//! a fresh instance without knowing its concrete type.
//!
//! Each `instantiate` call produces a new instance. Per-symbol state must never
//! leak from one run into the next.

use std::fmt;

use crate::gap_and_go::{
    ConfigError, GapAndGo, GapAndGoConfig, GAP_AND_GO_NAME, GAP_AND_GO_TIMEFRAME_SECS,
};
use crate::Strategy;

/// Thread-safe factory producing a fresh strategy instance.
pub type StrategyFactory = Box<dyn Fn() -> Box<dyn Strategy> + Send + Sync>;

/// Static metadata, queryable without instantiating the strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyMeta {
    /// Registry key. ASCII, non-empty.
    pub name: String,
    pub version: String,
    pub timeframe_secs: i64,
    pub description: String,
}

impl StrategyMeta {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        timeframe_secs: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            timeframe_secs,
            description: description.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName { name: String },
    UnknownStrategy { name: String, available: Vec<String> },
    EmptyName,
    /// Metadata and the instantiated strategy's spec disagree on timeframe.
    TimeframeMismatch {
        name: String,
        meta_secs: i64,
        spec_secs: i64,
    },
    /// A built-in strategy's configuration failed validation.
    InvalidConfig { name: String, reason: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateName { name } => {
                write!(f, "strategy '{name}' is already registered")
            }
            RegistryError::UnknownStrategy { name, available } => write!(
                f,
                "unknown strategy '{name}'. available: {}",
                available.join(", ")
            ),
            RegistryError::EmptyName => write!(f, "strategy name must not be empty"),
            RegistryError::TimeframeMismatch {
                name,
                meta_secs,
                spec_secs,
            } => write!(
                f,
                "strategy '{name}': metadata timeframe {meta_secs}s != spec timeframe {spec_secs}s"
            ),
            RegistryError::InvalidConfig { name, reason } => {
                write!(f, "strategy '{name}': invalid config: {reason}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

struct RegistryEntry {
    meta: StrategyMeta,
    factory: StrategyFactory,
}

/// Insertion-ordered catalogue. Names are case-sensitive.
pub struct PluginRegistry {
    entries: Vec<RegistryEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, meta: StrategyMeta, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        if meta.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(&meta.name) {
            return Err(RegistryError::DuplicateName { name: meta.name });
        }
        self.entries.push(RegistryEntry {
            meta,
            factory: Box::new(factory),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.meta.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list(&self) -> Vec<&StrategyMeta> {
        self.entries.iter().map(|e| &e.meta).collect()
    }

    pub fn lookup(&self, name: &str) -> Result<&StrategyMeta, RegistryError> {
        self.entry(name).map(|e| &e.meta)
    }

    /// Fresh instance of the named strategy.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Strategy>, RegistryError> {
        self.entry(name).map(|e| (e.factory)())
    }

    /// Like [`instantiate`](Self::instantiate), but also checks the instance's
    /// spec against the registered metadata.
    pub fn instantiate_verified(&self, name: &str) -> Result<Box<dyn Strategy>, RegistryError> {
        let entry = self.entry(name)?;
        let strategy = (entry.factory)();
        let spec_secs = strategy.spec().timeframe_secs;
        if spec_secs != entry.meta.timeframe_secs {
            return Err(RegistryError::TimeframeMismatch {
                name: name.to_string(),
                meta_secs: entry.meta.timeframe_secs,
                spec_secs,
            });
        }
        Ok(strategy)
    }

    fn entry(&self, name: &str) -> Result<&RegistryEntry, RegistryError> {
        self.entries
            .iter()
            .find(|e| e.meta.name == name)
            .ok_or_else(|| RegistryError::UnknownStrategy {
                name: name.to_string(),
                available: self.entries.iter().map(|e| e.meta.name.clone()).collect(),
            })
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry pre-loaded with every strategy shipped in this crate.
///
/// `cfg` is validated once here; every `gap_and_go` instance is then built
/// from a clone of it and the clock it resolved to.
pub fn builtin_registry(cfg: GapAndGoConfig) -> Result<PluginRegistry, RegistryError> {
    let invalid = |e: ConfigError| RegistryError::InvalidConfig {
        name: GAP_AND_GO_NAME.to_string(),
        reason: e.to_string(),
    };
    cfg.validate().map_err(invalid)?;
    let clock = cfg.clock().map_err(|e| invalid(e.into()))?;

    let mut reg = PluginRegistry::new();
    let meta = StrategyMeta::new(
        GAP_AND_GO_NAME,
        env!("CARGO_PKG_VERSION"),
        GAP_AND_GO_TIMEFRAME_SECS,
        "premarket-high breakout with time-boxed entry and time-of-day exit",
    );
    reg.register(meta, move || Box::new(GapAndGo::with_clock(cfg.clone(), clock)))?;
    Ok(reg)
}
