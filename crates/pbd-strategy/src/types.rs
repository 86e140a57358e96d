use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use pbd_session::Timestamp as BarTimestamp;

/// Strategy identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySpec {
    pub name: String,
    /// Bar interval the strategy is written for.
    pub timeframe_secs: i64,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>, timeframe_secs: i64) -> Self {
        debug_assert!(timeframe_secs > 0);
        Self {
            name: name.into(),
            timeframe_secs,
        }
    }
}

/// One OHLCV sample. OHLC consistency is the bar source's job and is not
/// re-checked here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    /// `None` when the source could not attach a time; strategies skip such bars.
    pub timestamp: Option<BarTimestamp>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(
        timestamp: impl Into<BarTimestamp>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A bar with no timestamp.
    pub fn untimed(open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            timestamp: None,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
    /// Close any open exposure for the symbol.
    Flat,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Buy => "BUY",
            SignalType::Sell => "SELL",
            SignalType::Flat => "FLAT",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trading instruction for the execution layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalType,
    /// Stop-loss distance in percent of entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl_pct: Option<f64>,
    /// Take-profit distance in percent of entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_pct: Option<f64>,
    /// Free-form diagnostics. Never read back by the engine.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl Signal {
    pub fn new(kind: SignalType) -> Self {
        Self {
            kind,
            sl_pct: None,
            tp_pct: None,
            meta: BTreeMap::new(),
        }
    }

    pub fn buy() -> Self {
        Self::new(SignalType::Buy)
    }

    pub fn sell() -> Self {
        Self::new(SignalType::Sell)
    }

    pub fn flat() -> Self {
        Self::new(SignalType::Flat)
    }

    pub fn with_stops(mut self, sl_pct: Option<f64>, tp_pct: Option<f64>) -> Self {
        self.sl_pct = sl_pct;
        self.tp_pct = tp_pct;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    pub fn meta_f64(&self, key: &str) -> Option<f64> {
        self.meta.get(key).and_then(Value::as_f64)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Live,
    #[default]
    Backtest,
}

/// Run context handed to every lifecycle hook.
///
/// Owned by the session driver. Strategies only ever see `&SessionState`;
/// intent flows back exclusively through the returned [`Signal`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub run_mode: RunMode,
    /// `"paper"` | `"live"` once a broker connection is chosen.
    pub connection_mode: Option<String>,
    pub started: bool,
    /// Honoured by the driver (it withholds bars); strategies ignore it.
    pub paused: bool,
    pub should_stop: bool,
    pub flatten_on_stop: bool,

    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub last_pl_update: Option<DateTime<Utc>>,

    pub stats: BTreeMap<String, Value>,
}

impl SessionState {
    pub fn backtest() -> Self {
        Self::default()
    }

    pub fn live(connection_mode: impl Into<String>) -> Self {
        Self {
            run_mode: RunMode::Live,
            connection_mode: Some(connection_mode.into()),
            ..Self::default()
        }
    }
}

/// Strategy lifecycle contract.
///
/// `on_bar` must be a pure function of the strategy's own state and its
/// inputs: no IO, no locks, no spawned work. `on_stop` must be idempotent and
/// safe to call without a prior `on_start`.
pub trait Strategy: Send + Sync {
    fn spec(&self) -> StrategySpec;

    /// Reset all internal state. Called once before the first bar.
    fn on_start(&mut self, session: &SessionState);

    /// Single per-bar decision point.
    fn on_bar(&mut self, symbol: &str, bar: &Bar, session: &SessionState) -> Option<Signal>;

    /// Release/flush. Called after the last bar or on early termination.
    fn on_stop(&mut self, session: &SessionState);
}
