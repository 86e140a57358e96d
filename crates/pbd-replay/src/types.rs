use std::collections::BTreeMap;

use pbd_strategy::{Bar, Signal, SignalType};
use serde::Serialize;
use uuid::Uuid;

/// A bar tagged with the symbol it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayBar {
    pub symbol: String,
    pub bar: Bar,
}

/// One emitted signal, in emission order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignalRecord {
    /// 0-based position in the signal tape.
    pub seq: u64,
    pub symbol: String,
    /// Bar timestamp as delivered (RFC 3339 or naive ISO); `None` for
    /// driver-synthesized signals.
    pub timestamp: Option<String>,
    pub signal: Signal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SymbolSignalCounts {
    pub buys: u64,
    pub sells: u64,
    pub flats: u64,
}

impl SymbolSignalCounts {
    pub(crate) fn record(&mut self, kind: SignalType) {
        match kind {
            SignalType::Buy => self.buys += 1,
            SignalType::Sell => self.sells += 1,
            SignalType::Flat => self.flats += 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReplayReport {
    /// Deterministic: same strategy, config hash, and bar count give the same id.
    pub run_id: Uuid,
    pub strategy: String,
    /// Bars handed to the strategy.
    pub bars_seen: u64,
    /// Of those, bars without a timestamp (the strategy ignores them).
    pub bars_skipped: u64,
    /// Bars dropped by the symbol filter.
    pub bars_filtered: u64,
    pub signals: Vec<SignalRecord>,
    pub per_symbol: BTreeMap<String, SymbolSignalCounts>,
}
