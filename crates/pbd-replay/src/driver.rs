use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use pbd_strategy::{SessionState, Signal, SignalType, StrategyHost, StrategyHostError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{ReplayBar, ReplayReport, SignalRecord, SymbolSignalCounts};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayError {
    Host(StrategyHostError),
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Host(e) => write!(f, "strategy host: {e}"),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Host(e) => Some(e),
        }
    }
}

impl From<StrategyHostError> for ReplayError {
    fn from(e: StrategyHostError) -> Self {
        ReplayError::Host(e)
    }
}

/// Feeds a bar tape through a [`StrategyHost`] and records every signal.
///
/// The driver owns the [`SessionState`]: it flips `started` around the run
/// and, when `flatten_on_stop` is set, appends a FLAT for every symbol whose
/// last signal left it long.
pub struct ReplayDriver {
    host: StrategyHost,
    session: SessionState,
    config_hash: String,
    symbols: BTreeSet<String>,
}

impl ReplayDriver {
    pub fn new(host: StrategyHost, session: SessionState) -> Self {
        Self {
            host,
            session,
            config_hash: String::new(),
            symbols: BTreeSet::new(),
        }
    }

    /// Mixed into the run id.
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Only bars for these symbols reach the strategy. Empty = no filter.
    pub fn with_symbol_filter<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn run(&mut self, bars: &[ReplayBar]) -> Result<ReplayReport, ReplayError> {
        let strategy = self.host.spec()?.name;
        let run_id = derive_run_id(&strategy, &self.config_hash, bars.len());
        info!(%run_id, strategy = %strategy, bars = bars.len(), "replay start");

        self.host.start(&self.session)?;
        self.session.started = true;

        let mut signals: Vec<SignalRecord> = Vec::new();
        let mut per_symbol: BTreeMap<String, SymbolSignalCounts> = BTreeMap::new();
        let mut long: BTreeSet<String> = BTreeSet::new();
        let mut bars_seen = 0u64;
        let mut bars_skipped = 0u64;
        let mut bars_filtered = 0u64;

        for rb in bars {
            if !self.symbols.is_empty() && !self.symbols.contains(&rb.symbol) {
                bars_filtered += 1;
                continue;
            }
            bars_seen += 1;
            if rb.bar.timestamp.is_none() {
                bars_skipped += 1;
            }

            let Some(signal) = self.host.on_bar(&rb.symbol, &rb.bar, &self.session)? else {
                continue;
            };
            debug!(symbol = %rb.symbol, kind = %signal.kind, "signal");
            match signal.kind {
                SignalType::Buy => {
                    long.insert(rb.symbol.clone());
                }
                SignalType::Sell | SignalType::Flat => {
                    long.remove(&rb.symbol);
                }
            }
            push_record(
                &mut signals,
                &mut per_symbol,
                &rb.symbol,
                rb.bar.timestamp.map(|t| t.to_string()),
                signal,
            );
        }

        if self.session.flatten_on_stop {
            for symbol in long {
                let flat = Signal::flat().with_meta("reason", "flatten_on_stop");
                push_record(&mut signals, &mut per_symbol, &symbol, None, flat);
            }
        }

        self.host.stop(&self.session)?;
        self.session.started = false;

        info!(%run_id, bars_seen, bars_skipped, signals = signals.len(), "replay done");
        Ok(ReplayReport {
            run_id,
            strategy,
            bars_seen,
            bars_skipped,
            bars_filtered,
            signals,
            per_symbol,
        })
    }
}

fn push_record(
    signals: &mut Vec<SignalRecord>,
    per_symbol: &mut BTreeMap<String, SymbolSignalCounts>,
    symbol: &str,
    timestamp: Option<String>,
    signal: Signal,
) {
    per_symbol
        .entry(symbol.to_string())
        .or_default()
        .record(signal.kind);
    signals.push(SignalRecord {
        seq: signals.len() as u64,
        symbol: symbol.to_string(),
        timestamp,
        signal,
    });
}

/// UUIDv5 over the run's identifying inputs. No clock, no RNG.
pub fn derive_run_id(strategy: &str, config_hash: &str, bar_count: usize) -> Uuid {
    let data = format!("pbd-replay.run.v1|{strategy}|{config_hash}|{bar_count}");
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, data.as_bytes())
}
