use std::collections::BTreeMap;

use pbd_session::{Phase, SessionClock, SessionInstant};
use tracing::{debug, info, trace};

use super::config::{ConfigError, ExitReason, GapAndGoConfig};
use super::state::{ReferenceSource, SymbolState};
use crate::{Bar, SessionState, Signal, Strategy, StrategySpec};

/// Registry name of the engine.
pub const GAP_AND_GO_NAME: &str = "gap_and_go";
/// The engine is written for one-minute bars.
pub const GAP_AND_GO_TIMEFRAME_SECS: i64 = 60;

/// Premarket-high breakout engine.
///
/// Per bar: localize into the reference zone, roll the symbol's day if the
/// trading date changed, then act by phase:
///
/// - premarket: raise the reference
/// - after-hours: remember the close
/// - market hours: exit by active policy, or enter once per date inside the
///   cutoff window
pub struct GapAndGo {
    cfg: GapAndGoConfig,
    clock: SessionClock,
    states: BTreeMap<String, SymbolState>,
}

impl GapAndGo {
    pub fn new(cfg: GapAndGoConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let clock = cfg.clock()?;
        Ok(Self::with_clock(cfg, clock))
    }

    /// `cfg` must already have passed `validate`; `clock` is its zone.
    pub(crate) fn with_clock(cfg: GapAndGoConfig, clock: SessionClock) -> Self {
        Self {
            cfg,
            clock,
            states: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &GapAndGoConfig {
        &self.cfg
    }

    pub fn symbol_state(&self, symbol: &str) -> Option<&SymbolState> {
        self.states.get(symbol)
    }

    pub fn tracked_symbols(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    fn market_bar(
        cfg: &GapAndGoConfig,
        st: &mut SymbolState,
        symbol: &str,
        bar: &Bar,
        at: &SessionInstant,
    ) -> Option<Signal> {
        let date = at.trading_date();
        let (reference, source) = st.resolve_reference(date, bar.open);
        if source != ReferenceSource::PremarketHigh {
            debug!(symbol, reference, source = %source, "reference fallback");
        }

        if st.in_position() {
            let reason = Self::exit_reason(cfg, bar, at, reference)?;
            st.exit();
            info!(symbol, reference, reason = %reason, close = bar.close, "SELL");
            return Some(
                Signal::sell()
                    .with_meta("exit_reason", reason.as_str())
                    .with_meta("trading_date", date.to_string()),
            );
        }

        let minutes = at.minutes_since_open();
        if minutes > i64::from(cfg.trade_cutoff_minute) || st.breakout_confirmed_today() {
            return None;
        }

        st.push_close(bar.close);
        if !st.is_breakout(bar.high, bar.close, reference, cfg.confirm_bars) {
            return None;
        }

        st.enter();
        info!(symbol, reference, source = %source, close = bar.close, minutes, "BUY");

        let mut sig = Signal::buy()
            .with_stops(cfg.stop_loss_pct, cfg.take_profit_pct)
            .with_meta("reference_price", reference)
            .with_meta("reference_source", source.as_str())
            .with_meta("confirm_bars", cfg.confirm_bars)
            .with_meta("minutes_since_open", minutes)
            .with_meta("trading_date", date.to_string());
        if let Some(pc) = st.previous_close().filter(|pc| *pc > 0.0) {
            sig = sig.with_meta("gap_pct", (bar.open - pc) / pc * 100.0);
        }
        Some(sig)
    }

    /// First active exit rule that fires, time-of-day taking precedence.
    fn exit_reason(
        cfg: &GapAndGoConfig,
        bar: &Bar,
        at: &SessionInstant,
        reference: f64,
    ) -> Option<ExitReason> {
        if cfg.exits_on(ExitReason::TimeOfDay) && at.is_at_or_after(cfg.exit_hour, cfg.exit_minute)
        {
            return Some(ExitReason::TimeOfDay);
        }
        if cfg.exits_on(ExitReason::GapFill) && bar.close < reference * (1.0 - cfg.gap_fill_pct / 100.0)
        {
            return Some(ExitReason::GapFill);
        }
        None
    }
}

impl Default for GapAndGo {
    fn default() -> Self {
        Self::with_clock(GapAndGoConfig::default(), SessionClock::new_york())
    }
}

impl Strategy for GapAndGo {
    fn spec(&self) -> StrategySpec {
        StrategySpec::new(GAP_AND_GO_NAME, GAP_AND_GO_TIMEFRAME_SECS)
    }

    fn on_start(&mut self, _session: &SessionState) {
        self.states.clear();
    }

    fn on_bar(&mut self, symbol: &str, bar: &Bar, _session: &SessionState) -> Option<Signal> {
        let Some(ts) = bar.timestamp.as_ref() else {
            trace!(symbol, "bar without timestamp skipped");
            return None;
        };
        let at = self.clock.localize(ts);
        let date = at.trading_date();

        let capacity = self.cfg.buffer_capacity();
        let st = self
            .states
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolState::new(capacity));

        if st.roll_to(date) {
            debug!(symbol, %date, reference = ?st.reference_price(), "daily reset");
        }

        match at.phase() {
            Phase::Premarket => {
                st.observe_premarket_high(date, bar.high);
                None
            }
            Phase::AfterHours => {
                st.observe_after_hours_close(bar.close);
                None
            }
            Phase::MarketHours => Self::market_bar(&self.cfg, st, symbol, bar, &at),
        }
    }

    fn on_stop(&mut self, _session: &SessionState) {
        self.states.clear();
    }
}
