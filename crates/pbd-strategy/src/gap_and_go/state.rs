use std::collections::VecDeque;
use std::fmt;

use chrono::NaiveDate;

/// Where the reference price used for a market-hours bar came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceSource {
    /// Raised by a premarket high on this date.
    PremarketHigh,
    /// Stored reference established on an earlier date, carried over.
    PriorSession,
    /// Last after-hours close; used when nothing is stored.
    PreviousClose,
    /// Today's first market-hours open, locked for the rest of the date.
    FirstOpen,
}

impl ReferenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceSource::PremarketHigh => "premarket_high",
            ReferenceSource::PriorSession => "prior_session",
            ReferenceSource::PreviousClose => "previous_close",
            ReferenceSource::FirstOpen => "first_open",
        }
    }
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last `capacity` closes, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ConfirmationBuffer {
    closes: VecDeque<f64>,
    capacity: usize,
}

impl ConfirmationBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            closes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, close: f64) {
        if self.closes.len() == self.capacity {
            self.closes.pop_front();
        }
        self.closes.push_back(close);
    }

    pub(crate) fn clear(&mut self) {
        self.closes.clear();
    }

    pub(crate) fn is_full(&self) -> bool {
        self.closes.len() == self.capacity
    }

    pub(crate) fn all_at_or_above(&self, level: f64) -> bool {
        self.closes.iter().all(|c| *c >= level)
    }
}

/// Everything the engine knows about one symbol.
///
/// Only the engine mutates this; callers get read-only access through
/// [`GapAndGo::symbol_state`](super::GapAndGo::symbol_state).
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolState {
    reference_price: Option<f64>,
    reference_date: Option<NaiveDate>,
    reference_source: Option<ReferenceSource>,
    previous_close: Option<f64>,
    breakout_confirmed_today: bool,
    buffer: ConfirmationBuffer,
    in_position: bool,
    current_trading_date: Option<NaiveDate>,
}

impl SymbolState {
    pub(crate) fn new(buffer_capacity: usize) -> Self {
        Self {
            reference_price: None,
            reference_date: None,
            reference_source: None,
            previous_close: None,
            breakout_confirmed_today: false,
            buffer: ConfirmationBuffer::new(buffer_capacity),
            in_position: false,
            current_trading_date: None,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn reference_price(&self) -> Option<f64> {
        self.reference_price
    }

    /// Trading date the stored reference was established for.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }

    pub fn reference_source(&self) -> Option<ReferenceSource> {
        self.reference_source
    }

    pub fn previous_close(&self) -> Option<f64> {
        self.previous_close
    }

    pub fn breakout_confirmed_today(&self) -> bool {
        self.breakout_confirmed_today
    }

    pub fn in_position(&self) -> bool {
        self.in_position
    }

    pub fn current_trading_date(&self) -> Option<NaiveDate> {
        self.current_trading_date
    }

    /// Closes currently buffered for confirmation, oldest first.
    pub fn confirmation_closes(&self) -> Vec<f64> {
        self.buffer.closes.iter().copied().collect()
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Move to `date`. Returns `true` if this was a rollover, in which case the
    /// per-day fields were reset. The stored reference and previous close
    /// survive.
    pub(crate) fn roll_to(&mut self, date: NaiveDate) -> bool {
        if self.current_trading_date == Some(date) {
            return false;
        }
        self.current_trading_date = Some(date);
        self.breakout_confirmed_today = false;
        self.buffer.clear();
        self.in_position = false;
        true
    }

    /// Fold a premarket high into the reference: `max(stored, high)`, carried
    /// value included. Date and source only move when the level is raised.
    pub(crate) fn observe_premarket_high(&mut self, date: NaiveDate, high: f64) {
        let stored = self.reference_price.unwrap_or(f64::NEG_INFINITY);
        let raised = stored.max(high);
        if stored.is_finite() && raised <= stored {
            return;
        }
        self.reference_price = Some(raised);
        self.reference_date = Some(date);
        self.reference_source = Some(ReferenceSource::PremarketHigh);
    }

    pub(crate) fn observe_after_hours_close(&mut self, close: f64) {
        self.previous_close = Some(close);
    }

    /// Effective reference for a market-hours bar on `date`.
    ///
    /// Stored reference first, then the previous close, then `open`. Only the
    /// last case writes back, so the rest of the date reuses the same level.
    pub(crate) fn resolve_reference(&mut self, date: NaiveDate, open: f64) -> (f64, ReferenceSource) {
        if let Some(r) = self.reference_price.filter(|r| r.is_finite()) {
            let source = if self.reference_date == Some(date) {
                self.reference_source.unwrap_or(ReferenceSource::PremarketHigh)
            } else {
                ReferenceSource::PriorSession
            };
            return (r, source);
        }
        if let Some(pc) = self.previous_close {
            return (pc, ReferenceSource::PreviousClose);
        }
        self.reference_price = Some(open);
        self.reference_date = Some(date);
        self.reference_source = Some(ReferenceSource::FirstOpen);
        (open, ReferenceSource::FirstOpen)
    }

    pub(crate) fn push_close(&mut self, close: f64) {
        self.buffer.push(close);
    }

    /// Breakout predicate for the current bar against `reference`.
    pub(crate) fn is_breakout(&self, high: f64, close: f64, reference: f64, confirm_bars: u32) -> bool {
        let broke = high >= reference && close >= reference;
        if confirm_bars == 0 {
            return broke;
        }
        broke && self.buffer.is_full() && self.buffer.all_at_or_above(reference)
    }

    pub(crate) fn enter(&mut self) {
        self.breakout_confirmed_today = true;
        self.in_position = true;
    }

    pub(crate) fn exit(&mut self) {
        self.in_position = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn buffer_evicts_oldest() {
        let mut b = ConfirmationBuffer::new(2);
        b.push(1.0);
        assert!(!b.is_full());
        b.push(2.0);
        b.push(3.0);
        assert!(b.is_full());
        assert_eq!(b.closes, VecDeque::from([2.0, 3.0]));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut b = ConfirmationBuffer::new(0);
        b.push(5.0);
        assert!(b.is_full());
    }

    #[test]
    fn roll_resets_day_fields_and_keeps_reference() {
        let mut s = SymbolState::new(1);
        assert!(s.roll_to(d(8)));
        s.observe_premarket_high(d(8), 10.0);
        s.observe_after_hours_close(9.5);
        s.push_close(10.5);
        s.enter();

        assert!(!s.roll_to(d(8)));
        assert!(s.in_position());

        assert!(s.roll_to(d(9)));
        assert!(!s.in_position());
        assert!(!s.breakout_confirmed_today());
        assert!(s.confirmation_closes().is_empty());
        assert_eq!(s.reference_price(), Some(10.0));
        assert_eq!(s.previous_close(), Some(9.5));
    }

    #[test]
    fn premarket_max_folds_over_carried_reference() {
        let mut s = SymbolState::new(1);
        s.observe_premarket_high(d(8), 100.0);
        s.observe_premarket_high(d(8), 102.0);
        s.observe_premarket_high(d(8), 101.0);
        assert_eq!(s.reference_price(), Some(102.0));

        // Lower high on the next date: carried level stays, with its date.
        s.observe_premarket_high(d(9), 90.0);
        assert_eq!(s.reference_price(), Some(102.0));
        assert_eq!(s.reference_date(), Some(d(8)));
        assert_eq!(
            s.resolve_reference(d(9), 95.0),
            (102.0, ReferenceSource::PriorSession)
        );

        s.observe_premarket_high(d(9), 104.0);
        assert_eq!(s.reference_price(), Some(104.0));
        assert_eq!(s.reference_date(), Some(d(9)));
        assert_eq!(s.reference_source(), Some(ReferenceSource::PremarketHigh));
    }

    #[test]
    fn nan_high_never_replaces_finite_reference() {
        let mut s = SymbolState::new(1);
        s.observe_premarket_high(d(8), 10.0);
        s.observe_premarket_high(d(8), f64::NAN);
        assert_eq!(s.reference_price(), Some(10.0));
    }

    #[test]
    fn resolve_falls_back_in_order() {
        let mut s = SymbolState::new(1);
        s.observe_after_hours_close(20.0);
        assert_eq!(
            s.resolve_reference(d(9), 21.0),
            (20.0, ReferenceSource::PreviousClose)
        );
        assert_eq!(s.reference_price(), None);

        let mut s = SymbolState::new(1);
        assert_eq!(s.resolve_reference(d(9), 21.0), (21.0, ReferenceSource::FirstOpen));
        assert_eq!(s.resolve_reference(d(9), 30.0), (21.0, ReferenceSource::FirstOpen));
        assert_eq!(
            s.resolve_reference(d(10), 30.0),
            (21.0, ReferenceSource::PriorSession)
        );
    }

    #[test]
    fn non_finite_reference_is_ignored() {
        let mut s = SymbolState::new(1);
        s.observe_premarket_high(d(8), f64::NAN);
        s.observe_after_hours_close(7.0);
        assert_eq!(s.resolve_reference(d(8), 8.0).1, ReferenceSource::PreviousClose);
    }
}
