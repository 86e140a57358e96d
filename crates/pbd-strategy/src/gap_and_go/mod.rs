//! Gap-and-go: enter on a break of the premarket high in the first minutes
//! after the open, exit by time of day (and optionally on a gap fill).
//!
//! Reference price, per symbol and trading date:
//! 1. running max of today's premarket highs;
//! 2. otherwise the stored reference carried over from an earlier date;
//! 3. otherwise the last after-hours close;
//! 4. otherwise the first market-hours open, locked for the date.
//!
//! Bars must arrive in non-decreasing time order per symbol. Out-of-order
//! input is not detected.

mod config;
mod engine;
mod state;

pub use config::{ConfigError, ExitReason, GapAndGoConfig};
pub use engine::{GapAndGo, GAP_AND_GO_NAME, GAP_AND_GO_TIMEFRAME_SECS};
pub use state::{ReferenceSource, SymbolState};
