//! pbd-strategy
//!
//! Strategy framework + the gap-and-go breakout engine.
//!
//! Contract:
//! - Strategies consume one typed [`Bar`] at a time and return at most one
//!   [`Signal`]. `None` means "nothing this bar"; [`SignalType::Flat`] is an
//!   explicit flatten instruction.
//! - Lifecycle hooks: `on_start` -> `on_bar`* -> `on_stop`.
//! - [`SessionState`] is read-only context. Strategies never mutate it and
//!   never do IO.
//! - Synchronous and lock-free: one call per bar per symbol, ordered by the
//!   driver.

pub mod gap_and_go;
mod host;
mod plugin_registry;
mod types;

pub use gap_and_go::{
    ConfigError, ExitReason, GapAndGo, GapAndGoConfig, ReferenceSource, SymbolState,
    GAP_AND_GO_NAME, GAP_AND_GO_TIMEFRAME_SECS,
};
pub use host::*;
pub use plugin_registry::*;
pub use types::*;
