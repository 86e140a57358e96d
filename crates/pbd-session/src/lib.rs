//! pbd-session
//!
//! Trading-session classifier for intraday equities.
//!
//! Pure logic. No IO, no wall-clock, no process-wide timezone state: the
//! reference zone is an explicit value carried by [`SessionClock`], so two
//! clocks with different calendars can live side by side in one process.

mod calendar;

pub use calendar::*;
