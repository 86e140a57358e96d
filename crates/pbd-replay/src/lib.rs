//! pbd-replay
//!
//! Historical bar replay: a CSV bar source plus the thinnest session driver
//! that honours the strategy lifecycle (`start`, one `on_bar` per bar in file
//! order, `stop`). No fills, no portfolio; the output is the signal tape.

mod driver;
pub mod loader;
mod types;

pub use driver::*;
pub use loader::{load_csv_file, parse_csv_bars, LoadError};
pub use types::*;
