use std::collections::BTreeSet;
use std::fmt;

use pbd_session::{SessionClock, SessionError, DEFAULT_TZ_NAME};
use serde::{Deserialize, Serialize};

/// Named exit rule. The engine consults only the rules present in
/// [`GapAndGoConfig::exit_policies`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Local time reached `exit_hour:exit_minute`.
    TimeOfDay,
    /// Close fell `gap_fill_pct` percent below the reference.
    GapFill,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TimeOfDay => "time_of_day",
            ExitReason::GapFill => "gap_fill",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine parameters. Every field has a default, so a partial YAML block is
/// a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GapAndGoConfig {
    /// Accepted for compatibility; not consulted by the breakout predicate.
    pub min_gap_pct: f64,
    /// Accepted for compatibility; not consulted by the breakout predicate.
    pub max_price: f64,
    /// Float ceiling in millions of shares. Accepted, not consulted.
    pub max_float_m: f64,
    /// Consecutive qualifying closes required before entry. 0 = first qualifying bar.
    pub confirm_bars: u32,
    /// Last minute after 09:30 (inclusive) at which an entry may fire.
    pub trade_cutoff_minute: u32,
    pub exit_hour: u32,
    pub exit_minute: u32,
    pub exit_policies: BTreeSet<ExitReason>,
    pub gap_fill_pct: f64,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    /// IANA name of the exchange's zone.
    pub timezone: String,
}

impl Default for GapAndGoConfig {
    fn default() -> Self {
        Self {
            min_gap_pct: 3.0,
            max_price: 50.0,
            max_float_m: 500.0,
            confirm_bars: 0,
            trade_cutoff_minute: 5,
            exit_hour: 15,
            exit_minute: 0,
            exit_policies: BTreeSet::from([ExitReason::TimeOfDay]),
            gap_fill_pct: 2.0,
            stop_loss_pct: None,
            take_profit_pct: None,
            timezone: DEFAULT_TZ_NAME.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    ExitTimeOutOfRange { hour: u32, minute: u32 },
    /// Negative, NaN, or infinite percentage.
    InvalidPercent { field: &'static str, value: f64 },
    Timezone(SessionError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ExitTimeOutOfRange { hour, minute } => write!(
                f,
                "exit time {hour:02}:{minute:02} is outside 00:00..=23:59"
            ),
            ConfigError::InvalidPercent { field, value } => {
                write!(f, "{field} must be a finite, non-negative percentage (got {value})")
            }
            ConfigError::Timezone(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Timezone(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SessionError> for ConfigError {
    fn from(e: SessionError) -> Self {
        ConfigError::Timezone(e)
    }
}

impl GapAndGoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exit_hour > 23 || self.exit_minute > 59 {
            return Err(ConfigError::ExitTimeOutOfRange {
                hour: self.exit_hour,
                minute: self.exit_minute,
            });
        }

        let mut pcts = vec![
            ("min_gap_pct", self.min_gap_pct),
            ("gap_fill_pct", self.gap_fill_pct),
        ];
        if let Some(v) = self.stop_loss_pct {
            pcts.push(("stop_loss_pct", v));
        }
        if let Some(v) = self.take_profit_pct {
            pcts.push(("take_profit_pct", v));
        }
        for (field, value) in pcts {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidPercent { field, value });
            }
        }

        self.clock()?;
        Ok(())
    }

    pub fn clock(&self) -> Result<SessionClock, SessionError> {
        SessionClock::from_tz_name(&self.timezone)
    }

    /// Capacity of the per-symbol confirmation buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.confirm_bars.max(1) as usize
    }

    pub fn exits_on(&self, reason: ExitReason) -> bool {
        self.exit_policies.contains(&reason)
    }
}
