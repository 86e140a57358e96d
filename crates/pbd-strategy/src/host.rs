use std::fmt;

use tracing::info;

use crate::{Bar, SessionState, Signal, Strategy, StrategySpec};

/// Where the hosted strategy is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostPhase {
    /// Registered (or empty), `on_start` not yet called.
    Idle,
    Running,
    Stopped,
}

/// Host-level contract violations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategyHostError {
    MultiStrategyNotAllowed,
    NoStrategyRegistered,
    /// `on_bar` before `start`, or after `stop`.
    NotStarted,
    AlreadyStarted,
}

impl fmt::Display for StrategyHostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyHostError::MultiStrategyNotAllowed => {
                write!(f, "a strategy is already registered; only one is allowed")
            }
            StrategyHostError::NoStrategyRegistered => write!(f, "no strategy registered"),
            StrategyHostError::NotStarted => write!(f, "strategy host is not running"),
            StrategyHostError::AlreadyStarted => write!(f, "strategy host is already running"),
        }
    }
}

impl std::error::Error for StrategyHostError {}

/// Uniform dispatch point for a single pluggable strategy.
///
/// Enforces the driver contract: exactly one strategy, `start` before any
/// bar, `stop` idempotent. The host has no notion of "paused"; a driver that
/// pauses simply stops calling `on_bar`.
pub struct StrategyHost {
    strategy: Option<Box<dyn Strategy>>,
    spec: Option<StrategySpec>,
    phase: HostPhase,
}

impl StrategyHost {
    pub fn new() -> Self {
        Self {
            strategy: None,
            spec: None,
            phase: HostPhase::Idle,
        }
    }

    /// Register the strategy to host. Only one per host.
    pub fn register(&mut self, s: Box<dyn Strategy>) -> Result<(), StrategyHostError> {
        if self.strategy.is_some() {
            return Err(StrategyHostError::MultiStrategyNotAllowed);
        }
        self.spec = Some(s.spec());
        self.strategy = Some(s);
        self.phase = HostPhase::Idle;
        Ok(())
    }

    pub fn spec(&self) -> Result<StrategySpec, StrategyHostError> {
        self.spec.clone().ok_or(StrategyHostError::NoStrategyRegistered)
    }

    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    /// Call `on_start`. Allowed from `Idle` and `Stopped` (restart).
    pub fn start(&mut self, session: &SessionState) -> Result<(), StrategyHostError> {
        if self.phase == HostPhase::Running {
            return Err(StrategyHostError::AlreadyStarted);
        }
        let s = self
            .strategy
            .as_mut()
            .ok_or(StrategyHostError::NoStrategyRegistered)?;
        s.on_start(session);
        self.phase = HostPhase::Running;
        info!(strategy = %s.spec().name, mode = ?session.run_mode, "strategy started");
        Ok(())
    }

    /// Forward one bar to the strategy.
    pub fn on_bar(
        &mut self,
        symbol: &str,
        bar: &Bar,
        session: &SessionState,
    ) -> Result<Option<Signal>, StrategyHostError> {
        let s = self
            .strategy
            .as_mut()
            .ok_or(StrategyHostError::NoStrategyRegistered)?;
        if self.phase != HostPhase::Running {
            return Err(StrategyHostError::NotStarted);
        }
        Ok(s.on_bar(symbol, bar, session))
    }

    /// Call `on_stop`. A second `stop` is a no-op; `stop` before `start` is
    /// allowed and still reaches the strategy.
    pub fn stop(&mut self, session: &SessionState) -> Result<(), StrategyHostError> {
        let s = self
            .strategy
            .as_mut()
            .ok_or(StrategyHostError::NoStrategyRegistered)?;
        if self.phase == HostPhase::Stopped {
            return Ok(());
        }
        s.on_stop(session);
        self.phase = HostPhase::Stopped;
        info!(strategy = %s.spec().name, "strategy stopped");
        Ok(())
    }
}

impl Default for StrategyHost {
    fn default() -> Self {
        Self::new()
    }
}
