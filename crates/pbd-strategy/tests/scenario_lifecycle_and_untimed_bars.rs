use chrono::DateTime;
use pbd_strategy::*;

fn bar(ts: &str, high: f64, close: f64) -> Bar {
    Bar::new(DateTime::parse_from_rfc3339(ts).unwrap(), close, high, close, close, 100)
}

#[test]
fn scenario_untimed_bar_is_ignored() {
    let session = SessionState::backtest();
    let mut s = GapAndGo::default();
    s.on_start(&session);

    assert_eq!(s.on_bar("SPY", &Bar::untimed(1.0, 2.0, 0.5, 1.5, 10), &session), None);
    assert!(s.symbol_state("SPY").is_none());

    s.on_bar("SPY", &bar("2024-01-08T09:00:00-05:00", 400.0, 399.0), &session);
    let before = s.symbol_state("SPY").cloned();
    assert_eq!(s.on_bar("SPY", &Bar::untimed(500.0, 501.0, 499.0, 500.5, 10), &session), None);
    assert_eq!(s.symbol_state("SPY").cloned(), before);
}

#[test]
fn scenario_symbols_are_independent() {
    let session = SessionState::backtest();
    let mut s = GapAndGo::default();
    s.on_start(&session);

    s.on_bar("AAA", &bar("2024-01-08T09:00:00-05:00", 10.0, 9.9), &session);
    s.on_bar("BBB", &bar("2024-01-08T09:00:00-05:00", 20.0, 19.9), &session);
    let a = s.on_bar("AAA", &bar("2024-01-08T09:30:00-05:00", 10.5, 10.2), &session);
    let b = s.on_bar("BBB", &bar("2024-01-08T09:30:00-05:00", 19.5, 19.0), &session);

    assert_eq!(a.map(|x| x.kind), Some(SignalType::Buy));
    assert_eq!(b, None);
    assert_eq!(s.tracked_symbols().collect::<Vec<_>>(), ["AAA", "BBB"]);
}

#[test]
fn scenario_stop_is_idempotent_and_safe_before_start() {
    let session = SessionState::backtest();
    let mut s = GapAndGo::default();
    s.on_stop(&session);
    s.on_stop(&session);

    s.on_start(&session);
    s.on_bar("SPY", &bar("2024-01-08T09:00:00-05:00", 400.0, 399.0), &session);
    s.on_stop(&session);
    s.on_stop(&session);
    assert_eq!(s.tracked_symbols().count(), 0);

    // A fresh run sees no leftover reference.
    s.on_start(&session);
    s.on_bar("SPY", &bar("2024-01-08T09:30:00-05:00", 350.0, 349.0), &session);
    assert_eq!(s.symbol_state("SPY").unwrap().reference_price(), Some(349.0));
}

#[test]
fn scenario_start_clears_previous_run() {
    let session = SessionState::backtest();
    let mut s = GapAndGo::default();
    s.on_start(&session);
    s.on_bar("SPY", &bar("2024-01-08T09:00:00-05:00", 400.0, 399.0), &session);
    s.on_start(&session);
    assert!(s.symbol_state("SPY").is_none());
}

#[test]
fn scenario_host_enforces_driver_contract() {
    let session = SessionState::backtest();
    let mut host = StrategyHost::new();
    assert_eq!(host.spec(), Err(StrategyHostError::NoStrategyRegistered));

    host.register(Box::new(GapAndGo::default())).unwrap();
    assert_eq!(
        host.register(Box::new(GapAndGo::default())),
        Err(StrategyHostError::MultiStrategyNotAllowed)
    );

    let b = bar("2024-01-08T09:00:00-05:00", 10.0, 9.9);
    assert_eq!(host.on_bar("SPY", &b, &session), Err(StrategyHostError::NotStarted));

    host.start(&session).unwrap();
    assert_eq!(host.phase(), HostPhase::Running);
    assert_eq!(host.start(&session), Err(StrategyHostError::AlreadyStarted));
    assert_eq!(host.on_bar("SPY", &b, &session), Ok(None));

    host.stop(&session).unwrap();
    host.stop(&session).unwrap();
    assert_eq!(host.phase(), HostPhase::Stopped);
    assert_eq!(host.on_bar("SPY", &b, &session), Err(StrategyHostError::NotStarted));
}

#[test]
fn scenario_invalid_config_is_rejected_at_construction() {
    let cfg = GapAndGoConfig {
        exit_minute: 60,
        ..GapAndGoConfig::default()
    };
    assert!(matches!(
        GapAndGo::new(cfg),
        Err(ConfigError::ExitTimeOutOfRange { .. })
    ));
}
