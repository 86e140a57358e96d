use chrono::DateTime;
use pbd_strategy::*;

fn bar(ts: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(DateTime::parse_from_rfc3339(ts).unwrap(), open, high, low, close, 10_000)
}

#[test]
fn scenario_premarket_breakout_round_trip() {
    let session = SessionState::backtest();
    let mut s = GapAndGo::default();
    s.on_start(&session);

    // 2024-01-08 is EST (UTC-5).
    for (ts, high) in [
        ("2024-01-08T08:00:00-05:00", 100.0),
        ("2024-01-08T08:30:00-05:00", 102.0),
        ("2024-01-08T09:00:00-05:00", 101.0),
    ] {
        assert_eq!(s.on_bar("AAPL", &bar(ts, 99.0, high, 98.0, 99.5), &session), None);
    }
    assert_eq!(s.symbol_state("AAPL").unwrap().reference_price(), Some(102.0));

    let buy = s
        .on_bar("AAPL", &bar("2024-01-08T09:30:00-05:00", 101.0, 103.0, 100.5, 103.0), &session)
        .expect("breakout bar must signal");
    assert_eq!(buy.kind, SignalType::Buy);
    assert_eq!(buy.meta_f64("reference_price"), Some(102.0));
    assert_eq!(buy.meta_str("reference_source"), Some("premarket_high"));
    assert_eq!(buy.meta_str("trading_date"), Some("2024-01-08"));
    assert!(buy.meta.get("gap_pct").is_none());
    assert!(s.symbol_state("AAPL").unwrap().in_position());

    // Hold until the exit time.
    assert_eq!(
        s.on_bar("AAPL", &bar("2024-01-08T11:00:00-05:00", 104.0, 105.0, 103.5, 104.5), &session),
        None
    );
    assert_eq!(
        s.on_bar("AAPL", &bar("2024-01-08T14:59:00-05:00", 104.0, 105.0, 103.5, 104.5), &session),
        None
    );

    let sell = s
        .on_bar("AAPL", &bar("2024-01-08T15:00:00-05:00", 104.0, 104.2, 103.8, 104.0), &session)
        .expect("exit time must signal");
    assert_eq!(sell.kind, SignalType::Sell);
    assert_eq!(sell.meta_str("exit_reason"), Some("time_of_day"));
    assert!(!s.symbol_state("AAPL").unwrap().in_position());

    // Flat and past the cutoff: nothing further today.
    assert_eq!(
        s.on_bar("AAPL", &bar("2024-01-08T15:30:00-05:00", 110.0, 111.0, 109.0, 110.5), &session),
        None
    );
}

#[test]
fn scenario_breakout_requires_close_at_or_above_reference() {
    let session = SessionState::backtest();
    let mut s = GapAndGo::default();
    s.on_start(&session);

    s.on_bar("AAPL", &bar("2024-01-08T09:00:00-05:00", 99.0, 102.0, 98.0, 101.0), &session);

    // High pierces, close fails.
    assert_eq!(
        s.on_bar("AAPL", &bar("2024-01-08T09:30:00-05:00", 101.0, 103.0, 100.0, 101.9), &session),
        None
    );
    // Close exactly at the reference qualifies.
    let sig = s.on_bar("AAPL", &bar("2024-01-08T09:31:00-05:00", 101.9, 102.5, 101.5, 102.0), &session);
    assert_eq!(sig.map(|x| x.kind), Some(SignalType::Buy));
}

#[test]
fn scenario_stops_are_copied_onto_buy() {
    let session = SessionState::backtest();
    let cfg = GapAndGoConfig {
        stop_loss_pct: Some(1.5),
        take_profit_pct: Some(4.0),
        ..GapAndGoConfig::default()
    };
    let mut s = GapAndGo::new(cfg).unwrap();
    s.on_start(&session);

    s.on_bar("MSFT", &bar("2024-01-08T09:00:00-05:00", 10.0, 10.0, 9.9, 10.0), &session);
    let buy = s
        .on_bar("MSFT", &bar("2024-01-08T09:30:00-05:00", 10.0, 10.5, 10.0, 10.4), &session)
        .unwrap();
    assert_eq!(buy.sl_pct, Some(1.5));
    assert_eq!(buy.tp_pct, Some(4.0));
}
