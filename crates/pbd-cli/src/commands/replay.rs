//! `pbd replay`: config -> strategy -> bar tape -> signals on stdout.

use anyhow::{Context, Result};
use pbd_replay::{ReplayDriver, ReplayReport, SignalRecord};
use pbd_strategy::{builtin_registry, SessionState, StrategyHost};
use tracing::info;

pub fn run(config_paths: &[String], bars_path: &str, json: bool, strict_config: bool) -> Result<()> {
    let loaded = super::load_config(config_paths, strict_config)?;
    let name = pbd_config::strategy_name(&loaded);
    let strategy_cfg = pbd_config::gap_and_go_config(&loaded)?;
    let settings = pbd_config::replay_settings(&loaded)?;

    let registry = builtin_registry(strategy_cfg).context("strategy config rejected")?;
    let strategy = registry
        .instantiate_verified(&name)
        .with_context(|| format!("cannot instantiate strategy '{name}'"))?;

    let mut host = StrategyHost::new();
    host.register(strategy)?;

    let bars = pbd_replay::load_csv_file(bars_path)
        .with_context(|| format!("failed to load bars: {bars_path}"))?;
    info!(path = bars_path, rows = bars.len(), "bars loaded");

    let session = SessionState {
        flatten_on_stop: settings.flatten_on_stop,
        ..SessionState::backtest()
    };
    let report = ReplayDriver::new(host, session)
        .with_config_hash(loaded.config_hash.clone())
        .with_symbol_filter(settings.symbols)
        .run(&bars)?;

    for rec in &report.signals {
        if json {
            println!("{}", serde_json::to_string(rec).context("serialize signal failed")?);
        } else {
            println!("{}", signal_line(rec));
        }
    }
    if json {
        println!("{}", summary_json(&report, &loaded.config_hash));
    } else {
        print_summary(&report, &loaded.config_hash);
    }
    Ok(())
}

fn signal_line(rec: &SignalRecord) -> String {
    let mut line = format!(
        "signal seq={} symbol={} ts={} kind={}",
        rec.seq,
        rec.symbol,
        rec.timestamp.as_deref().unwrap_or("-"),
        rec.signal.kind
    );
    if let Some(sl) = rec.signal.sl_pct {
        line.push_str(&format!(" sl_pct={sl}"));
    }
    if let Some(tp) = rec.signal.tp_pct {
        line.push_str(&format!(" tp_pct={tp}"));
    }
    for (k, v) in &rec.signal.meta {
        match v.as_str() {
            Some(s) => line.push_str(&format!(" {k}={s}")),
            None => line.push_str(&format!(" {k}={v}")),
        }
    }
    line
}

fn summary_json(report: &ReplayReport, config_hash: &str) -> serde_json::Value {
    serde_json::json!({
        "summary": {
            "run_id": report.run_id.to_string(),
            "strategy": report.strategy,
            "config_hash": config_hash,
            "bars_seen": report.bars_seen,
            "bars_skipped": report.bars_skipped,
            "bars_filtered": report.bars_filtered,
            "signals": report.signals.len(),
            "per_symbol": report.per_symbol,
        }
    })
}

fn print_summary(report: &ReplayReport, config_hash: &str) {
    println!(
        "replay_ok=true run_id={} strategy={} config_hash={}",
        report.run_id, report.strategy, config_hash
    );
    println!(
        "bars_seen={} bars_skipped={} bars_filtered={} signals={}",
        report.bars_seen,
        report.bars_skipped,
        report.bars_filtered,
        report.signals.len()
    );
    for (symbol, c) in &report.per_symbol {
        println!(
            "symbol={} buys={} sells={} flats={}",
            symbol, c.buys, c.sells, c.flats
        );
    }
}
