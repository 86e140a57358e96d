use assert_cmd::Command;
use predicates::prelude::*;

const BARS: &str = "\
symbol,timestamp,open,high,low,close,volume
AAPL,2024-01-08T13:00:00Z,99.0,100.0,98.5,99.5,1000
AAPL,2024-01-08T13:30:00Z,99.5,102.0,99.0,101.0,1200
AAPL,2024-01-08T14:30:00Z,101.0,103.0,100.8,103.0,5000
AAPL,2024-01-08T20:00:00Z,104.0,104.2,103.6,104.0,2500
";

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
    let p = dir.path().join(name);
    std::fs::write(&p, body).unwrap();
    p.to_string_lossy().into_owned()
}

#[test]
fn replay_prints_buy_then_sell() {
    let dir = tempfile::tempdir().unwrap();
    let bars = write(&dir, "bars.csv", BARS);

    Command::cargo_bin("pbd")
        .unwrap()
        .args(["replay", "--bars", &bars])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "signal seq=0 symbol=AAPL ts=2024-01-08T14:30:00+00:00 kind=BUY",
        ))
        .stdout(predicate::str::contains("reference_price=102"))
        .stdout(predicate::str::contains("kind=SELL exit_reason=time_of_day"))
        .stdout(predicate::str::contains("symbol=AAPL buys=1 sells=1 flats=0"));
}

#[test]
fn replay_json_lines_are_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let bars = write(&dir, "bars.csv", BARS);

    let out = Command::cargo_bin("pbd")
        .unwrap()
        .args(["replay", "--bars", &bars, "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["signal"]["kind"], "BUY");
    assert_eq!(lines[1]["signal"]["kind"], "SELL");
    assert_eq!(lines[2]["summary"]["signals"], 2);
}

#[test]
fn strict_config_rejects_unused_keys() {
    let dir = tempfile::tempdir().unwrap();
    let bars = write(&dir, "bars.csv", BARS);
    let cfg = write(&dir, "cfg.yaml", "strategy:\n  gap_and_go:\n    confirm_bars: 0\nrisk:\n  max: 1\n");

    Command::cargo_bin("pbd")
        .unwrap()
        .args(["replay", "--config", &cfg, "--bars", &bars, "--strict-config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));

    Command::cargo_bin("pbd")
        .unwrap()
        .args(["replay", "--config", &cfg, "--bars", &bars])
        .assert()
        .success();
}

#[test]
fn unknown_strategy_name_fails() {
    let dir = tempfile::tempdir().unwrap();
    let bars = write(&dir, "bars.csv", BARS);
    let cfg = write(&dir, "cfg.yaml", "strategy:\n  name: opening_range\n");

    Command::cargo_bin("pbd")
        .unwrap()
        .args(["replay", "--config", &cfg, "--bars", &bars])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy 'opening_range'"));
}

#[test]
fn strategies_lists_gap_and_go() {
    Command::cargo_bin("pbd")
        .unwrap()
        .arg("strategies")
        .assert()
        .success()
        .stdout(predicate::str::contains("name=gap_and_go"))
        .stdout(predicate::str::contains("timeframe_secs=60"));
}

#[test]
fn config_hash_prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write(&dir, "cfg.yaml", "session:\n  timezone: America/New_York\n");

    Command::cargo_bin("pbd")
        .unwrap()
        .args(["config-hash", &cfg])
        .assert()
        .success()
        .stdout(predicate::str::is_match("config_hash=[0-9a-f]{64}").unwrap())
        .stdout(predicate::str::contains(r#"{"session":{"timezone":"America/New_York"}}"#));
}
