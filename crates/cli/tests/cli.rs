// Runs the built `fleetpay` binary against fixture exports.
//
// Every test gets its own history root and points FLEETPAY_SETTINGS at a
// missing file so the user's real settings never leak in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn fleetpay(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fleetpay"));
    cmd.env("FLEETPAY_SETTINGS", home.join("settings.json"))
        .env_remove("FLEETPAY_HISTORY")
        .env_remove("RUST_LOG");
    cmd
}

fn history_dir(home: &TempDir) -> PathBuf {
    home.path().join("history")
}

fn run(home: &TempDir, args: &[&str]) -> Output {
    let history = history_dir(home);
    let mut all: Vec<&str> = args.to_vec();
    all.push("--history");
    all.push(history.to_str().unwrap());
    fleetpay(home.path()).args(&all).output().expect("run fleetpay")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\n{stdout}"))
}

fn settle_fixture_week(home: &TempDir, week: &str) -> Output {
    let bolt = fixture("bolt.csv");
    let bolt_late = fixture("bolt_late.csv");
    let uber = fixture("uber.csv");
    run(
        home,
        &["settle", "--week", week, "--bolt", &bolt, "--bolt", &bolt_late, "--uber", &uber, "--json"],
    )
}

#[test]
fn settle_prints_batch_json_and_saves_week() {
    let home = TempDir::new().unwrap();
    let output = settle_fixture_week(&home, "2026-W03");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let batch = json(&output);
    assert_eq!(batch["meta"]["week"], "2026-W03");
    assert_eq!(batch["settlements"].as_array().unwrap().len(), 5);
    assert_eq!(batch["summary"]["drivers"], 5);
    assert_eq!(batch["ranking"][0]["driver"], "Ion Popescu");
    assert_eq!(batch["ranking"][0]["final_gross_display"], "1,335.00 RON");

    let week_dir = history_dir(&home).join("2026-W03");
    for artifact in ["summary.xlsx", "drivers.zip", "platform_due.xlsx", "metadata.json"] {
        assert!(week_dir.join(artifact).is_file(), "missing {artifact}");
    }
    assert!(stderr(&output).contains("week 2026-W03: 5 drivers"));
}

#[test]
fn dry_run_writes_nothing() {
    let home = TempDir::new().unwrap();
    let bolt = fixture("bolt.csv");
    let output = run(&home, &["settle", "--week", "2026-W03", "--bolt", &bolt, "--dry-run"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty());
    assert!(!history_dir(&home).join("2026-W03").exists());
}

#[test]
fn missing_net_column_exits_with_schema_code_and_saves_nothing() {
    let home = TempDir::new().unwrap();
    let bolt = fixture("bolt.csv");
    let uber = fixture("uber_no_net.csv");
    let output = run(&home, &["settle", "--week", "2026-W03", "--bolt", &bolt, "--uber", &uber]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("UBER file 'uber_no_net.csv' is missing columns"));
    assert!(!history_dir(&home).join("2026-W03").exists());
}

#[test]
fn settle_without_exports_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    let output = run(&home, &["settle", "--week", "2026-W03"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn unsafe_week_name_is_rejected() {
    let home = TempDir::new().unwrap();
    let bolt = fixture("bolt.csv");
    let output = run(&home, &["settle", "--week", "../escape", "--bolt", &bolt]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!home.path().join("escape").exists());
}

#[test]
fn invalid_config_exits_with_config_code() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("fleet.toml");
    std::fs::write(&config, "[settlement]\ncommission_bps = 20000\n").unwrap();
    let bolt = fixture("bolt.csv");
    let output = run(
        &home,
        &["settle", "--week", "2026-W03", "--bolt", &bolt, "--config", config.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn stored_week_reloads_through_summary_history_driver_and_archive() {
    let home = TempDir::new().unwrap();
    assert!(settle_fixture_week(&home, "2026-W03").status.success());

    let summary = run(&home, &["summary", "2026-W03", "--json"]);
    assert!(summary.status.success(), "stderr: {}", stderr(&summary));
    let summary = json(&summary);
    assert_eq!(summary["drivers"], 5);
    let ranked: Vec<&str> = summary["ranking"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["driver"].as_str().unwrap())
        .collect();
    assert_eq!(ranked, vec!["Ion Popescu", "Ana Maria Pop", "Dan Ene"]);

    let history = run(&home, &["history", "--json"]);
    assert!(history.status.success());
    let weeks = json(&history);
    assert_eq!(weeks[0]["week"], "2026-W03");
    assert_eq!(weeks[0]["top_driver"], "Ion Popescu");

    let driver = run(&home, &["driver", "2026-W03", "popescu ion"]);
    assert!(driver.status.success(), "stderr: {}", stderr(&driver));
    let path = String::from_utf8_lossy(&driver.stdout).trim().to_string();
    assert!(path.ends_with("Ion Popescu.xlsx"), "{path}");
    assert!(Path::new(&path).is_file());

    let archive = run(&home, &["archive", "2026-W03"]);
    assert!(archive.status.success());
    let path = String::from_utf8_lossy(&archive.stdout).trim().to_string();
    assert!(path.ends_with("drivers.zip"));
}

#[test]
fn unknown_week_or_driver_exits_not_found() {
    let home = TempDir::new().unwrap();
    assert_eq!(run(&home, &["summary", "1999-W01"]).status.code(), Some(5));
    assert!(settle_fixture_week(&home, "2026-W03").status.success());
    assert_eq!(run(&home, &["driver", "2026-W03", "Nobody Here"]).status.code(), Some(5));
}

#[test]
fn history_json_is_empty_list_without_weeks() {
    let home = TempDir::new().unwrap();
    let output = run(&home, &["history", "--json"]);
    assert!(output.status.success());
    assert_eq!(json(&output), serde_json::json!([]));
}

#[test]
fn validate_checks_headers_per_platform() {
    let home = TempDir::new().unwrap();
    let ok = fleetpay(home.path())
        .args(["validate", "--platform", "bolt", &fixture("bolt.csv")])
        .output()
        .unwrap();
    assert!(ok.status.success(), "stderr: {}", stderr(&ok));
    assert!(stderr(&ok).contains("3 driver row(s)"));

    let wrong = fleetpay(home.path())
        .args(["validate", "--platform", "uber", &fixture("bolt.csv")])
        .output()
        .unwrap();
    assert_eq!(wrong.status.code(), Some(3));
}

#[test]
fn due_prints_platform_due_workbook() {
    let home = TempDir::new().unwrap();
    assert!(settle_fixture_week(&home, "2026-W03").status.success());

    let due = run(&home, &["due", "2026-W03"]);
    assert!(due.status.success(), "stderr: {}", stderr(&due));
    let path = String::from_utf8_lossy(&due.stdout).trim().to_string();
    assert!(path.ends_with("platform_due.xlsx"), "{path}");
    assert!(Path::new(&path).is_file());

    assert_eq!(run(&home, &["due", "1999-W01"]).status.code(), Some(5));
}

#[test]
fn summary_warns_when_config_changed_since_settle() {
    let home = TempDir::new().unwrap();
    assert!(settle_fixture_week(&home, "2026-W03").status.success());

    let unchanged = run(&home, &["summary", "2026-W03"]);
    assert!(unchanged.status.success());
    assert!(!stderr(&unchanged).contains("does not match"), "{}", stderr(&unchanged));

    let config = home.path().join("fleet.toml");
    std::fs::write(&config, "[settlement]\ncommission_bps = 1250\n").unwrap();
    let settings = serde_json::json!({ "recon.config": config });
    std::fs::write(home.path().join("settings.json"), settings.to_string()).unwrap();

    let changed = run(&home, &["summary", "2026-W03"]);
    assert!(changed.status.success(), "stderr: {}", stderr(&changed));
    assert!(
        stderr(&changed).contains("row for Ion Popescu does not match the current commission and fee settings"),
        "{}",
        stderr(&changed)
    );
}

#[test]
fn overflowing_amounts_exit_with_computation_code() {
    let home = TempDir::new().unwrap();
    let bolt = fixture("bolt_huge.csv");
    let output = run(&home, &["settle", "--week", "2026-W03", "--bolt", &bolt]);
    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("exceed the supported range"));
    assert!(!history_dir(&home).join("2026-W03").exists());
}
