use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config: fixed sim reading, no display, no network
fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[sensor]
kind = "sim"
sim_low = 1500
sim_high = 1500

[filter]
window = 4

[calibration]
raw_at_zero = 1000
raw_at_hundred = 2000

[display]
kind = "none"

[network]
enabled = false
{extra}
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "ok", "stdout")]
#[case(&["probe", "--samples", "8"], 0, "50.00 mm", "stdout")]
#[case(&["run", "--duration-ms", "200"], 0, "Run complete", "stdout")]
#[case(&["run", "--duration-ms", "200", "--stats"], 0, "Samples:", "stderr")]
#[case(&["bogus"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = Command::cargo_bin("sag_cli").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn equal_anchors_are_a_configuration_fault() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[calibration]\nraw_at_zero = 900\nraw_at_hundred = 900\n[network]\nenabled = false\n",
    )
    .unwrap();

    Command::cargo_bin("sag_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("must differ"));
}

#[rstest]
#[case("[filter]\nwindow = 0\n", "filter.window must be >= 1")]
#[case("[schedule]\nsample_ms = 0\n", "schedule.sample_ms must be >= 1")]
#[case("[network]\nws_path = \"ws\"\n", "network.ws_path must start with '/'")]
fn invalid_config_exits_with_config_code(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, toml).unwrap();

    Command::cargo_bin("sag_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn missing_config_reports_json_error() {
    let dir = tempdir().unwrap();
    let out = Command::cargo_bin("sag_cli")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("self-check")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(4));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let last = stderr.lines().last().expect("error line");
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "ConfigError");
    assert_eq!(v["exit_code"], 4);
    assert!(v["message"].as_str().unwrap().contains("read config"));
}

#[rstest]
fn cli_reports_bad_calibration_header() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    // Write a bad-header CSV
    let bad_csv = dir.path().join("calib.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "raw,value").unwrap();
    writeln!(f, "1000,0").unwrap();
    writeln!(f, "2000,100").unwrap();

    let mut cmd = Command::cargo_bin("sag_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&bad_csv)
        .arg("self-check");

    cmd.assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn calibration_csv_overrides_toml_anchors() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let csv = dir.path().join("calib.csv");
    fs::write(&csv, "raw,length\n1500,0\n2500,100\n").unwrap();

    let out = Command::cargo_bin("sag_cli")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .arg("probe")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(v["length"].as_f64().unwrap().abs() < 1e-3);
}

#[rstest]
fn probe_json_reports_filtered_raw_and_length() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let out = Command::cargo_bin("sag_cli")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("probe")
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    // default sample count is one filter window
    assert_eq!(v["samples"], 4);
    assert_eq!(v["warm"], true);
    assert!((v["raw"].as_f64().unwrap() - 1500.0).abs() < 1e-3);
    assert!((v["length"].as_f64().unwrap() - 50.0).abs() < 1e-3);
}

#[rstest]
fn run_json_summary_with_network_on_ephemeral_port() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        r#"
[sensor]
sim_low = 2000
sim_high = 2000

[filter]
window = 2

[calibration]
raw_at_zero = 1000
raw_at_hundred = 2000

[display]
kind = "log"

[network]
enabled = true
bind = "127.0.0.1:0"
"#,
    )
    .unwrap();

    let out = Command::cargo_bin("sag_cli")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--duration-ms")
        .arg("300")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(v["samples"].as_u64().unwrap() > 0);
    assert!(v["frames"].as_u64().unwrap() >= 1);
    assert_eq!(v["broadcasts_sent"], 0);
    assert!((v["state"]["length"].as_f64().unwrap() - 100.0).abs() < 1e-3);
}

#[cfg(not(feature = "hardware"))]
#[rstest]
fn mcp3008_without_hardware_feature_is_a_configuration_fault() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[sensor]\nkind = \"mcp3008\"\nmax_raw = 1023\n[calibration]\nraw_at_zero = 100\nraw_at_hundred = 900\n[network]\nenabled = false\n",
    )
    .unwrap();

    Command::cargo_bin("sag_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("hardware"));
}
