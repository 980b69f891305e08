use sag_config::{DisplayKind, SensorKind, load_toml};
use rstest::rstest;

const VALID: &str = r#"
[sensor]
kind = "sim"
max_raw = 4095

[filter]
window = 128

[calibration]
raw_at_zero = 815
raw_at_hundred = 1256

[schedule]
sample_ms = 1
display_ms = 100
broadcast_ms = 100

[display]
kind = "log"

[network]
enabled = true
bind = "127.0.0.1:8080"
ws_path = "/ws"
"#;

#[test]
fn accepts_reference_config() {
    let cfg = load_toml(VALID).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.sensor.kind, SensorKind::Sim);
    assert_eq!(cfg.display.kind, DisplayKind::Log);
    assert_eq!(cfg.filter.window, 128);
    assert_eq!(cfg.calibration.raw_at_zero, 815);
    assert_eq!(cfg.calibration.raw_at_hundred, 1256);
}

#[test]
fn empty_document_uses_firmware_defaults() {
    let cfg = load_toml("").expect("parse empty TOML");
    cfg.validate().expect("defaults should validate");
    assert_eq!(cfg.filter.window, 128);
    assert_eq!(cfg.schedule.sample_ms, 1);
    assert_eq!(cfg.schedule.display_ms, 100);
    assert_eq!(cfg.schedule.broadcast_ms, 100);
    assert_eq!(cfg.display.unit, "mm");
}

#[test]
fn rejects_equal_anchors() {
    let toml = r#"
[calibration]
raw_at_zero = 900
raw_at_hundred = 900
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("equal anchors must be rejected");
    let msg = format!("{err}").to_lowercase();
    assert!(msg.contains("invalid configuration"), "{msg}");
    assert!(msg.contains("must differ"), "{msg}");
}

#[test]
fn accepts_reversed_anchors() {
    let toml = r#"
[calibration]
raw_at_zero = 1256
raw_at_hundred = 815
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("a reversed potentiometer is still linear");
}

#[rstest]
#[case("[filter]\nwindow = 0", "filter.window must be >= 1")]
#[case("[filter]\nwindow = 10000", "filter.window is unreasonably large")]
#[case("[schedule]\nsample_ms = 0", "schedule.sample_ms must be >= 1")]
#[case("[schedule]\ndisplay_ms = 0", "schedule.display_ms must be >= 1")]
#[case("[schedule]\nbroadcast_ms = 0", "schedule.broadcast_ms must be >= 1")]
#[case("[network]\nbind = \"not-an-address\"", "network.bind must be a socket address")]
#[case("[network]\nws_path = \"ws\"", "network.ws_path must start with '/'")]
#[case("[network]\noutbox_depth = 0", "network.outbox_depth must be >= 1")]
#[case("[sensor]\nmax_raw = 1000", "calibration anchors must be <= sensor.max_raw")]
#[case("[sensor]\nkind = \"mcp3008\"\nmax_raw = 1023\nchannel = 8\n[calibration]\nraw_at_zero = 100\nraw_at_hundred = 900", "sensor.channel must be in 0..=7")]
#[case("[sensor]\nkind = \"mcp3008\"\n[calibration]\nraw_at_zero = 100\nraw_at_hundred = 900", "sensor.max_raw must be <= 1023 for mcp3008")]
#[case("[sensor]\nkind = \"mcp3008\"\nmax_raw = 1023\n[calibration]\nraw_at_zero = 100\nraw_at_hundred = 2000", "calibration anchors must be <= sensor.max_raw (1023)")]
#[case("[sensor]\nsim_low = 2000\nsim_high = 1000", "sensor.sim_low must be <= sensor.sim_high")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(format!("{err}").contains(needle), "got: {err}");
}

#[test]
fn accepts_mcp3008_with_ten_bit_range() {
    let toml = r#"
[sensor]
kind = "mcp3008"
max_raw = 1023
channel = 7
[calibration]
raw_at_zero = 0
raw_at_hundred = 1023
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("full 10-bit range is reachable");
}

#[test]
fn disabled_network_skips_address_checks() {
    let toml = r#"
[network]
enabled = false
bind = "whatever"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("disabled network is not checked");
}

#[test]
fn unknown_display_kind_is_a_parse_error() {
    let err = load_toml("[display]\nkind = \"oled\"").expect_err("unknown variant");
    assert!(format!("{err}").contains("unknown variant"));
}
