#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    let parsed = toml::from_str::<sag_config::Config>(data);
    assert_eq!(parsed.is_ok(), sag_config::load_toml(data).is_ok());
    if let Ok(cfg) = parsed {
        if cfg.validate().is_ok() {
            // a config that validates always has usable anchors
            assert_ne!(cfg.calibration.raw_at_zero, cfg.calibration.raw_at_hundred);
            assert!(cfg.filter.window >= 1);
            assert!(cfg.calibration.raw_at_zero <= cfg.sensor.max_raw);
            assert!(cfg.calibration.raw_at_hundred <= cfg.sensor.max_raw);
            if cfg.sensor.kind == sag_config::SensorKind::Mcp3008 {
                assert!(cfg.sensor.max_raw <= sag_config::MCP3008_MAX_RAW);
            }
        }
    }
});
