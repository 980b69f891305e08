use sag_core::{Calibration, DisplayCfg, FilterCfg, SagError, ScheduleCfg};

#[test]
fn file_sections_convert_to_runtime_config() {
    let cfg = sag_config::Config::default();

    let filter = FilterCfg::from(&cfg.filter);
    assert_eq!(filter.window, 128);

    let schedule = ScheduleCfg::from(&cfg.schedule);
    assert_eq!(
        (schedule.sample_ms, schedule.display_ms, schedule.broadcast_ms),
        (1, 100, 100)
    );
    assert_eq!(schedule.idle_us, cfg.schedule.idle_us);

    let display = DisplayCfg::from(&cfg.display);
    assert_eq!(display.unit, "mm");
}

#[test]
fn anchors_convert_to_calibration() {
    let anchors = sag_config::Anchors {
        raw_at_zero: 1000,
        raw_at_hundred: 2000,
    };
    let cal = Calibration::try_from(&anchors).unwrap();
    assert!((cal.to_length(1500.0) - 50.0).abs() < 1e-4);
}

#[test]
fn equal_anchors_fail_conversion() {
    let anchors = sag_config::Anchors {
        raw_at_zero: 900,
        raw_at_hundred: 900,
    };
    let err = Calibration::try_from(&anchors).unwrap_err();
    assert!(matches!(err.downcast_ref::<SagError>(), Some(SagError::Config(_))));
}
