//! Human-readable error descriptions and structured JSON error formatting.

use sag_core::error::{BuildError, SagError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No sensor was provided to the meter.\nLikely causes: The ADC failed to initialize or was not wired into the builder.\nHow to fix: Ensure the sensor is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::MissingPanel => {
                "What happened: No display panel was provided to the meter.\nLikely causes: The display back-end was not wired into the builder.\nHow to fix: Pass a panel via with_panel(...), or set [display] kind = \"none\".".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/sag_config.toml for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SagError>() {
        return match se {
            SagError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                // Calibration CSV header special-case
                if lower.contains("calibration csv must have headers") {
                    return "Invalid headers in calibration CSV. Expected 'raw,length'.".to_string();
                }
                if lower.contains("must differ") {
                    return format!(
                        "What happened: Calibration anchors are unusable ({msg}).\nLikely causes: Both anchor readings were taken at the same position, or copied twice.\nHow to fix: Re-measure the raw value at 0 mm and at 100 mm; they must be different."
                    );
                }
                format!(
                    "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or calibration CSV.\nHow to fix: Edit the config file, then rerun. See etc/sag_config.toml for a sample."
                )
            }
            SagError::Sensor(msg) => format!(
                "What happened: The sensor could not be read ({msg}).\nLikely causes: ADC not wired, wrong SPI bus or channel, or missing SPI permissions.\nHow to fix: Check [sensor] in the config and the wiring, then run `self-check` again."
            ),
            SagError::Timeout => {
                "What happened: Sensor read timed out.\nLikely causes: ADC not powered or not responding on the SPI bus.\nHow to fix: Verify power, ground and the SPI wiring.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from startup
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("bind ") {
        return format!(
            "What happened: The web server could not listen ({msg}).\nLikely causes: Another process already uses the port, or the address is not local.\nHow to fix: Change [network] bind, or set [network] enabled = false."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Any failure without a more specific code.
pub const EXIT_FAILURE: i32 = 1;
/// Sensor could not be read (fault or timeout).
pub const EXIT_SENSOR: i32 = 3;
/// Configuration fault. Kept apart from clap's usage error (2).
pub const EXIT_CONFIG: i32 = 4;

/// Stable exit codes: 4 for configuration faults, 3 for sensor faults, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return EXIT_CONFIG;
    }
    match err.downcast_ref::<SagError>() {
        Some(SagError::Config(_)) => EXIT_CONFIG,
        Some(SagError::Sensor(_) | SagError::Timeout) => EXIT_SENSOR,
        _ => EXIT_FAILURE,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "BuildError";
    }
    match err.downcast_ref::<SagError>() {
        Some(SagError::Config(_)) => "ConfigError",
        Some(SagError::Sensor(_) | SagError::Timeout) => "SensorFault",
        Some(SagError::Link(_)) => "LinkError",
        Some(SagError::Io(_)) => "IoError",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
