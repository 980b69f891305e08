//! Config mapping, hardware assembly, and the three commands.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sag_config::{Config, DisplayKind, SensorKind};
use sag_core::error::{Result as CoreResult, SagError};
use sag_core::hw_error::map_hw_error;
use sag_core::link::event_channel;
use sag_core::mocks::NullPanel;
use sag_core::runner::{RunLimits, RunSummary, run};
use sag_core::{Calibration, Instrument, ScheduleCfg};
use sag_traits::clock::MonotonicClock;
use sag_traits::{Panel, Sensor};
use sag_ui::{LogPanel, TerminalPanel, WebCfg, WebServer};

/// Wrap any startup error as a configuration fault, keeping the full chain.
pub fn config_fault(e: &eyre::Report) -> eyre::Report {
    eyre::Report::new(SagError::Config(format!("{e:#}")))
}

pub fn load_config(path: &Path) -> CoreResult<Config> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eyre::Report::new(SagError::Config(format!(
            "read config {}: {e}",
            path.display()
        )))
    })?;
    let cfg = sag_config::load_toml(&text).map_err(|e| {
        eyre::Report::new(SagError::Config(format!(
            "parse config {}: {e}",
            path.display()
        )))
    })?;
    cfg.validate().map_err(|e| config_fault(&e))?;
    Ok(cfg)
}

/// Anchors from the CSV when given, else from `[calibration]`.
pub fn resolve_calibration(cfg: &Config, csv: Option<&Path>) -> CoreResult<Calibration> {
    let anchors = match csv {
        Some(path) => {
            let anchors = sag_config::load_anchors_csv(path).map_err(|e| config_fault(&e))?;
            cfg.validate_anchors(&anchors)
                .map_err(|e| config_fault(&e))?;
            tracing::info!(
                path = %path.display(),
                raw_at_zero = anchors.raw_at_zero,
                raw_at_hundred = anchors.raw_at_hundred,
                "calibration loaded from CSV"
            );
            anchors
        }
        None => cfg.calibration,
    };
    Calibration::try_from(&anchors)
}

pub fn build_sensor(cfg: &sag_config::SensorCfg) -> CoreResult<Box<dyn Sensor>> {
    match cfg.kind {
        SensorKind::Sim => {
            tracing::info!(
                low = cfg.sim_low,
                high = cfg.sim_high,
                step = cfg.sim_step,
                "using simulated potentiometer"
            );
            Ok(Box::new(sag_hardware::SimulatedPot::new(
                cfg.sim_low,
                cfg.sim_high,
                cfg.sim_step,
            )))
        }
        #[cfg(all(feature = "hardware", target_os = "linux"))]
        SensorKind::Mcp3008 => {
            let pot =
                sag_hardware::hardware::HardwarePot::try_new(cfg.spi_bus, cfg.channel, cfg.spi_hz)
                    .map_err(|e| eyre::Report::new(sensor_fault(&e)))?;
            Ok(Box::new(pot))
        }
        #[cfg(not(all(feature = "hardware", target_os = "linux")))]
        SensorKind::Mcp3008 => Err(eyre::Report::new(SagError::Config(
            "sensor.kind = \"mcp3008\" requires a Linux build with the `hardware` feature".into(),
        ))),
    }
}

pub fn build_panel(cfg: &sag_config::DisplayCfg) -> Box<dyn Panel> {
    match cfg.kind {
        DisplayKind::Terminal => Box::new(TerminalPanel::stdout()),
        DisplayKind::Log => Box::new(LogPanel),
        DisplayKind::None => Box::new(NullPanel),
    }
}

/// Run the meter until Ctrl-C or `duration_ms`.
pub fn run_meter(
    cfg: &Config,
    calibration: Calibration,
    duration_ms: Option<u64>,
    stats: bool,
    json: bool,
) -> CoreResult<()> {
    let sensor = build_sensor(&cfg.sensor)?;
    let panel = build_panel(&cfg.display);
    let schedule: ScheduleCfg = (&cfg.schedule).into();
    let idle = Duration::from_micros(schedule.idle_us);

    let mut builder = Instrument::builder()
        .with_filter((&cfg.filter).into())
        .with_schedule(schedule)
        .with_display((&cfg.display).into())
        .with_calibration(calibration);

    // Keep the server alive for the whole run; dropping it stops the link.
    let _server = if cfg.network.enabled {
        let (tx, rx) = event_channel();
        builder = builder.with_inbox(rx);
        Some(WebServer::spawn(
            WebCfg {
                bind: cfg.network.bind.clone(),
                ws_path: cfg.network.ws_path.clone(),
                outbox_depth: cfg.network.outbox_depth,
            },
            tx,
        )?)
    } else {
        tracing::info!("network disabled");
        None
    };

    let mut instrument = builder.with_sensor(sensor).with_panel(panel).build()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
    }

    let summary = run(
        &mut instrument,
        &MonotonicClock::new(),
        idle,
        RunLimits {
            max_runtime_ms: duration_ms,
        },
        &shutdown,
    );
    let snapshot = instrument.snapshot();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "iterations": summary.iterations,
                "elapsed_ms": summary.elapsed_ms,
                "samples": summary.stats.samples,
                "sample_errors": summary.stats.sample_errors,
                "frames": summary.stats.frames,
                "broadcasts_sent": summary.stats.broadcasts_sent,
                "captures": summary.stats.captures,
                "state": snapshot,
            })
        );
    } else {
        println!(
            "Run complete: {:.2} mm after {} ms",
            snapshot.length, summary.elapsed_ms
        );
        if stats {
            print_stats(&summary);
        }
    }
    Ok(())
}

/// Loop statistics to stderr.
fn print_stats(summary: &RunSummary) {
    let s = &summary.stats;
    let secs = (summary.elapsed_ms as f64 / 1000.0).max(f64::EPSILON);
    eprintln!("\n--- Sag Meter Stats ---");
    eprintln!("Iterations: {}", summary.iterations);
    eprintln!(
        "Samples: {} ({:.0}/s), errors: {}",
        s.samples,
        s.samples as f64 / secs,
        s.sample_errors
    );
    eprintln!("Frames: {}", s.frames);
    eprintln!(
        "Broadcasts sent/skipped/dropped: {} / {} / {}",
        s.broadcasts_sent, s.broadcasts_skipped, s.broadcasts_dropped
    );
    eprintln!(
        "Captures: {}, unrecognized commands: {}",
        s.captures, s.unrecognized_commands
    );
    eprintln!("-----------------------\n");
}

/// One direct sensor read after the config and anchors checked out.
pub fn self_check(cfg: &Config, calibration: &Calibration, json: bool) -> CoreResult<()> {
    let mut sensor = build_sensor(&cfg.sensor)?;
    let raw = sensor
        .read()
        .map_err(|e| eyre::Report::new(sensor_fault(&*e)))?;
    let length = calibration.to_length(f32::from(raw));
    if json {
        println!(
            "{}",
            serde_json::json!({ "status": "ok", "raw": raw, "length": length })
        );
    } else {
        println!("ok (raw {raw}, {length:.2} mm unfiltered)");
    }
    Ok(())
}

/// Faults from a direct read are sensor faults, whatever the device said.
fn sensor_fault(e: &(dyn std::error::Error + 'static)) -> SagError {
    match map_hw_error(e) {
        SagError::Timeout => SagError::Timeout,
        SagError::Sensor(msg) | SagError::Io(msg) | SagError::Link(msg) | SagError::Config(msg) => {
            SagError::Sensor(msg)
        }
    }
}

/// Feed `samples` readings through the filter, back to back, and report the average.
pub fn probe(
    cfg: &Config,
    calibration: Calibration,
    samples: Option<usize>,
    json: bool,
) -> CoreResult<()> {
    let n = samples.unwrap_or(cfg.filter.window).max(1);
    // sampling on every step; display and broadcast never come due
    let schedule = ScheduleCfg {
        sample_ms: 1,
        display_ms: u32::MAX,
        broadcast_ms: u32::MAX,
        idle_us: 0,
    };
    let mut instrument = Instrument::builder()
        .with_filter((&cfg.filter).into())
        .with_schedule(schedule)
        .with_calibration(calibration)
        .with_sensor(build_sensor(&cfg.sensor)?)
        .with_panel(NullPanel)
        .build()?;

    let mut now: u32 = 0;
    for _ in 0..n {
        now = now.wrapping_add(2);
        instrument.step(now);
    }

    let stats = instrument.stats();
    if stats.samples == 0 {
        return Err(eyre::Report::new(SagError::Sensor(format!(
            "all {n} probe reads failed"
        ))));
    }
    let raw = instrument.last_filtered();
    let length = instrument.snapshot().length;
    let warm = instrument.is_warm();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "samples": stats.samples,
                "errors": stats.sample_errors,
                "raw": raw,
                "length": length,
                "warm": warm,
            })
        );
    } else {
        println!("raw {raw:.1} -> {length:.2} mm ({} samples)", stats.samples);
        if !warm {
            println!("note: fewer samples than the filter window; average is biased low");
        }
    }
    Ok(())
}
