//! Blocking driver for the cooperative loop.
//!
//! Reads the clock once per iteration, hands the wrapped millisecond counter
//! to `Instrument::step`, then idles briefly so an otherwise empty loop does
//! not spin a core. The idle pause must stay well below the shortest task
//! period for every task to run at its own cadence.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sag_traits::clock::Clock;

use crate::builder::Instrument;
use crate::status::Stats;

/// When the loop should stop besides an external shutdown request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    /// Stop once this much time has elapsed. `None` runs until shutdown.
    pub max_runtime_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub elapsed_ms: u64,
    pub stats: Stats,
}

/// Drive `instrument` until `shutdown` is set or `limits` are reached.
pub fn run<C: Clock>(
    instrument: &mut Instrument,
    clock: &C,
    idle: Duration,
    limits: RunLimits,
    shutdown: &AtomicBool,
) -> RunSummary {
    let epoch = clock.now();
    let mut iterations: u64 = 0;
    tracing::info!(idle_us = idle.as_micros() as u64, max_runtime_ms = ?limits.max_runtime_ms, "loop start");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if let Some(limit) = limits.max_runtime_ms
            && clock.ms_since(epoch) >= limit
        {
            tracing::debug!(limit, "runtime limit reached");
            break;
        }

        let now_ms = clock.wrapping_ms_since(epoch);
        let report = instrument.step(now_ms);
        if report.due.any() {
            tracing::trace!(now_ms, ?report, "tick");
        }
        iterations += 1;
        clock.sleep(idle);
    }

    let summary = RunSummary {
        iterations,
        elapsed_ms: clock.ms_since(epoch),
        stats: instrument.stats(),
    };
    tracing::info!(
        iterations = summary.iterations,
        elapsed_ms = summary.elapsed_ms,
        samples = summary.stats.samples,
        frames = summary.stats.frames,
        broadcasts = summary.stats.broadcasts_sent,
        "loop stopped"
    );
    summary
}
