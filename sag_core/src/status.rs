//! What one loop iteration did.

use crate::link::BroadcastOutcome;
use crate::scheduler::Due;

/// Side effects of a single `step`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Tasks the scheduler found due.
    pub due: Due,
    /// Link events drained before the tasks ran.
    pub events: usize,
    /// Sampling was due but the sensor read failed; state is unchanged.
    pub sample_failed: bool,
    /// Display was due but the panel rejected the frame.
    pub display_failed: bool,
    pub broadcast: BroadcastOutcome,
}

/// Running totals across the instrument's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub samples: u64,
    pub sample_errors: u64,
    pub frames: u64,
    pub broadcasts_sent: u64,
    pub broadcasts_skipped: u64,
    pub broadcasts_dropped: u64,
    pub captures: u64,
    pub unrecognized_commands: u64,
}
