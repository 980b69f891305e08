//! Runtime configuration types for the measurement loop.
//!
//! These are the structs consumed by `Instrument` and the runner. They are
//! separate from the TOML-deserialized config in `sag_config`.

/// Filter configuration for signal conditioning.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Moving average window size in samples.
    pub window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { window: 128 }
    }
}

/// Task periods for the cooperative scheduler.
#[derive(Debug, Clone)]
pub struct ScheduleCfg {
    pub sample_ms: u32,
    pub display_ms: u32,
    pub broadcast_ms: u32,
    /// Pause between loop iterations in microseconds (0 = spin).
    pub idle_us: u64,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            sample_ms: 1,
            display_ms: 100,
            broadcast_ms: 100,
            idle_us: 200,
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone)]
pub struct DisplayCfg {
    /// Unit label appended to every display row.
    pub unit: String,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            unit: "mm".to_string(),
        }
    }
}
