//! `From` implementations bridging `sag_config` types to `sag_core` types.

use crate::calibration::Calibration;
use crate::config::{DisplayCfg, FilterCfg, ScheduleCfg};

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&sag_config::FilterCfg> for FilterCfg {
    fn from(c: &sag_config::FilterCfg) -> Self {
        Self { window: c.window }
    }
}

// ── ScheduleCfg ──────────────────────────────────────────────────────────────

impl From<&sag_config::ScheduleCfg> for ScheduleCfg {
    fn from(c: &sag_config::ScheduleCfg) -> Self {
        Self {
            sample_ms: c.sample_ms,
            display_ms: c.display_ms,
            broadcast_ms: c.broadcast_ms,
            idle_us: c.idle_us,
        }
    }
}

// ── DisplayCfg ───────────────────────────────────────────────────────────────

impl From<&sag_config::DisplayCfg> for DisplayCfg {
    fn from(c: &sag_config::DisplayCfg) -> Self {
        Self {
            unit: c.unit.clone(),
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl TryFrom<&sag_config::Anchors> for Calibration {
    type Error = eyre::Report;
    fn try_from(a: &sag_config::Anchors) -> Result<Self, Self::Error> {
        Calibration::new(a.raw_at_zero, a.raw_at_hundred)
    }
}
