//! Type-state builder for `Instrument` and generic `build_instrument` constructor.
//!
//! The builder enforces at compile time that a Sensor and a Panel are provided
//! before `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;

use sag_traits::{Panel, Sensor};

use crate::calibration::Calibration;
use crate::config::{DisplayCfg, FilterCfg, ScheduleCfg};
use crate::core::InstrumentCore;
use crate::error::{BuildError, Result};
use crate::filter::SampleFilter;
use crate::link::{ClientId, Link, LinkEvent, LinkReceiver};
use crate::scheduler::Scheduler;
use crate::state::{CommandEvent, SagState, Snapshot};
use crate::status::{StepReport, Stats};

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Public dynamic (boxed) instrument.
pub struct Instrument {
    pub(crate) inner: InstrumentCore<Box<dyn Sensor>, Box<dyn Panel>>,
}

impl core::fmt::Debug for Instrument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Instrument")
            .field("length", &self.inner.state.length())
            .field("client", &self.inner.link.client_id())
            .finish()
    }
}

impl Instrument {
    /// Start building an Instrument.
    pub fn builder() -> InstrumentBuilder<Missing, Missing> {
        InstrumentBuilder::default()
    }

    /// One loop iteration at counter value `now_ms`.
    pub fn step(&mut self, now_ms: u32) -> StepReport {
        self.inner.step(now_ms)
    }

    /// Apply a single link event immediately.
    pub fn handle_event(&mut self, ev: LinkEvent) {
        self.inner.handle_event(ev);
    }

    /// Apply one inbound command payload immediately.
    pub fn handle_command(&mut self, id: ClientId, payload: &[u8]) -> CommandEvent {
        self.inner.handle_command(id, payload)
    }

    /// Copy of the current measurement state.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot()
    }

    /// Moving average from the most recent successful sample.
    pub fn last_filtered(&self) -> f32 {
        self.inner.last_filtered()
    }

    pub fn calibration(&self) -> &Calibration {
        self.inner.calibration()
    }

    pub fn is_client_connected(&self) -> bool {
        self.inner.is_client_connected()
    }

    pub fn is_warm(&self) -> bool {
        self.inner.is_warm()
    }

    pub fn stats(&self) -> Stats {
        self.inner.stats()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

/// Type-state marker: value not provided.
pub struct Missing;
/// Type-state marker: value provided.
pub struct Set;

// ── Builder ──────────────────────────────────────────────────────────────────

/// Type-state builder. `S`/`P` track whether sensor and panel were set.
pub struct InstrumentBuilder<S, P> {
    sensor: Option<Box<dyn Sensor>>,
    panel: Option<Box<dyn Panel>>,
    filter: FilterCfg,
    schedule: ScheduleCfg,
    display: DisplayCfg,
    calibration: Option<Calibration>,
    inbox: Option<LinkReceiver>,
    _s: PhantomData<S>,
    _p: PhantomData<P>,
}

impl<S, P> std::fmt::Debug for InstrumentBuilder<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentBuilder")
            .field("sensor", &self.sensor.is_some())
            .field("panel", &self.panel.is_some())
            .field("filter", &self.filter)
            .field("schedule", &self.schedule)
            .field("display", &self.display)
            .field("calibration", &self.calibration)
            .field("inbox", &self.inbox.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for InstrumentBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            panel: None,
            filter: FilterCfg::default(),
            schedule: ScheduleCfg::default(),
            display: DisplayCfg::default(),
            calibration: None,
            inbox: None,
            _s: PhantomData,
            _p: PhantomData,
        }
    }
}

impl<S, P> InstrumentBuilder<S, P> {
    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleCfg) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_display(mut self, display: DisplayCfg) -> Self {
        self.display = display;
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// Fails with a configuration fault when the anchors are equal.
    pub fn with_anchors(self, raw_at_zero: u16, raw_at_hundred: u16) -> Result<Self> {
        let calibration = Calibration::new(raw_at_zero, raw_at_hundred)?;
        Ok(self.with_calibration(calibration))
    }

    /// Receiver drained once per `step` for link events.
    pub fn with_inbox(mut self, inbox: LinkReceiver) -> Self {
        self.inbox = Some(inbox);
        self
    }

    pub fn with_sensor(self, sensor: impl Sensor + 'static) -> InstrumentBuilder<Set, P> {
        InstrumentBuilder {
            sensor: Some(Box::new(sensor)),
            panel: self.panel,
            filter: self.filter,
            schedule: self.schedule,
            display: self.display,
            calibration: self.calibration,
            inbox: self.inbox,
            _s: PhantomData,
            _p: PhantomData,
        }
    }

    pub fn with_panel(self, panel: impl Panel + 'static) -> InstrumentBuilder<S, Set> {
        InstrumentBuilder {
            sensor: self.sensor,
            panel: Some(Box::new(panel)),
            filter: self.filter,
            schedule: self.schedule,
            display: self.display,
            calibration: self.calibration,
            inbox: self.inbox,
            _s: PhantomData,
            _p: PhantomData,
        }
    }

    /// Build with runtime checks regardless of type-state.
    pub fn try_build(self) -> Result<Instrument> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let panel = self
            .panel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPanel))?;
        let calibration = self.calibration.unwrap_or_default();
        let inner = build_instrument(
            sensor,
            panel,
            self.filter,
            self.schedule,
            self.display,
            calibration,
            self.inbox,
        )?;
        Ok(Instrument { inner })
    }
}

impl InstrumentBuilder<Set, Set> {
    /// Build the instrument. Available once sensor and panel are set.
    pub fn build(self) -> Result<Instrument> {
        self.try_build()
    }
}

/// Construct a statically dispatched core.
pub fn build_instrument<S: Sensor, P: Panel>(
    sensor: S,
    panel: P,
    filter: FilterCfg,
    schedule: ScheduleCfg,
    display: DisplayCfg,
    calibration: Calibration,
    inbox: Option<LinkReceiver>,
) -> Result<InstrumentCore<S, P>> {
    if schedule.sample_ms == 0 || schedule.display_ms == 0 || schedule.broadcast_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "schedule periods must be >= 1 ms",
        )));
    }
    let filter = SampleFilter::new(filter.window)?;
    tracing::info!(
        window = filter.window(),
        sample_ms = schedule.sample_ms,
        display_ms = schedule.display_ms,
        broadcast_ms = schedule.broadcast_ms,
        scale = calibration.scale(),
        "instrument ready"
    );
    Ok(InstrumentCore {
        sensor,
        panel,
        filter,
        calibration,
        state: SagState::new(),
        scheduler: Scheduler::new(&schedule),
        display,
        link: Link::new(),
        inbox,
        last_filtered: 0.0,
        warm_logged: false,
        stats: Stats::default(),
    })
}
