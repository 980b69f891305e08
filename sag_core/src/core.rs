//! The measurement loop body (`InstrumentCore`).
//!
//! Owns every piece of mutable measurement state: the sample filter, the sag
//! state machine, the scheduler and the tracked client. `step` is the
//! deterministic tick: give it the current millisecond counter and it drains
//! pending link events, then runs whichever of sample, display and broadcast
//! are due. Nothing in here blocks.

use sag_traits::{Panel, Sensor};

use crate::calibration::Calibration;
use crate::config::DisplayCfg;
use crate::filter::SampleFilter;
use crate::hw_error::map_hw_error;
use crate::link::{BroadcastOutcome, ClientId, Link, LinkEvent, LinkReceiver};
use crate::scheduler::Scheduler;
use crate::state::{CommandEvent, SagState, Snapshot};
use crate::status::{StepReport, Stats};

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct InstrumentCore<S: Sensor, P: Panel> {
    pub(crate) sensor: S,
    pub(crate) panel: P,
    pub(crate) filter: SampleFilter,
    pub(crate) calibration: Calibration,
    pub(crate) state: SagState,
    pub(crate) scheduler: Scheduler,
    pub(crate) display: DisplayCfg,
    pub(crate) link: Link,
    pub(crate) inbox: Option<LinkReceiver>,
    pub(crate) last_filtered: f32,
    pub(crate) warm_logged: bool,
    pub(crate) stats: Stats,
}

impl<S: Sensor, P: Panel> core::fmt::Debug for InstrumentCore<S, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InstrumentCore")
            .field("length", &self.state.length())
            .field("window", &self.filter.window())
            .field("client", &self.link.client_id())
            .finish()
    }
}

impl<S: Sensor, P: Panel> InstrumentCore<S, P> {
    /// One loop iteration at counter value `now_ms`.
    pub fn step(&mut self, now_ms: u32) -> StepReport {
        let mut report = StepReport {
            events: self.drain_inbox(),
            ..StepReport::default()
        };

        let due = self.scheduler.tick(now_ms);
        report.due = due;
        if due.sample {
            report.sample_failed = !self.sample_once();
        }
        if due.display {
            report.display_failed = !self.refresh_display();
        }
        if due.broadcast {
            report.broadcast = self.broadcast();
        }
        report
    }

    /// Apply every pending link event. Returns how many were handled.
    fn drain_inbox(&mut self) -> usize {
        let Some(rx) = self.inbox.take() else {
            return 0;
        };
        let mut n = 0;
        for ev in rx.try_iter() {
            self.handle_event(ev);
            n += 1;
        }
        self.inbox = Some(rx);
        n
    }

    pub fn handle_event(&mut self, ev: LinkEvent) {
        match ev {
            LinkEvent::Connected { id, outbox } => self.link.attach(id, outbox),
            LinkEvent::Disconnected { id } => {
                self.link.detach(id);
            }
            LinkEvent::Data { id, bytes } => {
                self.handle_command(id, &bytes);
            }
        }
    }

    /// Apply one inbound payload. Unknown commands are counted and logged only.
    pub fn handle_command(&mut self, id: ClientId, payload: &[u8]) -> CommandEvent {
        let ev = self.state.handle_payload(payload);
        match ev {
            CommandEvent::Captured { command, value } => {
                self.stats.captures += 1;
                tracing::debug!(client = id, ?command, value, "captured");
            }
            CommandEvent::Unrecognized(byte) => {
                self.stats.unrecognized_commands += 1;
                tracing::warn!(client = id, ?byte, "unrecognized command");
            }
        }
        ev
    }

    /// Read, filter, convert. Returns false if the sensor read failed.
    fn sample_once(&mut self) -> bool {
        let raw = match self.sensor.read() {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.sample_errors += 1;
                let err = map_hw_error(&*e);
                tracing::warn!(error = %err, "sensor read failed; sample skipped");
                return false;
            }
        };
        let filtered = self.filter.push_and_average(raw);
        let length = self.calibration.to_length(filtered);
        self.last_filtered = filtered;
        self.state.update_length(length);
        self.stats.samples += 1;
        if !self.warm_logged && self.filter.is_warm() {
            self.warm_logged = true;
            tracing::info!(window = self.filter.window(), "filter window filled");
        }
        tracing::trace!(raw, filtered, length, "sample");
        true
    }

    fn refresh_display(&mut self) -> bool {
        let rows = self.state.snapshot().rows(&self.display.unit);
        match self.panel.draw(&rows) {
            Ok(()) => {
                self.stats.frames += 1;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "panel draw failed");
                false
            }
        }
    }

    fn broadcast(&mut self) -> BroadcastOutcome {
        if !self.link.is_connected() {
            self.stats.broadcasts_skipped += 1;
            return BroadcastOutcome::Skipped;
        }
        let text = match self.state.snapshot().to_json() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "payload encode failed");
                return BroadcastOutcome::Dropped;
            }
        };
        let outcome = self.link.send(text);
        match outcome {
            BroadcastOutcome::Sent => self.stats.broadcasts_sent += 1,
            BroadcastOutcome::Dropped => self.stats.broadcasts_dropped += 1,
            BroadcastOutcome::Detached | BroadcastOutcome::Skipped => {
                self.stats.broadcasts_skipped += 1
            }
            BroadcastOutcome::NotDue => {}
        }
        outcome
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Moving average from the most recent successful sample.
    pub fn last_filtered(&self) -> f32 {
        self.last_filtered
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn is_client_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn is_warm(&self) -> bool {
        self.filter.is_warm()
    }
}
