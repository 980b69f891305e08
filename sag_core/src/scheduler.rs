//! Cooperative periodic scheduler.
//!
//! Three tasks run at independent periods. Each `tick` takes one reading of a
//! free-running millisecond counter and marks every task whose elapsed time
//! exceeds its period. Elapsed time uses `wrapping_sub`, so counter rollover
//! is harmless. A fired task's timestamp is set to `now`, not advanced by one
//! period, so a stalled loop never produces a burst of catch-up runs.

use crate::config::ScheduleCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Sample,
    Display,
    Broadcast,
}

impl Task {
    pub const ALL: [Task; 3] = [Task::Sample, Task::Display, Task::Broadcast];

    #[inline]
    fn index(self) -> usize {
        match self {
            Task::Sample => 0,
            Task::Display => 1,
            Task::Broadcast => 2,
        }
    }
}

/// Which tasks a tick found due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub sample: bool,
    pub display: bool,
    pub broadcast: bool,
}

impl Due {
    pub fn is(&self, task: Task) -> bool {
        match task {
            Task::Sample => self.sample,
            Task::Display => self.display,
            Task::Broadcast => self.broadcast,
        }
    }

    pub fn any(&self) -> bool {
        self.sample || self.display || self.broadcast
    }
}

#[inline]
fn elapsed_exceeds(now_ms: u32, last_ms: u32, period_ms: u32) -> bool {
    now_ms.wrapping_sub(last_ms) > period_ms
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    periods: [u32; 3],
    last: [u32; 3],
}

impl Scheduler {
    /// All tasks start as if last fired at counter value 0.
    pub fn new(cfg: &ScheduleCfg) -> Self {
        Self {
            periods: [cfg.sample_ms, cfg.display_ms, cfg.broadcast_ms],
            last: [0; 3],
        }
    }

    pub fn tick(&mut self, now_ms: u32) -> Due {
        let mut due = Due::default();
        for task in Task::ALL {
            let i = task.index();
            if elapsed_exceeds(now_ms, self.last[i], self.periods[i]) {
                self.last[i] = now_ms;
                match task {
                    Task::Sample => due.sample = true,
                    Task::Display => due.display = true,
                    Task::Broadcast => due.broadcast = true,
                }
            }
        }
        due
    }

    pub fn period(&self, task: Task) -> u32 {
        self.periods[task.index()]
    }

    pub fn last_fired(&self, task: Task) -> u32 {
        self.last[task.index()]
    }
}
