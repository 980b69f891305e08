//! Test and helper mocks for sag_core

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use sag_traits::{Panel, RawSample, Sensor};

/// A panel that discards every frame; used when no display is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPanel;

impl Panel for NullPanel {
    fn draw(&mut self, _rows: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A panel that keeps every frame; clones share the same history.
#[derive(Debug, Default, Clone)]
pub struct RecordingPanel {
    frames: Rc<RefCell<Vec<Vec<String>>>>,
}

impl RecordingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Vec<String>> {
        self.frames.borrow().clone()
    }

    pub fn last(&self) -> Option<Vec<String>> {
        self.frames.borrow().last().cloned()
    }
}

impl Panel for RecordingPanel {
    fn draw(&mut self, rows: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.frames.borrow_mut().push(rows.to_vec());
        Ok(())
    }
}

/// A sensor that replays queued readings, then repeats the last one.
///
/// `None` entries produce a read error. Clones share the same queue so a test
/// can keep feeding readings after handing the sensor to an instrument.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSensor {
    queue: Rc<RefCell<VecDeque<Option<RawSample>>>>,
    last: Rc<RefCell<RawSample>>,
}

impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensor that always reads `raw`.
    pub fn constant(raw: RawSample) -> Self {
        let s = Self::default();
        *s.last.borrow_mut() = raw;
        s
    }

    pub fn push(&self, raw: RawSample) {
        self.queue.borrow_mut().push_back(Some(raw));
    }

    pub fn push_error(&self) {
        self.queue.borrow_mut().push_back(None);
    }

    /// Replace the steady-state value returned once the queue is empty.
    pub fn set(&self, raw: RawSample) {
        self.queue.borrow_mut().clear();
        *self.last.borrow_mut() = raw;
    }
}

impl Sensor for ScriptedSensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        match self.queue.borrow_mut().pop_front() {
            Some(Some(raw)) => {
                *self.last.borrow_mut() = raw;
                Ok(raw)
            }
            Some(None) => Err("scripted sensor fault".into()),
            None => Ok(*self.last.borrow()),
        }
    }
}
