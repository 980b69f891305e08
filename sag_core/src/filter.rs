//! Fixed-window moving average over raw sensor readings.

use sag_traits::RawSample;

use crate::error::{BuildError, Result};

/// Circular buffer of the most recent `window` raw samples.
///
/// The buffer starts zero-filled and the average always divides by the full
/// window, so the first `window` pushes read low. `is_warm` reports when every
/// slot holds a real sample.
#[derive(Debug, Clone)]
pub struct SampleFilter {
    buf: Box<[RawSample]>,
    cursor: usize,
    // Exact integer sum of `buf`; u64 cannot overflow for window <= u32::MAX.
    sum: u64,
    pushes: u64,
}

impl SampleFilter {
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "filter window must be >= 1",
            )));
        }
        Ok(Self {
            buf: vec![0; window].into_boxed_slice(),
            cursor: 0,
            sum: 0,
            pushes: 0,
        })
    }

    /// Overwrite the oldest slot with `raw` and return the mean of all slots.
    pub fn push_and_average(&mut self, raw: RawSample) -> f32 {
        let slot = &mut self.buf[self.cursor];
        self.sum = self.sum - u64::from(*slot) + u64::from(raw);
        *slot = raw;
        self.cursor = (self.cursor + 1) % self.buf.len();
        self.pushes = self.pushes.saturating_add(1);
        self.average()
    }

    /// Mean over the whole window, including zero slots during warm-up.
    pub fn average(&self) -> f32 {
        (self.sum as f64 / self.buf.len() as f64) as f32
    }

    pub fn window(&self) -> usize {
        self.buf.len()
    }

    /// True once at least `window` samples have been pushed.
    pub fn is_warm(&self) -> bool {
        self.pushes >= self.buf.len() as u64
    }
}
