pub mod error;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mcp3008;

use sag_traits::{RawSample, Sensor};

/// Simulated potentiometer sweeping between two raw values.
///
/// Each read returns the current value, then moves it `step` counts toward
/// the far end, turning around at `low` and `high`. A zero step or equal
/// bounds hold the value still.
#[derive(Debug, Clone)]
pub struct SimulatedPot {
    low: RawSample,
    high: RawSample,
    step: RawSample,
    value: RawSample,
    rising: bool,
}

impl SimulatedPot {
    pub fn new(low: RawSample, high: RawSample, step: RawSample) -> Self {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        SimulatedPot {
            low,
            high,
            step,
            value: low,
            rising: true,
        }
    }

    /// A pot parked at one value.
    pub fn fixed(raw: RawSample) -> Self {
        Self::new(raw, raw, 0)
    }

    fn advance(&mut self) {
        if self.rising {
            let next = self.value.saturating_add(self.step);
            if next >= self.high {
                self.value = self.high;
                self.rising = false;
            } else {
                self.value = next;
            }
        } else {
            let next = self.value.saturating_sub(self.step);
            if next <= self.low {
                self.value = self.low;
                self.rising = true;
            } else {
                self.value = next;
            }
        }
    }
}

impl Sensor for SimulatedPot {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self.value;
        self.advance();
        Ok(raw)
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hardware {
    pub use crate::mcp3008::Mcp3008;
    use sag_traits::{RawSample, Sensor};

    /// MCP3008 channel as a `Sensor`.
    pub struct HardwarePot {
        adc: Mcp3008,
    }

    impl HardwarePot {
        pub fn try_new(bus: u8, channel: u8, clock_hz: u32) -> Result<Self, crate::error::HwError> {
            let adc = Mcp3008::new(bus, channel, clock_hz)?;
            tracing::info!(bus, channel, clock_hz, "mcp3008 opened");
            Ok(HardwarePot { adc })
        }
    }

    impl Sensor for HardwarePot {
        fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
            match self.adc.read_raw() {
                Ok(raw) => Ok(raw),
                Err(e) => {
                    tracing::error!("ADC read error: {}", e);
                    Err(e.into())
                }
            }
        }
    }
}
