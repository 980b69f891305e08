use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{decode_frame, request_frame};

/// Potentiometer wiper on one MCP3008 channel.
pub struct Mcp3008 {
    spi: Spi,
    channel: u8,
}

impl Mcp3008 {
    pub fn new(bus: u8, channel: u8, clock_hz: u32) -> Result<Self> {
        if channel > 7 {
            return Err(HwError::Spi(format!("channel {channel} out of range 0..=7")));
        }
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(HwError::Spi(format!("unsupported spi bus {other}"))),
        };
        let spi = Spi::new(bus, SlaveSelect::Ss0, clock_hz, Mode::Mode0)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi, channel })
    }

    pub fn read_raw(&mut self) -> Result<u16> {
        let tx = request_frame(self.channel);
        let mut rx = [0u8; 3];
        let n = self
            .spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        if n < rx.len() {
            return Err(HwError::ShortTransfer(n));
        }
        let raw = decode_frame(rx);
        trace!(raw, channel = self.channel, "mcp3008 raw read");
        Ok(raw)
    }
}
