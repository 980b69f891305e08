//! MCP3008 frame layout, kept free of any bus access so it can be tested anywhere.

/// Bytes clocked out to start a single-ended conversion on `channel` (0..=7).
///
/// Byte 0 holds the start bit, byte 1 the single-ended flag and channel in
/// its upper nibble, byte 2 is padding while the result clocks back.
#[inline]
pub fn request_frame(channel: u8) -> [u8; 3] {
    [0x01, (0x08 | (channel & 0x07)) << 4, 0x00]
}

/// 10-bit conversion result from the bytes clocked back.
#[inline]
pub fn decode_frame(rx: [u8; 3]) -> u16 {
    (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2])
}
