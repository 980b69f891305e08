//! Sag capture state: the latest length plus three operator-triggered snapshots.

use serde::Serialize;

use crate::error::{Result, SagError};

/// Capture commands, one per inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `m`: remember the current length as the unloaded reference.
    Max,
    /// `s`: static sag relative to the reference.
    Static,
    /// `d`: dynamic sag relative to the reference.
    Dynamic,
}

impl Command {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'm' => Some(Self::Max),
            b's' => Some(Self::Static),
            b'd' => Some(Self::Dynamic),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Max => b'm',
            Self::Static => b's',
            Self::Dynamic => b'd',
        }
    }
}

/// Result of handing one inbound payload to the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandEvent {
    /// The command ran; `value` is the field it wrote.
    Captured { command: Command, value: f32 },
    /// First byte was not a known command (`None` for an empty payload).
    Unrecognized(Option<u8>),
}

/// Copy-out view of the measurement state, in payload field order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Snapshot {
    pub length: f32,
    #[serde(rename = "max")]
    pub max_length: f32,
    #[serde(rename = "static")]
    pub static_sag: f32,
    #[serde(rename = "dynamic")]
    pub dynamic_sag: f32,
    #[serde(rename = "relative")]
    pub relative_length: f32,
}

impl Snapshot {
    /// Compact JSON object with keys `length`, `max`, `static`, `dynamic`, `relative`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| eyre::Report::new(SagError::Link(format!("encode payload: {e}"))))
    }

    /// The four display rows, in fixed order.
    pub fn rows(&self, unit: &str) -> [String; 4] {
        [
            format!("Length: {:.2} {unit}", self.length),
            format!("Relative: {:.2} {unit}", self.relative_length),
            format!("Static: {:.2} {unit}", self.static_sag),
            format!("Dynamic: {:.2} {unit}", self.dynamic_sag),
        ]
    }
}

/// Single always-valid state. Only `update_length` and `apply` mutate it.
#[derive(Debug, Clone, Default)]
pub struct SagState {
    length: f32,
    relative_length: f32,
    max_length: f32,
    static_sag: f32,
    dynamic_sag: f32,
}

impl SagState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest computed length and refresh the relative length.
    pub fn update_length(&mut self, length: f32) {
        self.length = length;
        self.relative_length = self.max_length - length;
    }

    pub fn apply(&mut self, command: Command) -> f32 {
        match command {
            Command::Max => {
                self.max_length = self.length;
                self.max_length
            }
            Command::Static => {
                self.static_sag = self.max_length - self.length;
                self.static_sag
            }
            Command::Dynamic => {
                self.dynamic_sag = self.max_length - self.length;
                self.dynamic_sag
            }
        }
    }

    /// Dispatch on the first byte of an inbound payload; the rest is ignored.
    pub fn handle_payload(&mut self, payload: &[u8]) -> CommandEvent {
        let first = payload.first().copied();
        match first.and_then(Command::from_byte) {
            Some(command) => CommandEvent::Captured {
                command,
                value: self.apply(command),
            },
            None => CommandEvent::Unrecognized(first),
        }
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            length: self.length,
            max_length: self.max_length,
            static_sag: self.static_sag,
            dynamic_sag: self.dynamic_sag,
            relative_length: self.relative_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_static_dynamic_sequence() {
        let mut s = SagState::new();
        s.update_length(120.0);
        s.apply(Command::Max);
        s.update_length(90.0);
        s.apply(Command::Static);
        s.update_length(60.0);
        s.apply(Command::Dynamic);
        let snap = s.snapshot();
        assert_eq!(snap.max_length, 120.0);
        assert_eq!(snap.static_sag, 30.0);
        assert_eq!(snap.dynamic_sag, 60.0);
        assert_eq!(snap.relative_length, 60.0);
    }

    #[test]
    fn capture_uses_latest_length() {
        let mut s = SagState::new();
        s.update_length(10.0);
        s.update_length(42.0);
        assert_eq!(s.apply(Command::Max), 42.0);
    }

    #[test]
    fn relative_tracks_new_max_on_next_update() {
        let mut s = SagState::new();
        s.update_length(50.0);
        assert_eq!(s.snapshot().relative_length, -50.0);
        s.apply(Command::Max);
        // relative is refreshed by sampling, not by the capture
        assert_eq!(s.snapshot().relative_length, -50.0);
        s.update_length(45.0);
        assert_eq!(s.snapshot().relative_length, 5.0);
    }

    #[test]
    fn payload_uses_first_byte_only() {
        let mut s = SagState::new();
        s.update_length(7.5);
        assert_eq!(
            s.handle_payload(b"mxyz"),
            CommandEvent::Captured {
                command: Command::Max,
                value: 7.5
            }
        );
    }

    #[test]
    fn unknown_and_empty_payloads_are_reported() {
        let mut s = SagState::new();
        assert_eq!(s.handle_payload(b"x"), CommandEvent::Unrecognized(Some(b'x')));
        assert_eq!(s.handle_payload(b""), CommandEvent::Unrecognized(None));
        // capitals are not commands
        assert_eq!(s.handle_payload(b"M"), CommandEvent::Unrecognized(Some(b'M')));
    }

    #[test]
    fn command_bytes_round_trip() {
        for c in [Command::Max, Command::Static, Command::Dynamic] {
            assert_eq!(Command::from_byte(c.as_byte()), Some(c));
        }
    }

    #[test]
    fn payload_json_field_names_and_order() {
        let snap = Snapshot {
            length: 1.5,
            max_length: 2.0,
            static_sag: 0.25,
            dynamic_sag: 0.5,
            relative_length: 0.5,
        };
        assert_eq!(
            snap.to_json().unwrap(),
            r#"{"length":1.5,"max":2.0,"static":0.25,"dynamic":0.5,"relative":0.5}"#
        );
    }

    #[test]
    fn display_rows_have_fixed_labels() {
        let snap = Snapshot {
            length: 12.345,
            max_length: 20.0,
            static_sag: 3.0,
            dynamic_sag: 4.5,
            relative_length: 7.655,
        };
        let rows = snap.rows("mm");
        assert_eq!(rows[0], "Length: 12.35 mm");
        assert_eq!(rows[1], "Relative: 7.66 mm");
        assert_eq!(rows[2], "Static: 3.00 mm");
        assert_eq!(rows[3], "Dynamic: 4.50 mm");
    }
}
