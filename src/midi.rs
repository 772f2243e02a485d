//! Raw MIDI events and the small decode table used by the report.

use std::fmt;

use serde::Deserialize;

/// Status nibble for Note Off messages
pub const NOTE_OFF: i64 = 0x80;

/// Status nibble for Note On messages
pub const NOTE_ON: i64 = 0x90;

/// Status nibble for Control Change messages
pub const CONTROL_CHANGE: i64 = 0xB0;

/// Raw 3-byte MIDI message as captured by the looper.
///
/// Bytes are kept as signed integers because the snapshot does not validate
/// them; out-of-range and negative values still decode and print.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MidiEvent {
    /// Status byte (message type in the high nibble, channel in the low nibble)
    pub status: i64,
    /// First data byte
    pub data1: i64,
    /// Second data byte
    pub data2: i64,
}

impl MidiEvent {
    /// Create an event from its three raw bytes
    pub fn new(status: i64, data1: i64, data2: i64) -> Self {
        Self {
            status,
            data1,
            data2,
        }
    }

    /// Message type, i.e. the status byte with the channel bits cleared
    pub fn message_type(&self) -> i64 {
        self.status & 0xF0
    }

    /// 1-based channel number
    pub fn channel(&self) -> i64 {
        (self.status & 0x0F) + 1
    }

    /// Decode into the small set of messages the report knows how to label.
    pub fn decode(&self) -> MidiMessage {
        let channel = self.channel();
        match self.message_type() {
            NOTE_ON => MidiMessage::NoteOn {
                channel,
                note: self.data1,
                velocity: self.data2,
            },
            NOTE_OFF => MidiMessage::NoteOff {
                channel,
                note: self.data1,
                velocity: self.data2,
            },
            CONTROL_CHANGE => MidiMessage::ControlChange {
                channel,
                controller: self.data1,
                value: self.data2,
            },
            _ => MidiMessage::Other {
                status: self.status,
                data1: self.data1,
                data2: self.data2,
            },
        }
    }
}

/// Decoded view of a [`MidiEvent`].
///
/// Anything other than note on/off and CC falls through to `Other`, which
/// prints the raw status in hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MidiMessage {
    /// Note On (0x9n)
    NoteOn {
        channel: i64,
        note: i64,
        velocity: i64,
    },
    /// Note Off (0x8n)
    NoteOff {
        channel: i64,
        note: i64,
        velocity: i64,
    },
    /// Control Change (0xBn)
    ControlChange {
        channel: i64,
        controller: i64,
        value: i64,
    },
    /// Any other status byte, left undecoded
    Other {
        status: i64,
        data1: i64,
        data2: i64,
    },
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "Note On ch{channel}: note={note} vel={velocity}"),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "Note Off ch{channel}: note={note} vel={velocity}"),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => write!(f, "CC ch{channel}: cc={controller} val={value}"),
            MidiMessage::Other {
                status,
                data1,
                data2,
            } => {
                let sign = if status < 0 { "-" } else { "" };
                write!(
                    f,
                    "Status={sign}{:#x} data1={data1} data2={data2}",
                    status.unsigned_abs()
                )
            }
        }
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.decode(), f)
    }
}
