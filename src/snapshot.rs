//! Snapshot loading and the looper slot data model.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::midi::MidiEvent;

/// Slot tag the looper writes its own state under
pub const LOOPER_GUID: &str = "VLOP";

/// Errors raised while loading a snapshot
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    /// Snapshot file could not be read
    #[error("failed to read snapshot '{}': {source}", .path.display())]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Snapshot is not valid JSON or lacks the `slots` array
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// The looper slot was found but its fields do not have the expected shape
    #[error("slot '{guid}' is malformed: {source}")]
    Slot {
        /// Tag of the offending slot
        guid: String,
        /// Underlying deserialization error
        source: serde_json::Error,
    },
}

/// Root of a captured device snapshot.
///
/// Slots belong to many different algorithms and are kept as raw JSON until
/// one of them is picked out, so that unrelated slot shapes never fail the
/// load.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    /// Every algorithm slot in the preset, in file order
    pub slots: Vec<Value>,
}

impl Snapshot {
    /// First slot whose `guid` equals `guid`
    pub fn find_slot(&self, guid: &str) -> Option<&Value> {
        self.slots
            .iter()
            .find(|slot| slot.get("guid").and_then(Value::as_str) == Some(guid))
    }

    /// Locate and decode the looper slot tagged `guid`.
    ///
    /// Returns `Ok(None)` when no slot carries that tag.
    pub fn looper(&self, guid: &str) -> Result<Option<LooperSlot>, SnapshotError> {
        let Some(raw) = self.find_slot(guid) else {
            debug!("no slot tagged '{}' among {} slots", guid, self.slots.len());
            return Ok(None);
        };

        let slot = LooperSlot::deserialize(raw).map_err(|source| SnapshotError::Slot {
            guid: guid.to_string(),
            source,
        })?;

        debug!(
            "slot '{}': loop_length={}, current_pulse={}, {} buckets",
            guid,
            slot.loop_length,
            slot.current_pulse,
            slot.buckets.len()
        );

        if slot.current_pulse >= slot.loop_length {
            warn!(
                "current pulse {} is outside the loop (length {})",
                slot.current_pulse, slot.loop_length
            );
        }
        if slot.buckets.len() as i64 > slot.loop_length {
            warn!(
                "{} buckets recorded for a loop of {} pulses",
                slot.buckets.len(),
                slot.loop_length
            );
        }

        Ok(Some(slot))
    }
}

/// Looper state at the moment the snapshot was taken
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LooperSlot {
    /// Number of pulses in the loop
    pub loop_length: i64,
    /// Pulse the looper was on when it crashed
    pub current_pulse: i64,
    /// Recording flag
    pub is_recording: bool,
    /// Playback flag
    pub is_playing: bool,
    /// Debug counters; zeroed when absent
    #[serde(default)]
    pub debug: Counters,
    /// Sparse per-pulse event buckets, only pulses with events are present
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// Debug counters maintained by the looper's step routine
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Counters {
    /// Calls to the per-tick step routine
    pub step_call_count: i64,
    /// Clock edges received
    pub total_clock_edges: i64,
    /// MIDI messages received
    pub total_midi_received: i64,
    /// MIDI messages sent
    pub total_midi_sent: i64,
    /// Pulse at which `last_midi_sent` went out
    pub last_pulse_with_midi: i64,
    /// Most recent outgoing message
    pub last_midi_sent: MidiEvent,
}

/// Events scheduled for a single pulse, in send order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bucket {
    /// Pulse this bucket fires on
    pub pulse: i64,
    /// Events to send, first element goes out next
    #[serde(default)]
    pub events: Vec<MidiEvent>,
}

/// Parse a snapshot from JSON text
pub fn parse_snapshot(json: &str) -> Result<Snapshot, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a snapshot file
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot, SnapshotError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let snapshot = parse_snapshot(&json)?;
    debug!(
        "loaded '{}': {} slots",
        path.display(),
        snapshot.slots.len()
    );

    Ok(snapshot)
}
