//! Offline crash analysis for the VLoop MIDI step-looper.
//!
//! The looper dumps its internal state into the device preset when it
//! crashes. This crate reads that JSON snapshot, picks out the looper's slot
//! and prints a plain-text report: playback state, debug counters, the last
//! MIDI message sent and the contents of the event buckets around the pulse
//! the looper died on.
//!
//! ```no_run
//! use vloop_crash::{generate_report, ReportOptions};
//!
//! generate_report("vltest.json", &ReportOptions::default()).unwrap();
//! ```

#![warn(missing_docs)]

pub mod midi;
pub mod report;
pub mod snapshot;

pub use midi::{MidiEvent, MidiMessage};
pub use report::{generate_report, write_report, ReportOptions, ReportOutcome};
pub use snapshot::{load_snapshot, parse_snapshot, Snapshot, SnapshotError, LOOPER_GUID};
