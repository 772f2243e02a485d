//! Crash report statistics and text rendering.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use log::debug;

use crate::snapshot::{load_snapshot, Bucket, LooperSlot, Snapshot, LOOPER_GUID};

/// Width of the banner rules around the report title
const BANNER_WIDTH: usize = 70;

/// Default half-width of the surrounding-buckets window
pub const DEFAULT_WINDOW: u32 = 3;

/// Knobs for a single report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Tag of the slot holding the looper state
    pub slot_guid: String,
    /// Buckets within this many pulses of the crash are listed as context
    pub window: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            slot_guid: LOOPER_GUID.to_string(),
            window: DEFAULT_WINDOW,
        }
    }
}

/// How a report run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Full report written
    Written,
    /// Only the slot-not-found diagnostic was written
    SlotNotFound,
}

/// Aggregate bucket occupancy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BucketStats {
    /// Buckets present, i.e. pulses with at least one recorded event
    pub non_empty: usize,
    /// Sum of events across all buckets
    pub total_events: usize,
    /// Largest single bucket, 0 when there are none
    pub max_events: usize,
}

impl BucketStats {
    /// Tally a bucket sequence
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        Self {
            non_empty: buckets.len(),
            total_events: buckets.iter().map(|b| b.events.len()).sum(),
            max_events: buckets.iter().map(|b| b.events.len()).max().unwrap_or(0),
        }
    }
}

/// Ratios derived from the debug counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceStats {
    /// step() invocations per received clock edge
    pub step_calls_per_clock: f64,
    /// Clock edges divided by loop length; `None` for an empty loop
    pub loops_played: Option<f64>,
}

impl PerformanceStats {
    /// `None` when no clock edge was ever seen
    pub fn from_slot(slot: &LooperSlot) -> Option<Self> {
        let edges = slot.debug.total_clock_edges;
        if edges <= 0 {
            return None;
        }

        let loops_played = if slot.loop_length > 0 {
            Some(edges as f64 / slot.loop_length as f64)
        } else {
            None
        };

        Some(Self {
            step_calls_per_clock: slot.debug.step_call_count as f64 / edges as f64,
            loops_played,
        })
    }
}

/// Bucket scheduled on the crash pulse, if any
pub fn crash_bucket(slot: &LooperSlot) -> Option<&Bucket> {
    slot.buckets.iter().find(|b| b.pulse == slot.current_pulse)
}

/// Buckets whose pulse lies in `[center - window, center + window]`, in stored order
pub fn surrounding_buckets(
    buckets: &[Bucket],
    center: i64,
    window: u32,
) -> impl Iterator<Item = &Bucket> {
    let lo = center.saturating_sub(window as i64);
    let hi = center.saturating_add(window as i64);
    buckets.iter().filter(move |b| (lo..=hi).contains(&b.pulse))
}

/// Format an integer with `,` between groups of three digits
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

fn bool_label(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

/// Render the full crash analysis for an already-located looper slot.
pub fn write_looper_report<W: Write>(
    slot: &LooperSlot,
    options: &ReportOptions,
    out: &mut W,
) -> io::Result<()> {
    let rule = "=".repeat(BANNER_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "VLoop CRASH ANALYSIS")?;
    writeln!(out, "{rule}")?;

    writeln!(out, "\n=== PLAYBACK STATE ===")?;
    writeln!(out, "Loop Length:    {} pulses", slot.loop_length)?;
    writeln!(out, "Current Pulse:  {} <-- CRASHED HERE", slot.current_pulse)?;
    writeln!(out, "Is Recording:   {}", bool_label(slot.is_recording))?;
    writeln!(out, "Is Playing:     {}", bool_label(slot.is_playing))?;

    let counters = &slot.debug;
    writeln!(out, "\n=== DEBUG COUNTERS ===")?;
    writeln!(
        out,
        "Total step() calls:     {}",
        group_thousands(counters.step_call_count)
    )?;
    writeln!(
        out,
        "Total clock edges:      {}",
        group_thousands(counters.total_clock_edges)
    )?;
    writeln!(
        out,
        "Total MIDI received:    {}",
        group_thousands(counters.total_midi_received)
    )?;
    writeln!(
        out,
        "Total MIDI sent:        {}",
        group_thousands(counters.total_midi_sent)
    )?;

    writeln!(
        out,
        "\nLast MIDI sent at pulse {}:",
        counters.last_pulse_with_midi
    )?;
    writeln!(out, "  {}", counters.last_midi_sent)?;

    let stats = BucketStats::from_buckets(&slot.buckets);
    writeln!(out, "\n=== BUCKET ANALYSIS ===")?;
    writeln!(
        out,
        "Non-empty buckets: {}/{}",
        stats.non_empty, slot.loop_length
    )?;
    writeln!(out, "Total recorded events: {}", stats.total_events)?;
    writeln!(out, "Max events per bucket: {}", stats.max_events)?;

    let crash_pulse = slot.current_pulse;
    writeln!(out, "\n=== CRASH POINT (Pulse {crash_pulse}) ===")?;
    match crash_bucket(slot) {
        Some(bucket) => {
            writeln!(out, "Bucket at crash has {} events:", bucket.events.len())?;
            for (i, event) in bucket.events.iter().enumerate() {
                let marker = if i == 0 { " <-- WOULD SEND THIS" } else { "" };
                writeln!(out, "  Event {i}: {event}{marker}")?;
            }
        }
        None => writeln!(out, "Bucket at crash pulse is EMPTY (no events)")?,
    }

    writeln!(out, "\n=== SURROUNDING BUCKETS ===")?;
    for bucket in surrounding_buckets(&slot.buckets, crash_pulse, options.window) {
        let marker = if bucket.pulse == crash_pulse {
            " <-- CRASH"
        } else {
            ""
        };
        writeln!(
            out,
            "Pulse {}: {} events{}",
            bucket.pulse,
            bucket.events.len(),
            marker
        )?;
    }

    if let Some(perf) = PerformanceStats::from_slot(slot) {
        writeln!(out, "\n=== PERFORMANCE STATS ===")?;
        writeln!(
            out,
            "Avg step() calls per clock: {:.1}",
            perf.step_calls_per_clock
        )?;
        if let Some(loops) = perf.loops_played {
            writeln!(out, "Loops played before crash: {loops:.2}")?;
        }
    }

    Ok(())
}

/// Locate the looper slot in `snapshot` and render its report into `out`.
///
/// A missing slot is not an error: the diagnostic line is written and
/// [`ReportOutcome::SlotNotFound`] is returned.
pub fn write_report<W: Write>(
    snapshot: &Snapshot,
    options: &ReportOptions,
    out: &mut W,
) -> Result<ReportOutcome> {
    let Some(slot) = snapshot.looper(&options.slot_guid)? else {
        writeln!(out, "ERROR: VLoop slot not found")?;
        return Ok(ReportOutcome::SlotNotFound);
    };

    write_looper_report(&slot, options, out)?;
    Ok(ReportOutcome::Written)
}

/// Load the snapshot at `path` and print its crash report to stdout.
pub fn generate_report(path: impl AsRef<Path>, options: &ReportOptions) -> Result<ReportOutcome> {
    let snapshot = load_snapshot(path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = write_report(&snapshot, options, &mut out)?;
    out.flush()?;

    debug!("report finished: {:?}", outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiEvent;
    use crate::snapshot::Counters;

    fn bucket(pulse: i64, n_events: usize) -> Bucket {
        Bucket {
            pulse,
            events: vec![MidiEvent::new(0x90, 60, 100); n_events],
        }
    }

    fn slot(loop_length: i64, current_pulse: i64, buckets: Vec<Bucket>) -> LooperSlot {
        LooperSlot {
            loop_length,
            current_pulse,
            is_recording: false,
            is_playing: true,
            debug: Counters::default(),
            buckets,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(123456), "123,456");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(i64::MAX), "9,223,372,036,854,775,807");
    }

    #[test]
    fn test_group_thousands_negative() {
        assert_eq!(group_thousands(-1), "-1");
        assert_eq!(group_thousands(-999), "-999");
        assert_eq!(group_thousands(-1000), "-1,000");
        assert_eq!(group_thousands(-2147483648), "-2,147,483,648");
        assert_eq!(group_thousands(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_bucket_stats() {
        let buckets = vec![bucket(0, 2), bucket(3, 5), bucket(9, 1)];
        let stats = BucketStats::from_buckets(&buckets);
        assert_eq!(stats.non_empty, 3);
        assert_eq!(stats.total_events, 8);
        assert_eq!(stats.max_events, 5);
    }

    #[test]
    fn test_bucket_stats_empty() {
        assert_eq!(BucketStats::from_buckets(&[]), BucketStats::default());
    }

    #[test]
    fn test_surrounding_window_keeps_stored_order() {
        let buckets = vec![
            bucket(52, 1),
            bucket(10, 1),
            bucket(48, 1),
            bucket(54, 1),
            bucket(50, 1),
            bucket(46, 1),
            bucket(49, 1),
        ];
        let pulses: Vec<i64> = surrounding_buckets(&buckets, 50, 3)
            .map(|b| b.pulse)
            .collect();
        assert_eq!(pulses, vec![52, 48, 50, 49]);
    }

    #[test]
    fn test_surrounding_window_near_zero() {
        let buckets = vec![bucket(0, 1), bucket(2, 1), bucket(4, 1)];
        let pulses: Vec<i64> = surrounding_buckets(&buckets, 1, 3)
            .map(|b| b.pulse)
            .collect();
        assert_eq!(pulses, vec![0, 2, 4]);
    }

    #[test]
    fn test_crash_bucket_lookup() {
        let s = slot(16, 5, vec![bucket(4, 1), bucket(5, 3)]);
        assert_eq!(crash_bucket(&s).map(|b| b.events.len()), Some(3));

        let s = slot(16, 6, vec![bucket(4, 1), bucket(5, 3)]);
        assert!(crash_bucket(&s).is_none());
    }

    #[test]
    fn test_performance_stats() {
        let mut s = slot(16, 0, vec![]);
        s.debug.step_call_count = 1000;
        s.debug.total_clock_edges = 20;

        let perf = PerformanceStats::from_slot(&s).unwrap();
        assert_eq!(perf.step_calls_per_clock, 50.0);
        assert_eq!(perf.loops_played, Some(1.25));
    }

    #[test]
    fn test_performance_stats_without_clock() {
        let mut s = slot(16, 0, vec![]);
        s.debug.step_call_count = 1000;
        assert!(PerformanceStats::from_slot(&s).is_none());
    }

    #[test]
    fn test_performance_stats_negative_clock() {
        let mut s = slot(16, 0, vec![]);
        s.debug.total_clock_edges = -5;
        assert!(PerformanceStats::from_slot(&s).is_none());
    }

    #[test]
    fn test_performance_stats_empty_loop() {
        let mut s = slot(0, 0, vec![]);
        s.debug.total_clock_edges = 7;
        let perf = PerformanceStats::from_slot(&s).unwrap();
        assert_eq!(perf.loops_played, None);
    }

    #[test]
    fn test_empty_crash_bucket_text() {
        let s = slot(8, 3, vec![bucket(1, 1)]);
        let mut out = Vec::new();
        write_looper_report(&s, &ReportOptions::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("=== CRASH POINT (Pulse 3) ===\nBucket at crash pulse is EMPTY (no events)\n"));
        assert!(!text.contains("PERFORMANCE STATS"));
    }
}
