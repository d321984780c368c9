//! Owned processor state: the current fix, the satellite table, the
//! classifier window and the relay counters.
//!
//! Pure logic, no I/O. The processor loop owns one `ProcessorState`, feeds
//! it every line it reads and projects it into a `Snapshot` on its publish
//! timer.

use crate::classify::Classifier;
use crate::fix::{parse_gga, ReceiverFix};
use crate::nmea::{split_fields, START_MARKER};
use crate::sky::{parse_gsv, SatelliteTable};
use crate::types::{sentence_kind, SentenceKind};

/// Output counters. Monotonic for the life of the process; the classifier
/// window reset does not touch them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayCounters {
    /// Lines delivered to the relay consumer.
    pub nmea_sent: u64,
    /// Correction frames relayed. No correction path exists; always 0.
    pub rtcm_sent: u64,
    /// Satellites classified Multipath or NLOS, cumulative.
    pub ml_corrections: u64,
    /// Output format changes. Output is NMEA only; always 0.
    pub format_switches: u64,
}

/// Everything the processor knows about the receiver.
#[derive(Debug, Clone, Default)]
pub struct ProcessorState {
    pub fix: ReceiverFix,
    pub satellites: SatelliteTable,
    pub classifier: Classifier,
    pub counters: RelayCounters,
}

impl ProcessorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one framing-stripped line.
    ///
    /// Returns the kind of sentence applied, or `None` when the line was not
    /// a consumed sentence or was discarded as malformed. Discarded lines
    /// leave the state untouched.
    pub fn ingest(&mut self, line: &str) -> Option<SentenceKind> {
        let kind = sentence_kind(line)?;
        let fields = split_fields(line);

        match kind {
            SentenceKind::Fix => {
                self.fix = parse_gga(&fields)?;
            }
            SentenceKind::Visibility => {
                let observations = parse_gsv(&fields)?;
                let degraded = self.satellites.apply(&observations, &mut self.classifier);
                self.counters.ml_corrections += degraded;
            }
        }

        Some(kind)
    }

    /// Count one line delivered to the relay consumer.
    pub fn record_relayed(&mut self) {
        self.counters.nmea_sent += 1;
    }

    /// Start a new classifier window.
    pub fn reset_window(&mut self) {
        self.classifier.reset();
    }
}

/// True for lines that go to the relay consumer: anything with a start marker.
pub fn is_relayed(line: &str) -> bool {
    line.starts_with(START_MARKER)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
