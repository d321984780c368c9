//! The processor loop: read lines, update state, relay, publish on cadence.
//!
//! Single-threaded. The only wait is inside `LineSource::poll_lines`, which
//! is bounded, so the timers are checked at least once per idle period.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use gnss_core::state::is_relayed;
use gnss_core::{
    Cadence, GnssError, ProcessorState, Result, SentenceKind, ShutdownToken, Snapshot,
};

use crate::publish::SnapshotPublisher;
use crate::relay::{Connector, RelaySink};
use crate::source::{LineSource, SourceState};

/// Loop counters, for diagnostics and the replay summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub lines: u64,
    pub fixes: u64,
    pub visibility: u64,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    InputClosed,
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct RunSummary {
    pub state: ProcessorState,
    pub stats: LoopStats,
    pub stop: StopReason,
}

pub struct Processor<S: LineSource, C: Connector> {
    source: S,
    relay: RelaySink<C>,
    publisher: Option<SnapshotPublisher>,
    cadence: Option<Cadence>,
    state: ProcessorState,
    stats: LoopStats,
}

impl<S: LineSource, C: Connector> Processor<S, C> {
    /// A processor with no timers: it publishes once, when input ends.
    pub fn new(source: S, relay: RelaySink<C>, publisher: Option<SnapshotPublisher>) -> Self {
        Processor {
            source,
            relay,
            publisher,
            cadence: None,
            state: ProcessorState::new(),
            stats: LoopStats::default(),
        }
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = Some(cadence);
        self
    }

    /// Run until the input closes or `shutdown` is cancelled.
    ///
    /// Teardown publishes one last snapshot, then releases the relay handle,
    /// then the input.
    pub fn run(mut self, shutdown: &ShutdownToken) -> Result<RunSummary> {
        let mut lines = Vec::new();

        let outcome = loop {
            if shutdown.is_cancelled() {
                info!("shutdown requested");
                break Ok(StopReason::Shutdown);
            }

            match self.source.poll_lines(&mut lines) {
                Ok(state) => {
                    for line in lines.drain(..) {
                        self.handle_line(&line);
                    }
                    if state == SourceState::Closed {
                        info!("input closed");
                        break Ok(StopReason::InputClosed);
                    }
                }
                Err(e) => break Err(GnssError::from(e)),
            }

            self.tick(Instant::now());
        };

        self.publish();

        let Processor {
            source,
            mut relay,
            state,
            stats,
            ..
        } = self;
        relay.close();
        drop(source);

        info!(
            lines = stats.lines,
            nmea_sent = state.counters.nmea_sent,
            "processor stopped"
        );

        outcome.map(|stop| RunSummary { state, stats, stop })
    }

    /// Apply one line: update state first, then relay it.
    pub(crate) fn handle_line(&mut self, line: &str) {
        self.stats.lines += 1;

        match self.state.ingest(line) {
            Some(SentenceKind::Fix) => self.stats.fixes += 1,
            Some(SentenceKind::Visibility) => self.stats.visibility += 1,
            None => {}
        }

        if is_relayed(line) && self.relay.send(line) {
            self.state.record_relayed();
        }
    }

    /// Fire whichever timers are due at `now`.
    pub(crate) fn tick(&mut self, now: Instant) {
        let Some(cadence) = self.cadence.as_mut() else {
            return;
        };
        let due = cadence.poll(now);

        if due.publish {
            self.publish();
        }
        if due.reset_window {
            debug!(
                classified = self.state.classifier.stats().total,
                "classifier window reset"
            );
            self.state.reset_window();
        }
        if due.diagnostics {
            self.log_diagnostics();
        }
    }

    fn publish(&self) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        let snapshot = Snapshot::capture(&self.state, unix_now());
        if let Err(e) = publisher.publish(&snapshot) {
            warn!(
                path = %publisher.path().display(),
                error = %e,
                "snapshot write failed"
            );
        }
    }

    fn log_diagnostics(&self) {
        let constellations = self
            .state
            .satellites
            .constellation_counts()
            .iter()
            .map(|(c, n)| format!("{c}={n}"))
            .collect::<Vec<_>>()
            .join(" ");

        info!(
            lines = self.stats.lines,
            fixes = self.stats.fixes,
            visibility = self.stats.visibility,
            nmea_sent = self.state.counters.nmea_sent,
            ml_corrections = self.state.counters.ml_corrections,
            satellites = self.state.satellites.len(),
            avg_confidence = format!("{:.1}", self.state.classifier.average_confidence()),
            relay_attached = self.relay.is_attached(),
            overflows = self.source.overflows(),
            constellations = %constellations,
            "diagnostics"
        );
    }

    #[cfg(test)]
    fn state(&self) -> &ProcessorState {
        &self.state
    }
}

/// Wall-clock time as Unix seconds. A clock before the epoch reads as 0.
fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
