//! Per-satellite signal propagation classification.
//!
//! Fixed-threshold decision on SNR and elevation, plus a rolling window of
//! counters that the processor zeroes on its reset timer.

/// LOS requires at least this SNR (dB-Hz) ...
pub const LOS_MIN_SNR: f64 = 35.0;
/// ... and at least this elevation (degrees).
pub const LOS_MIN_ELEVATION: f64 = 30.0;
pub const MULTIPATH_MIN_SNR: f64 = 25.0;
pub const MULTIPATH_MIN_ELEVATION: f64 = 15.0;

/// Signal propagation condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalCondition {
    Los,
    Multipath,
    Nlos,
}

impl SignalCondition {
    /// Fixed confidence attached to each condition.
    pub fn confidence(self) -> f64 {
        match self {
            SignalCondition::Los => 0.95,
            SignalCondition::Multipath => 0.75,
            SignalCondition::Nlos => 0.50,
        }
    }

    /// True for conditions that degrade the solution.
    pub fn is_degraded(self) -> bool {
        !matches!(self, SignalCondition::Los)
    }
}

impl std::fmt::Display for SignalCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalCondition::Los => write!(f, "LOS"),
            SignalCondition::Multipath => write!(f, "Multipath"),
            SignalCondition::Nlos => write!(f, "NLOS"),
        }
    }
}

/// Decide the condition for one observation. Pure, no counters touched.
pub fn decide(snr: f64, elevation: f64) -> SignalCondition {
    if snr >= LOS_MIN_SNR && elevation >= LOS_MIN_ELEVATION {
        SignalCondition::Los
    } else if snr >= MULTIPATH_MIN_SNR && elevation >= MULTIPATH_MIN_ELEVATION {
        SignalCondition::Multipath
    } else {
        SignalCondition::Nlos
    }
}

// ---------------------------------------------------------------------------
// Rolling counters
// ---------------------------------------------------------------------------

/// Classification counts since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierStats {
    pub los: u64,
    pub multipath: u64,
    pub nlos: u64,
    pub total: u64,
}

/// Condition counts in the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Distribution {
    pub los: u64,
    pub multipath: u64,
    pub nlos: u64,
}

/// Classifier with its rolling window of counters.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    stats: ClassifierStats,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one observation and count it.
    pub fn classify(&mut self, snr: f64, elevation: f64) -> SignalCondition {
        let condition = decide(snr, elevation);
        self.stats.total += 1;
        match condition {
            SignalCondition::Los => self.stats.los += 1,
            SignalCondition::Multipath => self.stats.multipath += 1,
            SignalCondition::Nlos => self.stats.nlos += 1,
        }
        condition
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }

    pub fn distribution(&self) -> Distribution {
        Distribution {
            los: self.stats.los,
            multipath: self.stats.multipath,
            nlos: self.stats.nlos,
        }
    }

    /// Count-weighted mean confidence as a percentage (0-100). Zero when
    /// nothing was classified in this window.
    pub fn average_confidence(&self) -> f64 {
        if self.stats.total == 0 {
            return 0.0;
        }
        let weighted = self.stats.los as f64 * SignalCondition::Los.confidence()
            + self.stats.multipath as f64 * SignalCondition::Multipath.confidence()
            + self.stats.nlos as f64 * SignalCondition::Nlos.confidence();
        weighted / self.stats.total as f64 * 100.0
    }

    pub fn reset(&mut self) {
        self.stats = ClassifierStats::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
