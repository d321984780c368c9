//! Telemetry snapshot: the record the dashboard service reads.
//!
//! The key set is fixed. Decoding rejects unknown keys and fills missing ones
//! with the values a fresh processor would publish.

use serde::{Deserialize, Serialize};

use crate::accuracy::{estimate_accuracy, rtk_status};
use crate::state::ProcessorState;
use crate::types::{Position, Result};

/// Output format label. The processor only ever emits NMEA.
pub const OUTPUT_FORMAT: &str = "NMEA";

/// One published telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Snapshot {
    pub position: Position,
    pub satellites: u32,
    pub quality: u8,
    pub hdop: f64,
    pub nmea_sent: u64,
    pub rtcm_sent: u64,
    pub ml_corrections: u64,
    pub format_switches: u64,
    pub los_sats: u64,
    pub multipath_sats: u64,
    pub nlos_sats: u64,
    /// Mean classification confidence in the current window, 0-100.
    pub avg_confidence: f64,
    /// Estimated horizontal error, meters.
    pub estimated_accuracy: f64,
    pub rtk_status: String,
    pub format: String,
    /// Capture time, Unix seconds.
    pub last_update: f64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            position: Position::default(),
            satellites: 0,
            quality: 0,
            hdop: 0.0,
            nmea_sent: 0,
            rtcm_sent: 0,
            ml_corrections: 0,
            format_switches: 0,
            los_sats: 0,
            multipath_sats: 0,
            nlos_sats: 0,
            avg_confidence: 0.0,
            estimated_accuracy: estimate_accuracy(0, 0.0),
            rtk_status: rtk_status(0).into(),
            format: OUTPUT_FORMAT.into(),
            last_update: 0.0,
        }
    }
}

impl Snapshot {
    /// Project the processor state at `captured_at` (Unix seconds).
    pub fn capture(state: &ProcessorState, captured_at: f64) -> Self {
        let fix = &state.fix;
        let dist = state.classifier.distribution();
        let counters = &state.counters;

        Snapshot {
            position: fix.position(),
            satellites: fix.satellites,
            quality: fix.quality,
            hdop: fix.hdop,
            nmea_sent: counters.nmea_sent,
            rtcm_sent: counters.rtcm_sent,
            ml_corrections: counters.ml_corrections,
            format_switches: counters.format_switches,
            los_sats: dist.los,
            multipath_sats: dist.multipath,
            nlos_sats: dist.nlos,
            avg_confidence: state.classifier.average_confidence(),
            estimated_accuracy: estimate_accuracy(fix.quality, fix.hdop),
            rtk_status: rtk_status(fix.quality).into(),
            format: OUTPUT_FORMAT.into(),
            last_update: captured_at,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
