//! GSV satellites-in-view parsing and the satellite table.
//!
//! One GSV sentence reports at most four satellites, so the table is built up
//! across sentences and cycles. Entries are replaced on every report and are
//! never pruned: a satellite that drops out of view keeps its last record.

use std::collections::HashMap;

use crate::classify::{Classifier, SignalCondition};
use crate::nmea::{parse_f64, strip_checksum};

/// Minimum field count for a GSV sentence (address included).
pub const GSV_MIN_FIELDS: usize = 8;

/// Satellites reported per GSV sentence.
pub const GROUPS_PER_SENTENCE: usize = 4;

/// Index of the first satellite group (after address, total, number, in-view).
const FIRST_GROUP: usize = 4;
const GROUP_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Constellations
// ---------------------------------------------------------------------------

/// GNSS constellation, derived from the NMEA satellite id range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constellation {
    Gps,
    Glonass,
    BeiDou,
    Galileo,
    Unknown,
}

impl Constellation {
    pub fn from_id(id: u32) -> Self {
        match id {
            1..=32 => Constellation::Gps,
            65..=96 => Constellation::Glonass,
            161..=197 => Constellation::BeiDou,
            201..=236 => Constellation::Galileo,
            _ => Constellation::Unknown,
        }
    }
}

impl std::fmt::Display for Constellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Constellation::Gps => "GPS",
            Constellation::Glonass => "GLONASS",
            Constellation::BeiDou => "BeiDou",
            Constellation::Galileo => "Galileo",
            Constellation::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// One satellite group read from a GSV sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteObservation {
    pub id: u32,
    pub elevation: f64,
    pub azimuth: f64,
    /// Signal-to-noise ratio, dB-Hz. Zero when the satellite is not tracked.
    pub snr: f64,
}

/// Parse a tokenised GSV sentence into its satellite groups.
///
/// Groups with an empty id are skipped. Returns `None` for short sentences
/// or when any group holds a malformed number, so a bad sentence never
/// half-applies.
pub fn parse_gsv(fields: &[&str]) -> Option<Vec<SatelliteObservation>> {
    if fields.len() < GSV_MIN_FIELDS {
        return None;
    }

    let mut observations = Vec::with_capacity(GROUPS_PER_SENTENCE);
    for group in 0..GROUPS_PER_SENTENCE {
        let base = FIRST_GROUP + group * GROUP_WIDTH;
        if base + 3 >= fields.len() {
            break;
        }

        let id = fields[base].trim();
        if id.is_empty() {
            continue;
        }

        observations.push(SatelliteObservation {
            id: id.parse().ok()?,
            elevation: parse_f64(fields[base + 1])?,
            azimuth: parse_f64(fields[base + 2])?,
            snr: parse_f64(strip_checksum(fields[base + 3]))?,
        });
    }

    Some(observations)
}

// ---------------------------------------------------------------------------
// Satellite table
// ---------------------------------------------------------------------------

/// Last known state of one satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteRecord {
    pub id: u32,
    pub constellation: Constellation,
    pub snr: f64,
    pub elevation: f64,
    pub azimuth: f64,
    /// Set only when the satellite was classified (SNR > 0).
    pub condition: Option<SignalCondition>,
    pub confidence: Option<f64>,
}

/// Satellite id → last known record.
#[derive(Debug, Clone, Default)]
pub struct SatelliteTable {
    records: HashMap<u32, SatelliteRecord>,
}

impl SatelliteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a batch of observations, classifying those with SNR > 0.
    ///
    /// Returns how many classifications came out degraded (Multipath or NLOS).
    pub fn apply(
        &mut self,
        observations: &[SatelliteObservation],
        classifier: &mut Classifier,
    ) -> u64 {
        let mut degraded = 0;
        for obs in observations {
            let condition = if obs.snr > 0.0 {
                Some(classifier.classify(obs.snr, obs.elevation))
            } else {
                None
            };
            if condition.is_some_and(SignalCondition::is_degraded) {
                degraded += 1;
            }

            self.records.insert(
                obs.id,
                SatelliteRecord {
                    id: obs.id,
                    constellation: Constellation::from_id(obs.id),
                    snr: obs.snr,
                    elevation: obs.elevation,
                    azimuth: obs.azimuth,
                    condition,
                    confidence: condition.map(SignalCondition::confidence),
                },
            );
        }
        degraded
    }

    pub fn get(&self, id: u32) -> Option<&SatelliteRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by constellation, then id.
    pub fn sorted(&self) -> Vec<&SatelliteRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by_key(|r| (r.constellation, r.id));
        records
    }

    /// Number of known satellites per constellation, in constellation order.
    pub fn constellation_counts(&self) -> Vec<(Constellation, usize)> {
        let mut counts: HashMap<Constellation, usize> = HashMap::new();
        for record in self.records.values() {
            *counts.entry(record.constellation).or_insert(0) += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort();
        counts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
