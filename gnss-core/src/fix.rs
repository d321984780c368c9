//! GGA position-fix parsing.
//!
//! A fix is all-or-nothing: the sentence is read into a fresh `ReceiverFix`
//! and only a fully parsed fix replaces the previous one.

use crate::nmea::{parse_coord, parse_f64, parse_u32, parse_u8};
use crate::types::Position;

/// Minimum field count for a GGA sentence (address included).
pub const GGA_MIN_FIELDS: usize = 15;

// GGA field indices (address is field 0)
const LAT: usize = 2;
const LAT_HEMI: usize = 3;
const LON: usize = 4;
const LON_HEMI: usize = 5;
const QUALITY: usize = 6;
const SATELLITES: usize = 7;
const HDOP: usize = 8;
const ALTITUDE: usize = 9;

/// Latest position fix reported by the receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReceiverFix {
    pub lat: f64,
    pub lon: f64,
    /// Altitude above mean sea level, meters.
    pub alt: f64,
    /// GGA fix quality indicator (0 = no fix, 1 = GPS, 2 = DGPS, 4/5 = RTK, ...).
    pub quality: u8,
    /// Satellites used in the solution.
    pub satellites: u32,
    /// Horizontal dilution of precision.
    pub hdop: f64,
}

impl ReceiverFix {
    pub fn position(&self) -> Position {
        Position {
            lat: self.lat,
            lon: self.lon,
            alt: self.alt,
        }
    }
}

/// Parse a tokenised GGA sentence.
///
/// Returns `None` for short sentences or when any numeric sub-field is
/// malformed. Empty numeric sub-fields read as zero; malformed coordinates
/// read as `0.0`.
pub fn parse_gga(fields: &[&str]) -> Option<ReceiverFix> {
    if fields.len() < GGA_MIN_FIELDS {
        return None;
    }

    Some(ReceiverFix {
        lat: parse_coord(fields[LAT], fields[LAT_HEMI]),
        lon: parse_coord(fields[LON], fields[LON_HEMI]),
        alt: parse_f64(fields[ALTITUDE])?,
        quality: parse_u8(fields[QUALITY])?,
        satellites: parse_u32(fields[SATELLITES])?,
        hdop: parse_f64(fields[HDOP])?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
