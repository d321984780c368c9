//! Shared error enum and small value types for gnss-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by gnss-core and surfaced by the processor binary.
#[derive(Debug, Error)]
pub enum GnssError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("serial port error: {0}")]
    Serial(String),
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("input stream closed")]
    InputClosed,
}

pub type Result<T> = std::result::Result<T, GnssError>;

// ---------------------------------------------------------------------------
// Sentence kinds
// ---------------------------------------------------------------------------

/// Sentence kinds the processor interprets. Everything else is relayed only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    /// GGA: position fix.
    Fix,
    /// GSV: satellites in view.
    Visibility,
}

/// Prefixes dispatched to the parsers, paired with their kind.
pub const CONSUMED_PREFIXES: &[(&str, SentenceKind)] = &[
    ("$GPGGA", SentenceKind::Fix),
    ("$GNGGA", SentenceKind::Fix),
    ("$GPGSV", SentenceKind::Visibility),
    ("$GNGSV", SentenceKind::Visibility),
];

/// Classify a line by its sentence prefix. `None` for relay-only sentences.
pub fn sentence_kind(line: &str) -> Option<SentenceKind> {
    CONSUMED_PREFIXES
        .iter()
        .find(|(prefix, _)| line.starts_with(prefix))
        .map(|(_, kind)| *kind)
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Geodetic position as published in the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_kind_consumed() {
        assert_eq!(sentence_kind("$GPGGA,123519,..."), Some(SentenceKind::Fix));
        assert_eq!(sentence_kind("$GNGGA,123519,..."), Some(SentenceKind::Fix));
        assert_eq!(
            sentence_kind("$GPGSV,3,1,11,..."),
            Some(SentenceKind::Visibility)
        );
        assert_eq!(
            sentence_kind("$GNGSV,3,1,11,..."),
            Some(SentenceKind::Visibility)
        );
    }

    #[test]
    fn test_sentence_kind_relay_only() {
        assert_eq!(sentence_kind("$GPRMC,123519,A,..."), None);
        assert_eq!(sentence_kind("$GLGSV,2,1,08,..."), None);
        assert_eq!(sentence_kind("GPGGA,no marker"), None);
        assert_eq!(sentence_kind(""), None);
    }

    #[test]
    fn test_error_display() {
        let err = GnssError::Config("bad baud".into());
        assert_eq!(err.to_string(), "config error: bad baud");
        assert_eq!(GnssError::InputClosed.to_string(), "input stream closed");
    }
}
