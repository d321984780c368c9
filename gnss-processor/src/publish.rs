//! Snapshot publisher: writes the telemetry record to its artifact file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use gnss_core::{Result, Snapshot};

/// Replaces the snapshot file wholesale on every publish.
///
/// The record is written to a sibling `.tmp` file and renamed over the
/// target, so a reader sees either the previous record or the new one.
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    path: PathBuf,
    staging: PathBuf,
}

impl SnapshotPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut staging = OsString::from(path.as_os_str());
        staging.push(".tmp");
        SnapshotPublisher {
            path,
            staging: PathBuf::from(staging),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn publish(&self, snapshot: &Snapshot) -> Result<()> {
        let text = snapshot.to_json()?;
        std::fs::write(&self.staging, text)?;
        std::fs::rename(&self.staging, &self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_core::{GnssError, ProcessorState};

    #[test]
    fn test_publish_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = SnapshotPublisher::new(dir.path().join("snapshot.json"));

        let mut state = ProcessorState::new();
        state.ingest("$GPGGA,123519,4807.038,N,01131.000,E,2,08,0.9,545.4,M,46.9,M,,*47");
        let snap = Snapshot::capture(&state, 1_700_000_000.0);
        publisher.publish(&snap).unwrap();

        let text = std::fs::read_to_string(publisher.path()).unwrap();
        assert_eq!(Snapshot::from_json(&text).unwrap(), snap);
        assert!(!dir.path().join("snapshot.json.tmp").exists());
    }

    #[test]
    fn test_publish_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = SnapshotPublisher::new(dir.path().join("snapshot.json"));

        let first = Snapshot {
            nmea_sent: 10,
            ..Snapshot::default()
        };
        let second = Snapshot {
            nmea_sent: 11,
            ..Snapshot::default()
        };
        publisher.publish(&first).unwrap();
        publisher.publish(&second).unwrap();

        let text = std::fs::read_to_string(publisher.path()).unwrap();
        assert_eq!(Snapshot::from_json(&text).unwrap().nmea_sent, 11);
    }

    #[test]
    fn test_publish_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = SnapshotPublisher::new(dir.path().join("absent").join("snapshot.json"));
        assert!(matches!(
            publisher.publish(&Snapshot::default()),
            Err(GnssError::Io(_))
        ));
    }
}
