//! Relay sink: passes raw sentences through to a downstream consumer.
//!
//! The consumer reads from a named pipe it may open and close at will. The
//! sink holds at most one write handle. With no handle, each `send` makes one
//! attempt to open the pipe; a write that finds the reader gone drops the
//! handle so the next `send` reopens. Nothing here ever blocks the loop.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use tracing::{debug, info, warn};

use gnss_core::{GnssError, Result};

/// Relay line terminator.
const LINE_END: &str = "\r\n";

/// Opens a fresh write handle to the relay consumer.
pub trait Connector {
    type Writer: Write;

    fn connect(&mut self) -> io::Result<Self::Writer>;
}

// ---------------------------------------------------------------------------
// Connectors
// ---------------------------------------------------------------------------

/// Named pipe, opened write-only and non-blocking.
///
/// Opening fails with `ENXIO` while no reader has the pipe open. Anything
/// at the path other than a pipe is refused and left untouched.
#[derive(Debug, Clone)]
pub struct FifoConnector {
    path: PathBuf,
}

impl FifoConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FifoConnector { path: path.into() }
    }
}

impl Connector for FifoConnector {
    type Writer = File;

    fn connect(&mut self) -> io::Result<File> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(OFlag::O_NONBLOCK.bits())
            .open(&self.path)?;
        if !file.metadata()?.file_type().is_fifo() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a named pipe", self.path.display()),
            ));
        }
        Ok(file)
    }
}

/// A writer handed out once, e.g. a capture file during replay. Once the
/// handle has been dropped it cannot be reopened.
pub struct WriterConnector<W> {
    writer: Option<W>,
}

impl<W: Write> WriterConnector<W> {
    pub fn new(writer: W) -> Self {
        WriterConnector {
            writer: Some(writer),
        }
    }
}

impl<W: Write> Connector for WriterConnector<W> {
    type Writer = W;

    fn connect(&mut self) -> io::Result<W> {
        self.writer
            .take()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

/// Create the named pipe at `path` if nothing exists there yet.
///
/// An existing pipe is left alone. Anything else at `path` is an error.
pub fn prepare_fifo(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => Ok(()),
        Ok(_) => Err(GnssError::Config(format!(
            "{} exists and is not a named pipe",
            path.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            nix::unistd::mkfifo(path, Mode::from_bits_truncate(0o660)).map_err(io::Error::from)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// The consumer is not (or no longer) reading.
fn is_detached(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::BrokenPipe || e.raw_os_error() == Some(Errno::ENXIO as i32)
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Best-effort, self-reopening line writer.
pub struct RelaySink<C: Connector> {
    connector: C,
    writer: Option<C::Writer>,
}

impl<C: Connector> RelaySink<C> {
    pub fn new(connector: C) -> Self {
        RelaySink {
            connector,
            writer: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.writer.is_some()
    }

    /// Write `line` plus CRLF. Returns true only if the whole line was
    /// delivered.
    ///
    /// A full pipe drops the line but keeps the handle. A vanished reader
    /// drops the handle.
    pub fn send(&mut self, line: &str) -> bool {
        let Some(writer) = self.attach() else {
            return false;
        };

        let payload = format!("{line}{LINE_END}");
        match writer.write_all(payload.as_bytes()) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!("relay pipe full, line dropped");
                false
            }
            Err(e) => {
                if is_detached(&e) {
                    info!("relay consumer detached");
                } else {
                    warn!(error = %e, "relay write failed, closing handle");
                }
                self.writer = None;
                false
            }
        }
    }

    /// Flush and release the handle.
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                debug!(error = %e, "relay flush on close failed");
            }
        }
    }

    fn attach(&mut self) -> Option<&mut C::Writer> {
        if self.writer.is_none() {
            match self.connector.connect() {
                Ok(writer) => {
                    info!("relay consumer attached");
                    self.writer = Some(writer);
                }
                Err(e) => {
                    if !is_detached(&e) {
                        debug!(error = %e, "relay open failed");
                    }
                    return None;
                }
            }
        }
        self.writer.as_mut()
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::testing::MemoryConnector;
    use super::*;

    #[test]
    fn test_no_consumer_is_noop() {
        let pipe = MemoryConnector::new();
        let mut sink = RelaySink::new(pipe.clone());
        assert!(!sink.send("$GPGGA,1"));
        assert!(!sink.is_attached());
        assert!(pipe.received().is_empty());
    }

    #[test]
    fn test_detach_reattach_counting() {
        let pipe = MemoryConnector::new();
        let mut sink = RelaySink::new(pipe.clone());
        let mut sent = 0;

        pipe.set_attached(true);
        for line in ["$A,1", "$A,2", "$A,3"] {
            sent += sink.send(line) as u32;
        }
        assert_eq!(sent, 3);

        pipe.set_attached(false);
        sent += sink.send("$B,1") as u32;
        assert!(!sink.is_attached());
        sent += sink.send("$B,2") as u32;
        assert_eq!(sent, 3);

        pipe.set_attached(true);
        sent += sink.send("$C,1") as u32;
        assert_eq!(sent, 4);
        assert_eq!(pipe.received(), "$A,1\r\n$A,2\r\n$A,3\r\n$C,1\r\n");
    }

    #[test]
    fn test_full_pipe_drops_line_keeps_handle() {
        let pipe = MemoryConnector::new();
        let mut sink = RelaySink::new(pipe.clone());
        pipe.set_attached(true);
        assert!(sink.send("$A,1"));

        pipe.set_full(true);
        assert!(!sink.send("$A,2"));
        assert!(sink.is_attached());

        pipe.set_full(false);
        assert!(sink.send("$A,3"));
        assert_eq!(pipe.received(), "$A,1\r\n$A,3\r\n");
    }

    #[test]
    fn test_close_releases_handle() {
        let pipe = MemoryConnector::new();
        let mut sink = RelaySink::new(pipe.clone());
        pipe.set_attached(true);
        assert!(sink.send("$A,1"));
        sink.close();
        assert!(!sink.is_attached());
        // Reopens on demand.
        assert!(sink.send("$A,2"));
    }

    #[test]
    fn test_writer_connector_single_use() {
        let mut sink = RelaySink::new(WriterConnector::new(Vec::new()));
        assert!(sink.send("$GPGGA,1"));
        assert!(sink.send("$GPGSV,2"));
        sink.close();
        assert!(!sink.send("$GPRMC,3"));
    }

    #[test]
    fn test_prepare_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay");
        prepare_fifo(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().file_type().is_fifo());
        // Existing pipe is accepted.
        prepare_fifo(&path).unwrap();
    }

    #[test]
    fn test_prepare_fifo_rejects_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(prepare_fifo(&path), Err(GnssError::Config(_))));
    }

    #[test]
    fn test_regular_file_never_attached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay");
        let contents = "operator notes, keep\n";
        std::fs::write(&path, contents).unwrap();
        assert!(prepare_fifo(&path).is_err());

        let mut sink = RelaySink::new(FifoConnector::new(&path));
        assert!(!sink.send("$GPGGA,1"));
        assert!(!sink.send("$GPGGA,2"));
        assert!(!sink.is_attached());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_close_drops_writer() {
        let pipe = MemoryConnector::new();
        let mut sink = RelaySink::new(pipe.clone());
        pipe.set_attached(true);
        assert!(sink.send("$A,1"));
        assert_eq!(pipe.open_writers(), 1);
        sink.close();
        assert_eq!(pipe.open_writers(), 0);
    }

    fn open_reader(path: &Path) -> File {
        OpenOptions::new()
            .read(true)
            .custom_flags(OFlag::O_NONBLOCK.bits())
            .open(path)
            .unwrap()
    }

    #[test]
    fn test_fifo_detach_reattach() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay");
        prepare_fifo(&path).unwrap();
        let mut sink = RelaySink::new(FifoConnector::new(&path));

        // No reader: open fails with ENXIO.
        assert!(!sink.send("$GPGGA,1"));
        assert!(!sink.is_attached());

        let reader = open_reader(&path);
        assert!(sink.send("$GPGGA,2"));
        assert!(sink.is_attached());

        drop(reader);
        assert!(!sink.send("$GPGGA,3"));
        assert!(!sink.is_attached());

        let mut reader = open_reader(&path);
        assert!(sink.send("$GPGSV,4"));

        let mut buf = [0u8; 64];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"$GPGSV,4\r\n");
    }
}
