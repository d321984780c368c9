//! Input sources for the processor loop.
//!
//! Input modes:
//! - `SerialSource`: live receiver on a serial port (bounded-wait reads)
//! - `ReaderSource`: recorded NMEA capture from a file or stdin
//!
//! Both run raw bytes through `LineAssembler`, so framing, whitespace and
//! non-ASCII noise are handled the same way for live and replayed data.

use std::io::{self, BufRead, Read};
use std::time::Duration;

use gnss_core::{GnssError, LineAssembler, Result};

/// Whether a source can still produce input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Open,
    /// End of input; no further lines will arrive.
    Closed,
}

/// A stream of complete NMEA lines.
pub trait LineSource {
    /// Append any complete lines to `out`.
    ///
    /// Waits at most the source's own bounded timeout when nothing is
    /// available, so the caller's timers stay responsive.
    fn poll_lines(&mut self, out: &mut Vec<String>) -> io::Result<SourceState>;

    /// Partial lines thrown away for running past the line length bound.
    fn overflows(&self) -> u64;
}

// ---------------------------------------------------------------------------
// Serial port
// ---------------------------------------------------------------------------

const READ_CHUNK: usize = 1024;

/// Live receiver on a serial port.
pub struct SerialSource {
    port: Box<dyn serialport::SerialPort>,
    assembler: LineAssembler,
    buf: [u8; READ_CHUNK],
}

impl SerialSource {
    /// Open `path` at `baud`. `idle_wait` bounds each read when the line is
    /// quiet.
    pub fn open(path: &str, baud: u32, idle_wait: Duration) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(idle_wait)
            .open()
            .map_err(|e| GnssError::Serial(format!("{path}: {e}")))?;

        Ok(SerialSource {
            port,
            assembler: LineAssembler::new(),
            buf: [0; READ_CHUNK],
        })
    }
}

impl LineSource for SerialSource {
    fn poll_lines(&mut self, out: &mut Vec<String>) -> io::Result<SourceState> {
        match self.port.read(&mut self.buf) {
            // Zero bytes after a successful wait means the device hung up.
            Ok(0) => {
                self.assembler.finish(out);
                Ok(SourceState::Closed)
            }
            Ok(n) => {
                self.assembler.push(&self.buf[..n], out);
                Ok(SourceState::Open)
            }
            Err(e) if is_idle(&e) => Ok(SourceState::Open),
            Err(e) => Err(e),
        }
    }

    fn overflows(&self) -> u64 {
        self.assembler.overflows()
    }
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

// ---------------------------------------------------------------------------
// Recorded capture
// ---------------------------------------------------------------------------

/// Recorded NMEA from any buffered reader (file, stdin, in-memory).
pub struct ReaderSource<R: BufRead> {
    reader: R,
    assembler: LineAssembler,
    chunk: Vec<u8>,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            assembler: LineAssembler::new(),
            chunk: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    /// Reads one line per call; never idles.
    fn poll_lines(&mut self, out: &mut Vec<String>) -> io::Result<SourceState> {
        self.chunk.clear();
        match self.reader.read_until(b'\n', &mut self.chunk) {
            Ok(0) => {
                self.assembler.finish(out);
                Ok(SourceState::Closed)
            }
            Ok(_) => {
                self.assembler.push(&self.chunk, out);
                Ok(SourceState::Open)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(SourceState::Open),
            Err(e) => Err(e),
        }
    }

    fn overflows(&self) -> u64 {
        self.assembler.overflows()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<S: LineSource>(source: &mut S) -> Vec<String> {
        let mut lines = Vec::new();
        while source.poll_lines(&mut lines).unwrap() == SourceState::Open {}
        lines
    }

    #[test]
    fn test_reader_source_lines() {
        let data = b"$GPGGA,1*00\r\n$GPGSV,2*00\r\n\r\n$GPRMC,3*00\r\n";
        let mut source = ReaderSource::new(&data[..]);
        assert_eq!(
            drain(&mut source),
            vec!["$GPGGA,1*00", "$GPGSV,2*00", "$GPRMC,3*00"]
        );
    }

    #[test]
    fn test_reader_source_unterminated_tail() {
        let mut source = ReaderSource::new(&b"$GPGGA,1*00\r\n$GPVTG,tail"[..]);
        assert_eq!(drain(&mut source), vec!["$GPGGA,1*00", "$GPVTG,tail"]);
    }

    #[test]
    fn test_reader_source_closed_stays_closed() {
        let mut source = ReaderSource::new(&b""[..]);
        let mut lines = Vec::new();
        assert_eq!(source.poll_lines(&mut lines).unwrap(), SourceState::Closed);
        assert_eq!(source.poll_lines(&mut lines).unwrap(), SourceState::Closed);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_reader_source_drops_non_ascii() {
        let mut source = ReaderSource::new(&b"\xfe\xff$GPGGA,1*00\r\n"[..]);
        assert_eq!(drain(&mut source), vec!["$GPGGA,1*00"]);
    }

    #[test]
    fn test_reader_source_counts_overflows() {
        let mut data = vec![b'X'; gnss_core::line::MAX_LINE_BYTES + 1];
        data.extend_from_slice(b"\r\n$GPGGA,1*00\r\n");
        let mut source = ReaderSource::new(&data[..]);
        let lines = drain(&mut source);
        assert_eq!(source.overflows(), 1);
        assert_eq!(lines, vec!["X", "$GPGGA,1*00"]);
    }

    #[test]
    fn test_idle_errors() {
        assert!(is_idle(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(is_idle(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_idle(&io::Error::from(io::ErrorKind::BrokenPipe)));
    }

    #[test]
    fn test_serial_open_missing_port_fails() {
        let err = SerialSource::open("/dev/does-not-exist-gnss", 115_200, Duration::from_millis(10));
        assert!(matches!(err, Err(GnssError::Serial(_))));
    }
}
