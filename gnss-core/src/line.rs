//! Reassemble sentences from a byte stream.
//!
//! Serial reads return arbitrary chunks: half a sentence, three sentences,
//! or a sentence split across two reads. `LineAssembler` buffers the
//! partial tail and hands back complete lines with framing stripped.

/// Longest partial line kept while waiting for a newline. NMEA caps a
/// sentence at 82 characters; anything this long is noise.
pub const MAX_LINE_BYTES: usize = 1024;

/// Accumulates bytes and yields complete, trimmed lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    partial: Vec<u8>,
    overflows: u64,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, appending every completed line to `out`.
    ///
    /// Non-ASCII bytes are dropped. Lines are trimmed of surrounding
    /// whitespace (including `\r`); blank lines are not emitted.
    pub fn push(&mut self, bytes: &[u8], out: &mut Vec<String>) {
        for &b in bytes {
            if b == b'\n' {
                self.flush_into(out);
            } else if b.is_ascii() {
                if self.partial.len() >= MAX_LINE_BYTES {
                    self.partial.clear();
                    self.overflows += 1;
                }
                self.partial.push(b);
            }
        }
    }

    /// Emit whatever is buffered as a final line (end of input).
    pub fn finish(&mut self, out: &mut Vec<String>) {
        self.flush_into(out);
    }

    /// Bytes waiting for a newline.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    /// Partial lines discarded for exceeding `MAX_LINE_BYTES`.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    fn flush_into(&mut self, out: &mut Vec<String>) {
        // Only ASCII bytes are ever buffered, so this cannot fail.
        let text = String::from_utf8_lossy(&self.partial);
        let line = text.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
        self.partial.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(asm: &mut LineAssembler, bytes: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        asm.push(bytes, &mut out);
        out
    }

    #[test]
    fn test_single_line_crlf() {
        let mut asm = LineAssembler::new();
        let lines = feed(&mut asm, b"$GPGGA,1,2,3*47\r\n");
        assert_eq!(lines, vec!["$GPGGA,1,2,3*47"]);
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn test_split_across_reads() {
        let mut asm = LineAssembler::new();
        assert!(feed(&mut asm, b"$GPGSV,1,1,01,").is_empty());
        assert_eq!(asm.pending(), 14);
        let lines = feed(&mut asm, b"07,79,048,42*71\r\n$GPRMC");
        assert_eq!(lines, vec!["$GPGSV,1,1,01,07,79,048,42*71"]);
        assert_eq!(asm.pending(), 6);
    }

    #[test]
    fn test_multiple_lines_one_read() {
        let mut asm = LineAssembler::new();
        let lines = feed(&mut asm, b"$A,1\r\n$B,2\r\n\r\n$C,3\n");
        assert_eq!(lines, vec!["$A,1", "$B,2", "$C,3"]);
    }

    #[test]
    fn test_non_ascii_dropped() {
        let mut asm = LineAssembler::new();
        let lines = feed(&mut asm, b"$GP\xffGGA,\xc3\xa91\r\n");
        assert_eq!(lines, vec!["$GPGGA,1"]);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let mut asm = LineAssembler::new();
        let lines = feed(&mut asm, b"  $GPVTG,x  \r\n");
        assert_eq!(lines, vec!["$GPVTG,x"]);
    }

    #[test]
    fn test_overflow_bounded() {
        let mut asm = LineAssembler::new();
        let noise = vec![b'A'; MAX_LINE_BYTES + 10];
        assert!(feed(&mut asm, &noise).is_empty());
        assert_eq!(asm.overflows(), 1);
        assert_eq!(asm.pending(), 10);
    }

    #[test]
    fn test_finish_flushes_tail() {
        let mut asm = LineAssembler::new();
        feed(&mut asm, b"$GPGGA,tail");
        let mut out = Vec::new();
        asm.finish(&mut out);
        assert_eq!(out, vec!["$GPGGA,tail"]);
        assert_eq!(asm.pending(), 0);
    }
}
