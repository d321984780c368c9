//! Field-level parsing for NMEA 0183 sentences.
//!
//! Every helper here is tolerant: an empty field reads as zero, and a field
//! that cannot be read is reported as `None` so the sentence parsers can
//! discard the whole sentence. Coordinates are the exception: they never
//! fail and fall back to `0.0`.

/// Sentence start marker.
pub const START_MARKER: char = '$';

/// Checksum delimiter.
pub const CHECKSUM_DELIMITER: char = '*';

// ---------------------------------------------------------------------------
// Tokenising
// ---------------------------------------------------------------------------

/// Split a sentence into its comma-separated fields.
///
/// The first field is the address (`$GPGGA`). The checksum, if present,
/// stays attached to the last field.
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').collect()
}

/// Truncate a field at the checksum delimiter.
pub fn strip_checksum(field: &str) -> &str {
    match field.split_once(CHECKSUM_DELIMITER) {
        Some((value, _)) => value,
        None => field,
    }
}

// ---------------------------------------------------------------------------
// Numeric fields
// ---------------------------------------------------------------------------

/// Parse a decimal field. Empty → `Some(0.0)`, garbage or non-finite → `None`.
pub fn parse_f64(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return Some(0.0);
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an unsigned integer field. Empty → `Some(0)`.
pub fn parse_u32(field: &str) -> Option<u32> {
    let field = field.trim();
    if field.is_empty() {
        return Some(0);
    }
    field.parse().ok()
}

/// Parse a small unsigned integer field (fix quality). Empty → `Some(0)`.
pub fn parse_u8(field: &str) -> Option<u8> {
    let field = field.trim();
    if field.is_empty() {
        return Some(0);
    }
    field.parse().ok()
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Convert an NMEA `(d)ddmm.mmmm` angle plus hemisphere into signed degrees.
///
/// The layout is chosen from the length of the integer part alone: up to
/// 4 characters means `ddmm` (latitude), anything longer means `dddmm`
/// (longitude). `S` and `W` negate the result. Empty or malformed input
/// yields `0.0`.
pub fn parse_coord(value: &str, hemisphere: &str) -> f64 {
    try_parse_coord(value, hemisphere).unwrap_or(0.0)
}

fn try_parse_coord(value: &str, hemisphere: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }

    let integer_part = value.split('.').next().unwrap_or("");
    let degree_digits = if integer_part.len() <= 4 { 2 } else { 3 };

    let degrees: f64 = value.get(..degree_digits)?.parse().ok()?;
    let minutes: f64 = value.get(degree_digits..)?.parse().ok()?;

    let decimal = degrees + minutes / 60.0;
    if !decimal.is_finite() {
        return None;
    }

    Some(if matches!(hemisphere, "S" | "W") {
        -decimal
    } else {
        decimal
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
