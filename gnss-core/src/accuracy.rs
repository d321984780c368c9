//! Horizontal accuracy estimate and status label from fix quality.

/// Value reported when there is no usable fix.
pub const NO_FIX_ACCURACY_M: f64 = 999.0;

/// Estimated horizontal error in meters for a GGA quality code and HDOP.
///
/// Branches are evaluated in a fixed order. Quality 5 (RTK float) matches
/// the `>= 4` branch first, so its own branch is never taken.
pub fn estimate_accuracy(quality: u8, hdop: f64) -> f64 {
    match quality {
        q if q >= 4 => 2.0 + hdop * 0.5,
        5 => 10.0 + hdop * 2.0,
        2 => 50.0 + hdop * 10.0,
        1 => 200.0 + hdop * 50.0,
        _ => NO_FIX_ACCURACY_M,
    }
}

/// Status label for a GGA quality code, as shown on the dashboard.
pub fn rtk_status(quality: u8) -> &'static str {
    match quality {
        0 => "NO_FIX",
        1 => "GPS",
        2 => "DGPS",
        4 => "RTK_FIXED",
        5 => "RTK_FLOAT",
        6 | 7 => "RTK_FIXED",
        _ => "UNKNOWN",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtk_fixed_accuracy() {
        assert_eq!(estimate_accuracy(4, 1.0), 2.5);
    }

    #[test]
    fn test_gps_accuracy() {
        assert_eq!(estimate_accuracy(1, 2.0), 300.0);
    }

    #[test]
    fn test_dgps_accuracy() {
        assert_eq!(estimate_accuracy(2, 1.5), 65.0);
    }

    #[test]
    fn test_no_fix_accuracy() {
        assert_eq!(estimate_accuracy(0, 0.0), 999.0);
        assert_eq!(estimate_accuracy(0, 42.0), 999.0);
        assert_eq!(estimate_accuracy(3, 1.0), 999.0);
    }

    #[test]
    fn test_float_shadowed_by_fixed_branch() {
        assert_eq!(estimate_accuracy(5, 1.0), 2.5);
        assert_eq!(estimate_accuracy(6, 2.0), 3.0);
    }

    #[test]
    fn test_rtk_status() {
        assert_eq!(rtk_status(0), "NO_FIX");
        assert_eq!(rtk_status(1), "GPS");
        assert_eq!(rtk_status(2), "DGPS");
        assert_eq!(rtk_status(3), "UNKNOWN");
        assert_eq!(rtk_status(4), "RTK_FIXED");
        assert_eq!(rtk_status(5), "RTK_FLOAT");
        assert_eq!(rtk_status(6), "RTK_FIXED");
        assert_eq!(rtk_status(7), "RTK_FIXED");
        assert_eq!(rtk_status(8), "UNKNOWN");
    }
}
