/// Format a whole number of seconds as `"1h 1m 1s"`.
///
/// The hours segment is dropped when zero; the minutes segment only when hours and
/// minutes are both zero, so `format_time(3605)` is `"1h 0m 5s"`. The seconds
/// segment is always present, so `format_time(0)` is `"0s"`. Callers floor fractional
/// positions first (see [`floor_secs`]).
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut out = String::with_capacity(12);
    if hours > 0 {
        out.push_str(&format!("{}h ", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m ", minutes));
    }
    out.push_str(&format!("{}s", secs));
    out
}

/// Floor a playback position reported by a backend into whole seconds.
///
/// Negative and non-finite readings collapse to zero.
pub fn floor_secs(position: f64) -> u64 {
    if position.is_finite() && position > 0.0 {
        position.floor() as u64
    } else {
        0
    }
}

/// Shorthand used by the adapters for their diagnostics.
pub(crate) fn display_secs(position: f64) -> String {
    format_time(floor_secs(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_time(0), "0s");
    }

    #[test]
    fn test_format_minutes_and_seconds() {
        assert_eq!(format_time(65), "1m 5s");
        assert_eq!(format_time(59), "59s");
        assert_eq!(format_time(60), "1m 0s");
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_time(3661), "1h 1m 1s");
        // Zero minutes still show once there are hours
        assert_eq!(format_time(3605), "1h 0m 5s");
        assert_eq!(format_time(7200), "2h 0m 0s");
        assert_eq!(format_time(3600), "1h 0m 0s");
    }

    #[test]
    fn test_floor_secs() {
        assert_eq!(floor_secs(12.9), 12);
        assert_eq!(floor_secs(-3.0), 0);
        assert_eq!(floor_secs(f64::NAN), 0);
        assert_eq!(display_secs(65.7), "1m 5s");
    }
}
