//! Time parsing and formatting utilities

/// Format seconds for an engine argument: point decimal, three fractional digits
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// Parse an `HH:MM:SS.xx` timestamp as printed in the engine's status line
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let value = value.trim();
    let (negative, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;
    let total = hours * 3600.0 + minutes * 60.0 + seconds;

    if !total.is_finite() {
        return None;
    }
    // Early status lines can report a small negative time; treat as zero.
    Some(if negative { 0.0 } else { total })
}

/// Elapsed output time from a status line such as
/// `frame=  150 fps= 30 q=28.0 size=    1024kB time=00:00:05.00 bitrate= 200.0kbits/s`
pub fn extract_progress_time(line: &str) -> Option<f64> {
    let marker = "time=";
    let start = line.find(marker)? + marker.len();
    let value = line[start..].split_whitespace().next()?;
    parse_timestamp(value)
}

/// Format a wall-clock duration for log summaries
pub fn format_elapsed(duration: std::time::Duration) -> String {
    let total = duration.as_secs();
    let millis = duration.subsec_millis();
    if total >= 60 {
        format!("{}m{:02}.{:03}s", total / 60, total % 60, millis)
    } else {
        format!("{}.{:03}s", total, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0.000");
        assert_eq!(format_seconds(12.3456), "12.346");
        assert_eq!(format_seconds(0.08), "0.080");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:05.00"), Some(5.0));
        assert_eq!(parse_timestamp("01:02:03.50"), Some(3723.5));
        assert_eq!(parse_timestamp("-00:00:00.04"), Some(0.0));
        assert_eq!(parse_timestamp("N/A"), None);
        assert_eq!(parse_timestamp("12.5"), None);
    }

    #[test]
    fn test_extract_progress_time() {
        let line = "frame=  150 fps= 30 q=28.0 size=    1024kB time=00:00:05.00 bitrate= 200.0kbits/s speed=1.50x";
        assert_eq!(extract_progress_time(line), Some(5.0));
        assert_eq!(extract_progress_time("Input #0, mov,mp4,m4a,3gp"), None);
        assert_eq!(extract_progress_time("size=N/A time=N/A bitrate=N/A"), None);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.500s");
        assert_eq!(format_elapsed(Duration::from_millis(61_250)), "1m01.250s");
    }
}
