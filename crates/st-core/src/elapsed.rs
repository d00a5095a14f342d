//! Wall-clock duration formatting for run reports.

use std::time::Duration;

/// Format a duration as `HH:MM:SS`, truncating sub-second precision.
///
/// Hours are not wrapped at 24, so a 30 hour run prints as `30:00:00`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let (minutes, s) = (seconds / 60, seconds % 60);
    let (h, m) = (minutes / 60, minutes % 60);
    format!("{:02}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_zero() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00");
    }

    #[test]
    fn test_format_elapsed_truncates_fraction() {
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "00:00:59");
    }

    #[test]
    fn test_format_elapsed_hours() {
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "01:02:05");
        assert_eq!(format_elapsed(Duration::from_secs(30 * 3600)), "30:00:00");
    }
}
